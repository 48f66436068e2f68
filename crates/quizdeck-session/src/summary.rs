//! End-of-session summary.
//!
//! Student sessions are graded against a fixed fraction of the deck
//! (39 of 42, rounded up for other deck sizes). Teacher sessions are never
//! graded.

use serde::{Deserialize, Serialize};

use crate::session::{Mode, SessionState};

/// Numerator of the passing fraction.
pub const PASSING_NUMERATOR: u64 = 39;

/// Denominator of the passing fraction; also the deck size the rule was
/// written for.
pub const PASSING_DENOMINATOR: u64 = 42;

/// Minimum score to pass a student session over `deck_len` questions.
///
/// Computes `ceil(39 / 42 * deck_len)` in integer arithmetic.
///
/// # Examples
///
/// ```
/// use quizdeck_session::passing_score;
///
/// assert_eq!(passing_score(42), 39);
/// assert_eq!(passing_score(10), 10);
/// assert_eq!(passing_score(4), 4);
/// ```
#[must_use]
pub fn passing_score(deck_len: usize) -> u32 {
    let n = deck_len as u64;
    let score = (PASSING_NUMERATOR * n + PASSING_DENOMINATOR - 1) / PASSING_DENOMINATOR;
    u32::try_from(score).unwrap_or(u32::MAX)
}

/// How the passing threshold is labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdRule {
    /// The deck has exactly 42 questions.
    Standard,
    /// Any other deck size.
    Scaled,
}

impl ThresholdRule {
    /// Rule for a deck of `deck_len` questions.
    #[must_use]
    pub fn for_deck(deck_len: usize) -> Self {
        if deck_len as u64 == PASSING_DENOMINATOR {
            Self::Standard
        } else {
            Self::Scaled
        }
    }

    /// Parenthesized label for display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Standard => "(39 / 42 rule)",
            Self::Scaled => "(scaled)",
        }
    }
}

/// Pass/fail outcome of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    /// Student mode grading.
    #[serde(rename_all = "camelCase")]
    Graded {
        /// Minimum score to pass.
        passing_score: u32,
        /// Label for the threshold.
        rule: ThresholdRule,
        /// Whether the score met the threshold.
        passed: bool,
    },
    /// Teacher mode: no passing requirement.
    NoRequirement,
}

/// Summary of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Session mode.
    pub mode: Mode,
    /// Deck length.
    pub total_questions: usize,
    /// Correct answers.
    pub score: u32,
    /// Incorrect answers.
    pub strikes: u32,
    /// Pass/fail outcome.
    pub verdict: Verdict,
}

impl Summary {
    /// Computes the summary from final counters.
    #[must_use]
    pub fn compute(state: &SessionState, deck_len: usize) -> Self {
        let verdict = match state.mode {
            Mode::Student => {
                let passing_score = passing_score(deck_len);
                Verdict::Graded {
                    passing_score,
                    rule: ThresholdRule::for_deck(deck_len),
                    passed: state.score >= passing_score,
                }
            }
            Mode::Teacher => Verdict::NoRequirement,
        };

        Self {
            mode: state.mode,
            total_questions: deck_len,
            score: state.score,
            strikes: state.strike_count,
            verdict,
        }
    }

    /// `Some(passed)` for graded sessions, `None` in teacher mode.
    #[must_use]
    pub const fn passed(&self) -> Option<bool> {
        match self.verdict {
            Verdict::Graded { passed, .. } => Some(passed),
            Verdict::NoRequirement => None,
        }
    }

    /// Human-readable result word for graded sessions.
    #[must_use]
    pub const fn result_label(&self) -> Option<&'static str> {
        match self.passed() {
            Some(true) => Some("Pass"),
            Some(false) => Some("Try again"),
            None => None,
        }
    }

    /// Display lines, in order.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Mode: {}", self.mode.summary_label()),
            format!("Total questions: {}", self.total_questions),
            format!("Score: {}", self.score),
            format!("Strikes: {}", self.strikes),
        ];

        match self.verdict {
            Verdict::Graded {
                passing_score,
                rule,
                passed,
            } => {
                lines.push(format!(
                    "Passing threshold: {passing_score} correct {}",
                    rule.label()
                ));
                lines.push(format!(
                    "Result: {}",
                    if passed { "Pass" } else { "Try again" }
                ));
            }
            Verdict::NoRequirement => {
                lines.push("Teacher mode: no passing requirement.".to_string());
                lines.push("Start a new session to practice again.".to_string());
            }
        }

        lines
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.lines().join("\n"))
    }
}
