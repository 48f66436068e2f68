//! Quiz session state machine.
//!
//! A session walks a [`Deck`] one turn at a time. Each accepted answer
//! updates the counters immediately and parks the session in
//! [`SessionStatus::Pending`]; the caller applies the parked transition with
//! [`Session::advance`] once its feedback pause is over. Every transition
//! here is synchronous.
//!
//! ```text
//! Loading --load(non-empty deck)--> InProgress --submit_answer--> Pending
//!                                        ^                          |
//!                                        +--------advance-----------+--advance--> Finished
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::deck::{Deck, DeckEntry};
use crate::error::{QuizError, Result};
use crate::summary::Summary;

/// Strikes that end a student-mode session.
pub const MAX_STRIKES: u32 = 3;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// Mode
// ============================================================================

/// Session-wide policy selector, fixed when the session starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Strikes end the session early and the summary grades pass/fail.
    #[default]
    Student,
    /// Practice mode: only deck exhaustion ends the session, no grading.
    Teacher,
}

impl Mode {
    /// Normalizes a launch parameter.
    ///
    /// Only the exact value `"teacher"` selects teacher mode; anything else,
    /// including no value, selects student mode.
    ///
    /// # Examples
    ///
    /// ```
    /// use quizdeck_session::Mode;
    ///
    /// assert_eq!(Mode::from_param(Some("teacher")), Mode::Teacher);
    /// assert_eq!(Mode::from_param(Some("Teacher")), Mode::Student);
    /// assert_eq!(Mode::from_param(None), Mode::Student);
    /// ```
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("teacher") => Self::Teacher,
            Some("student") | None => Self::Student,
            Some(other) => {
                debug!(mode = %other, "Unrecognized mode, using student");
                Self::Student
            }
        }
    }

    /// Returns `true` if reaching [`MAX_STRIKES`] ends the session.
    #[must_use]
    pub const fn ends_on_strikes(self) -> bool {
        matches!(self, Self::Student)
    }

    /// Label shown during play.
    #[must_use]
    pub const fn play_label(self) -> &'static str {
        match self {
            Self::Student => "Student Mode",
            Self::Teacher => "Teacher Mode",
        }
    }

    /// Label shown on the summary.
    #[must_use]
    pub const fn summary_label(self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::Teacher => "Teacher (practice mode)",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Student => write!(f, "student"),
            Self::Teacher => write!(f, "teacher"),
        }
    }
}

// ============================================================================
// SessionStatus
// ============================================================================

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No deck yet; the game is not ready.
    #[default]
    Loading,
    /// Waiting for an answer to the current turn.
    InProgress,
    /// An answer was accepted; its transition has not been applied yet.
    Pending,
    /// Terminal. No further submissions are accepted.
    Finished,
}

impl SessionStatus {
    /// Returns `true` for [`SessionStatus::Finished`].
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Returns `true` while an answer's feedback pause is outstanding.
    #[must_use]
    pub const fn is_waiting(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns `true` if `submit_answer` would be accepted.
    #[must_use]
    pub const fn accepts_answers(&self) -> bool {
        matches!(self, Self::InProgress)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Loading => "loading",
            Self::InProgress => "in_progress",
            Self::Pending => "pending",
            Self::Finished => "finished",
        };
        write!(f, "{s}")
    }
}

// ============================================================================
// Turn results
// ============================================================================

/// Feedback category for an answered turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    /// The judgement matched the card's ground truth.
    Correct,
    /// The judgement did not match.
    Incorrect,
}

impl From<bool> for Feedback {
    fn from(correct: bool) -> Self {
        if correct {
            Self::Correct
        } else {
            Self::Incorrect
        }
    }
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Correct => write!(f, "correct"),
            Self::Incorrect => write!(f, "incorrect"),
        }
    }
}

/// Outcome of an accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResult {
    /// Whether the answer was correct.
    pub correct: bool,
    /// Feedback to display during the pause.
    pub feedback: Feedback,
    /// Whether the pending transition ends the session.
    pub finished: bool,
    /// Score after this answer.
    pub score: u32,
    /// Strikes after this answer.
    pub strikes: u32,
}

/// Record of one accepted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    /// Deck position of the answered turn (0-based).
    pub position: usize,
    /// Scenario of the answered turn.
    pub scenario_id: String,
    /// Slot of the answered turn.
    pub slot_id: String,
    /// Card of the answered turn.
    pub card_id: String,
    /// The player's judgement ("yes, this card is correct").
    pub answered_yes: bool,
    /// Whether the judgement matched the ground truth.
    pub correct: bool,
    /// When the answer was accepted.
    pub answered_at: DateTime<Utc>,
}

/// Snapshot of the session counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Current deck position.
    pub deck_position: usize,
    /// Correct answers so far.
    pub score: u32,
    /// Incorrect answers so far.
    pub strike_count: u32,
    /// Session mode.
    pub mode: Mode,
    /// Whether the session has finished.
    pub terminated: bool,
}

/// Position of the current turn for progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Current question number (1-based).
    pub question: usize,
    /// Total number of questions.
    pub total: usize,
    /// Share of questions already answered, rounded, 0-100.
    pub percent: u32,
    /// Current scenario number (1-based).
    pub scenario: usize,
    /// Total number of scenarios.
    pub scenario_total: usize,
}

#[derive(Debug, Clone, Copy)]
struct PendingTransition {
    finishes: bool,
    feedback: Feedback,
}

/// Decides whether an answer ends the session.
///
/// `next_position` is the position the session would move to.
#[must_use]
pub const fn should_finish(mode: Mode, strikes: u32, next_position: usize, deck_len: usize) -> bool {
    let exhausted = next_position >= deck_len;
    if mode.ends_on_strikes() {
        strikes >= MAX_STRIKES || exhausted
    } else {
        exhausted
    }
}

// ============================================================================
// Session
// ============================================================================

/// One play-through of a deck.
#[derive(Debug, Clone)]
pub struct Session {
    id: u64,
    mode: Mode,
    status: SessionStatus,
    deck: Deck,
    position: usize,
    score: u32,
    strikes: u32,
    pending: Option<PendingTransition>,
    history: Vec<AnswerRecord>,
    started_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session in [`SessionStatus::Loading`].
    #[must_use]
    pub fn new(mode: Mode) -> Self {
        let now = Utc::now();
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            mode,
            status: SessionStatus::Loading,
            deck: Deck::default(),
            position: 0,
            score: 0,
            strikes: 0,
            pending: None,
            history: Vec::new(),
            started_at: now,
            updated_at: now,
        }
    }

    /// Creates a session and loads `deck` into it.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyDeck` when the deck has no turns.
    pub fn start(deck: Deck, mode: Mode) -> Result<Self> {
        let mut session = Self::new(mode);
        session.load(deck)?;
        Ok(session)
    }

    /// Moves from `Loading` to `InProgress` with a non-empty deck.
    ///
    /// On an empty deck the session stays in `Loading`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyDeck` for an empty deck and
    /// `QuizError::InvalidStateTransition` if the session already has a deck.
    pub fn load(&mut self, deck: Deck) -> Result<()> {
        if self.status != SessionStatus::Loading {
            return Err(QuizError::invalid_transition(
                self.status,
                SessionStatus::InProgress,
            ));
        }
        if deck.is_empty() {
            warn!(session_id = self.id, "No scenarios found, session not ready");
            return Err(QuizError::EmptyDeck);
        }

        info!(
            session_id = self.id,
            mode = %self.mode,
            questions = deck.len(),
            "Session started"
        );
        self.deck = deck;
        self.position = 0;
        self.score = 0;
        self.strikes = 0;
        self.pending = None;
        self.history.clear();
        self.status = SessionStatus::InProgress;
        self.started_at = Utc::now();
        self.touch();
        Ok(())
    }

    /// Judges the current card.
    ///
    /// Returns `None` without touching any state when the session is not
    /// waiting for an answer (still loading, inside a feedback pause, or
    /// finished).
    pub fn submit_answer(&mut self, answer_is_yes: bool) -> Option<TurnResult> {
        if !self.status.accepts_answers() {
            debug!(
                session_id = self.id,
                status = %self.status,
                "Ignoring stale submission"
            );
            return None;
        }
        let entry = self.deck.get(self.position)?;

        let correct = answer_is_yes == entry.is_correct;
        if correct {
            self.score += 1;
        } else {
            self.strikes += 1;
        }

        let finishes = should_finish(self.mode, self.strikes, self.position + 1, self.deck.len());
        let feedback = Feedback::from(correct);

        self.history.push(AnswerRecord {
            position: self.position,
            scenario_id: entry.scenario_id.clone(),
            slot_id: entry.slot_id.clone(),
            card_id: entry.card_id.clone(),
            answered_yes: answer_is_yes,
            correct,
            answered_at: Utc::now(),
        });
        self.pending = Some(PendingTransition { finishes, feedback });
        self.status = SessionStatus::Pending;
        self.touch();

        debug!(
            session_id = self.id,
            position = self.position,
            %feedback,
            score = self.score,
            strikes = self.strikes,
            finishes,
            "Answer accepted"
        );

        Some(TurnResult {
            correct,
            feedback,
            finished: finishes,
            score: self.score,
            strikes: self.strikes,
        })
    }

    /// Applies the transition parked by the last accepted answer.
    ///
    /// Moves to the next turn, or finishes the session. Feedback is cleared.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidStateTransition` if no answer is pending.
    pub fn advance(&mut self) -> Result<SessionStatus> {
        let Some(pending) = self.pending.take() else {
            return Err(QuizError::invalid_transition(self.status, "next turn"));
        };

        if pending.finishes {
            self.status = SessionStatus::Finished;
            info!(
                session_id = self.id,
                mode = %self.mode,
                score = self.score,
                strikes = self.strikes,
                answered = self.history.len(),
                "Session finished"
            );
        } else {
            self.position += 1;
            self.status = SessionStatus::InProgress;
        }
        self.touch();
        Ok(self.status)
    }

    /// Process-unique session identifier.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Session mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Current lifecycle status.
    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    /// The deck being played.
    #[must_use]
    pub const fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Current deck position.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Correct answers so far.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Incorrect answers so far.
    #[must_use]
    pub const fn strikes(&self) -> u32 {
        self.strikes
    }

    /// Strike counter as displayed during play, e.g. `"Strikes: 1 / 3"`.
    #[must_use]
    pub fn strikes_label(&self) -> String {
        format!("Strikes: {} / {MAX_STRIKES}", self.strikes)
    }

    /// Returns `true` once the session has finished.
    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        self.status.is_terminal()
    }

    /// The turn being shown, while the session is in play.
    #[must_use]
    pub fn current_entry(&self) -> Option<&DeckEntry> {
        match self.status {
            SessionStatus::InProgress | SessionStatus::Pending => self.deck.get(self.position),
            SessionStatus::Loading | SessionStatus::Finished => None,
        }
    }

    /// Feedback for the answer whose pause is in progress.
    #[must_use]
    pub fn feedback(&self) -> Option<Feedback> {
        self.pending.map(|p| p.feedback)
    }

    /// All accepted answers in order.
    #[must_use]
    pub fn history(&self) -> &[AnswerRecord] {
        &self.history
    }

    /// When the deck was loaded (or the session created, while loading).
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the session last changed.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Progress of the current turn; `None` outside of play.
    #[must_use]
    pub fn progress(&self) -> Option<Progress> {
        let entry = self.current_entry()?;
        let total = self.deck.len();
        let percent = (self.position * 200 + total) / (2 * total);
        Some(Progress {
            question: self.position + 1,
            total,
            percent: u32::try_from(percent).unwrap_or(100),
            scenario: entry.scenario_index + 1,
            scenario_total: self.deck.scenario_count(),
        })
    }

    /// Snapshot of the counters.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        SessionState {
            deck_position: self.position,
            score: self.score,
            strike_count: self.strikes,
            mode: self.mode,
            terminated: self.status.is_terminal(),
        }
    }

    /// Computes the end-of-session summary.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::SessionNotFinished` unless the session has finished.
    pub fn summary(&self) -> Result<Summary> {
        if !self.is_terminated() {
            return Err(QuizError::not_finished(self.status));
        }
        Ok(Summary::compute(&self.state(), self.deck.len()))
    }

    /// Time between deck load and the last change.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.updated_at - self.started_at
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// ============================================================================
// Tests
// ============================================================================
