//! Markdown report generation.
//!
//! The document has a summary table, the verdict lines exactly as the
//! session summary prints them, and one table row per answered turn.

use chrono::{DateTime, Utc};
use std::fmt::Write;

use quizdeck_session::AnswerRecord;

use crate::Report;

/// Generates Markdown reports from finished sessions.
pub struct MarkdownGenerator<'a> {
    report: &'a Report,
}

impl<'a> MarkdownGenerator<'a> {
    /// Creates a new Markdown generator for the given report.
    #[must_use]
    pub const fn new(report: &'a Report) -> Self {
        Self { report }
    }

    /// Generates the complete Markdown report.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();

        Self::write_title(&mut output);
        self.write_summary(&mut output);
        self.write_result(&mut output);
        self.write_answers(&mut output);
        Self::write_footer(&mut output);

        output
    }

    fn write_title(output: &mut String) {
        let _ = writeln!(output, "# Quizdeck Session Report\n");
    }

    /// Writes the summary section with metrics table.
    fn write_summary(&self, output: &mut String) {
        let summary = &self.report.summary;

        let _ = writeln!(output, "## Summary\n");
        let _ = writeln!(output, "| Metric | Value |");
        let _ = writeln!(output, "|--------|-------|");
        let _ = writeln!(output, "| Mode | {} |", summary.mode.summary_label());
        let _ = writeln!(output, "| Questions | {} |", summary.total_questions);
        let _ = writeln!(output, "| Answered | {} |", self.report.answered());
        let _ = writeln!(output, "| Score | {} |", summary.score);
        let _ = writeln!(output, "| Strikes | {} |", summary.strikes);
        let _ = writeln!(
            output,
            "| Started | {} |",
            format_timestamp(&self.report.started_at)
        );
        let _ = writeln!(
            output,
            "| Duration | {} |",
            format_duration(self.report.duration_seconds)
        );
        let _ = writeln!(output);
    }

    /// Writes the verdict, reusing the summary's display lines after the
    /// counters already shown in the table.
    fn write_result(&self, output: &mut String) {
        let _ = writeln!(output, "## Result\n");
        for line in self.report.summary.lines().iter().skip(4) {
            let _ = writeln!(output, "- {line}");
        }
        let _ = writeln!(output);
    }

    fn write_answers(&self, output: &mut String) {
        let _ = writeln!(output, "## Answers\n");

        if self.report.turns.is_empty() {
            let _ = writeln!(output, "*No answers recorded.*\n");
            return;
        }

        let _ = writeln!(output, "| # | Scenario | Slot | Card | Answer | Result |");
        let _ = writeln!(output, "|---|----------|------|------|--------|--------|");
        for turn in &self.report.turns {
            Self::write_answer_row(output, turn);
        }
        let _ = writeln!(output);
    }

    fn write_answer_row(output: &mut String, turn: &AnswerRecord) {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} | {} |",
            turn.position + 1,
            escape_markdown(&turn.scenario_id),
            escape_markdown(&turn.slot_id),
            escape_markdown(&turn.card_id),
            if turn.answered_yes { "Yes" } else { "No" },
            if turn.correct { "Correct" } else { "Incorrect" },
        );
    }

    fn write_footer(output: &mut String) {
        let _ = writeln!(output, "---");
        let timestamp = format_timestamp(&Utc::now());
        let _ = writeln!(output, "*Generated by quizdeck at {timestamp}*");
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Formats a duration in seconds, e.g. 65 -> "1m 5s".
fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{secs}s"));
    }

    parts.join(" ")
}

fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Escapes characters that would break a table cell.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '*' | '_' | '`' | '|' | '\\' | '<' | '>' => {
                result.push('\\');
                result.push(ch);
            }
            '\n' => result.push_str("<br>"),
            _ => result.push(ch),
        }
    }
    result
}
