//! Quizdeck Report Generation
//!
//! Turns a finished session into a report that can be serialized to JSON or
//! rendered to Markdown.
//!
//! # Generators
//!
//! - [`json::JsonGenerator`] - Compact or pretty JSON
//! - [`MarkdownGenerator`] - Human-readable Markdown
//!
//! # Example
//!
//! ```rust
//! use quizdeck_report::{json::JsonGenerator, MarkdownGenerator, Report};
//! use quizdeck_session::{build_deck, Mode, Scenario, Session, Slot};
//!
//! let scenarios = vec![Scenario {
//!     id: "s1".to_string(),
//!     description: "A ball is thrown upward".to_string(),
//!     slots: vec![Slot {
//!         slot_id: "a".to_string(),
//!         category: "graph".to_string(),
//!         card_id: "c1".to_string(),
//!         is_correct: true,
//!     }],
//! }];
//!
//! let mut session = Session::start(build_deck(&scenarios), Mode::Student).unwrap();
//! session.submit_answer(true).unwrap();
//! session.advance().unwrap();
//!
//! let report = Report::from_session(&session).unwrap();
//! let json = JsonGenerator::new(&report).generate_pretty().unwrap();
//! assert!(json.contains("\"score\": 1"));
//!
//! let markdown = MarkdownGenerator::new(&report).generate();
//! assert!(markdown.contains("Result: Pass"));
//! ```

pub mod json;
mod markdown;

pub use markdown::MarkdownGenerator;

use chrono::{DateTime, Utc};
use quizdeck_session::{AnswerRecord, Mode, Session, Summary};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name of the Markdown report.
pub const MARKDOWN_REPORT_FILE: &str = "quizdeck-report.md";

/// File name of the JSON report.
pub const JSON_REPORT_FILE: &str = "quizdeck-report.json";

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to serialize the report to JSON.
    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to write report files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The session cannot be reported on yet.
    #[error("cannot build report: {0}")]
    SessionNotFinished(String),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

// ============================================================================
// Report
// ============================================================================

/// Report of one finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Session the report was built from.
    pub session_id: u64,
    /// End-of-session summary.
    pub summary: Summary,
    /// When the deck was loaded.
    pub started_at: DateTime<Utc>,
    /// When the last answer was applied.
    pub ended_at: DateTime<Utc>,
    /// Whole seconds between start and end.
    pub duration_seconds: u64,
    /// Accepted answers in order.
    pub turns: Vec<AnswerRecord>,
}

impl Report {
    /// Builds a report from a finished session.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::SessionNotFinished`] if the session is still
    /// loading or in play.
    pub fn from_session(session: &Session) -> Result<Self> {
        let summary = session
            .summary()
            .map_err(|e| ReportError::SessionNotFinished(e.to_string()))?;

        Ok(Self {
            session_id: session.id(),
            summary,
            started_at: session.started_at(),
            ended_at: session.updated_at(),
            duration_seconds: u64::try_from(session.duration().num_seconds()).unwrap_or(0),
            turns: session.history().to_vec(),
        })
    }

    /// Serializes the report to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(ReportError::from)
    }

    /// Session mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.summary.mode
    }

    /// Number of answers given; less than the deck length when strikes
    /// ended the session early.
    #[must_use]
    pub fn answered(&self) -> usize {
        self.turns.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
