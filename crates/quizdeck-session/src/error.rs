//! Error types for quizdeck sessions.
//!
//! Covers configuration loading, scenario/card data loading, deck readiness,
//! and state machine misuse. Submissions that arrive at the wrong moment and
//! unknown launch modes are not errors: they are absorbed by the session
//! itself.

use std::path::PathBuf;

/// A specialized `Result` type for quizdeck session operations.
pub type Result<T> = std::result::Result<T, QuizError>;

/// Errors that can occur while loading data or driving a session.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your quizdeck.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Data Loading Errors
    // ========================================================================
    /// A scenario or card data file was not found.
    #[error("Data file not found: '{path}'\n\nSuggestion: Check the 'scenarios' and 'cards' paths in quizdeck.json")]
    DataNotFound {
        /// Path where the data file was expected.
        path: PathBuf,
    },

    /// A scenario or card data file could not be parsed.
    #[error("Invalid data file '{path}': {message}\n\nSuggestion: Make sure the file is a JSON object with a 'scenarios' or 'cards' array")]
    DataParseError {
        /// Path to the malformed data file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// The scenario collection produced no deck entries.
    ///
    /// Informational: the session stays in `loading` and shows a "not ready"
    /// state instead of a zero-question game.
    #[error("No scenarios found: the deck is empty\n\nSuggestion: Add at least one scenario with a slot to the scenarios file")]
    EmptyDeck,

    /// A summary was requested before the session finished.
    #[error("Session is not finished (current status: {status})")]
    SessionNotFinished {
        /// The current session status.
        status: String,
    },

    /// Invalid state transition attempted.
    #[error("Invalid state transition: cannot go from {from} to {to}")]
    InvalidStateTransition {
        /// The current state.
        from: String,
        /// The attempted target state.
        to: String,
    },
}

impl QuizError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `DataNotFound` error.
    #[must_use]
    pub fn data_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DataNotFound { path: path.into() }
    }

    /// Creates a new `DataParseError`.
    #[must_use]
    pub fn data_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::DataParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `SessionNotFinished` error.
    #[must_use]
    pub fn not_finished(status: impl std::fmt::Display) -> Self {
        Self::SessionNotFinished {
            status: status.to_string(),
        }
    }

    /// Creates a new `InvalidStateTransition` error.
    #[must_use]
    pub fn invalid_transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        Self::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Returns `true` if this error should stop the program.
    ///
    /// An empty deck is not fatal; the session waits in `loading`.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigParseError { .. }
                | Self::ConfigValidationError { .. }
                | Self::DataNotFound { .. }
                | Self::DataParseError { .. }
        )
    }
}
