//! Configuration for quizdeck.
//!
//! Data file locations, the post-answer feedback delay, and the report
//! output directory. The session mode is not configured here; it is a launch
//! parameter, read once when a session starts.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{QuizError, Result};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "quizdeck.json";

/// Upper bound for `feedbackDelayMs`.
pub const MAX_FEEDBACK_DELAY_MS: u64 = 10_000;

fn default_scenarios() -> String {
    "data/scenarios.json".to_string()
}

fn default_cards() -> String {
    "data/cards.json".to_string()
}

/// Pause between an accepted answer and the next turn.
const fn default_feedback_delay_ms() -> u64 {
    700
}

fn default_output_dir() -> String {
    ".".to_string()
}

/// Main configuration for quizdeck.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Path to the scenarios JSON file.
    #[serde(default = "default_scenarios")]
    pub scenarios: String,

    /// Path to the cards JSON file.
    #[serde(default = "default_cards")]
    pub cards: String,

    /// Milliseconds to hold answer feedback before advancing.
    #[serde(default = "default_feedback_delay_ms")]
    pub feedback_delay_ms: u64,

    /// Output directory for generated reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scenarios: default_scenarios(),
            cards: default_cards(),
            feedback_delay_ms: default_feedback_delay_ms(),
            output_dir: default_output_dir(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `quizdeck.json`; falls back to defaults when it is absent.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            QuizError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `quizdeck.json` inside `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::ConfigParseError` for unreadable files or invalid
    /// JSON, and `QuizError::ConfigValidationError` for invalid values.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(QuizError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| QuizError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// - `scenarios`, `cards` and `outputDir` must not be empty
    /// - `feedbackDelayMs` must not exceed [`MAX_FEEDBACK_DELAY_MS`]
    pub fn validate(&self) -> Result<()> {
        if self.scenarios.trim().is_empty() {
            return Err(QuizError::config_validation(
                "scenarios path must not be empty",
                "Provide a valid scenarios file path in your quizdeck.json",
            ));
        }

        if self.cards.trim().is_empty() {
            return Err(QuizError::config_validation(
                "cards path must not be empty",
                "Provide a valid cards file path in your quizdeck.json",
            ));
        }

        if self.feedback_delay_ms > MAX_FEEDBACK_DELAY_MS {
            return Err(QuizError::config_validation(
                format!("feedbackDelayMs must not exceed {MAX_FEEDBACK_DELAY_MS}"),
                "Set feedbackDelayMs to a value between 0 and 10000 in your quizdeck.json",
            ));
        }

        if self.output_dir.trim().is_empty() {
            return Err(QuizError::config_validation(
                "outputDir must not be empty",
                "Provide a valid output directory path in your quizdeck.json (use '.' for current directory)",
            ));
        }

        Ok(())
    }

    /// The feedback delay as a [`Duration`].
    #[must_use]
    pub const fn feedback_delay(&self) -> Duration {
        Duration::from_millis(self.feedback_delay_ms)
    }
}
