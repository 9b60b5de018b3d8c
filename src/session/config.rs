//! Timing and threshold configuration for test sessions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{COLLAPSE_HEIGHT, DEFAULT_MONITOR_WINDOW_SECS, DEFAULT_SETTLE_DELAY_SECS};

/// Errors raised while loading or validating a [`SessionConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read session config {path}: {source}")]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// The configuration text was not valid JSON for this schema.
    #[error("failed to parse session config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A field held a value the session cannot run with.
    #[error("invalid session config: {field} = {value}")]
    Invalid {
        /// Offending field name.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
}

/// Durations and thresholds governing one test session.
///
/// Missing JSON fields fall back to the defaults below.
///
/// # Examples
///
/// ```
/// use trestle::session::SessionConfig;
/// let config = SessionConfig::from_json_str(r#"{ "monitor_window_secs": 4.0 }"#)
///     .expect("valid config");
/// assert!((config.monitor_window_secs - 4.0).abs() < f32::EPSILON);
/// assert!((config.settle_delay_secs - 0.3).abs() < f32::EPSILON);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Seconds between replacement and load injection.
    pub settle_delay_secs: f32,
    /// Seconds the loaded structure is monitored before grading.
    pub monitor_window_secs: f32,
    /// Vertical coordinate at or below which a piece has fallen.
    pub collapse_height: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            settle_delay_secs: DEFAULT_SETTLE_DELAY_SECS,
            monitor_window_secs: DEFAULT_MONITOR_WINDOW_SECS,
            collapse_height: COLLAPSE_HEIGHT,
        }
    }
}

impl SessionConfig {
    /// Checks that every field can drive a session.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a negative or non-finite settle
    /// delay, a non-positive or non-finite window, or a non-finite threshold.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if !self.settle_delay_secs.is_finite() || self.settle_delay_secs < 0.0 {
            return Err(ConfigError::Invalid {
                field: "settle_delay_secs",
                value: self.settle_delay_secs,
            });
        }
        if !self.monitor_window_secs.is_finite() || self.monitor_window_secs <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "monitor_window_secs",
                value: self.monitor_window_secs,
            });
        }
        if !self.collapse_height.is_finite() {
            return Err(ConfigError::Invalid {
                field: "collapse_height",
                value: self.collapse_height,
            });
        }
        Ok(self)
    }

    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON or unknown fields and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()
    }

    /// Reads, parses and validates the JSON file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise the
    /// errors of [`SessionConfig::from_json_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_match_reference_timings() {
        let config = SessionConfig::default();
        assert!((config.settle_delay_secs - 0.3).abs() < f32::EPSILON);
        assert!((config.monitor_window_secs - 8.0).abs() < f32::EPSILON);
        assert!((config.collapse_height + 5.0).abs() < f32::EPSILON);
    }

    #[rstest]
    #[case(r#"{ "settle_delay_secs": -1.0 }"#, "settle_delay_secs")]
    #[case(r#"{ "monitor_window_secs": 0.0 }"#, "monitor_window_secs")]
    fn rejects_unusable_values(#[case] text: &str, #[case] expected_field: &str) {
        match SessionConfig::from_json_str(text) {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("expected invalid config, got {other:?}"),
        }
    }

    #[rstest]
    fn rejects_unknown_fields() {
        let err = SessionConfig::from_json_str(r#"{ "gravity": 9.8 }"#)
            .expect_err("unknown field should fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[rstest]
    fn missing_file_reports_path() {
        let path = Path::new("/definitely/not/here/session.json");
        let err = SessionConfig::load(path).expect_err("missing file should fail");
        assert!(err.to_string().contains("session.json"));
    }
}
