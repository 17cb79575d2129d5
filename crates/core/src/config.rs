use std::time::Duration as StdDuration;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_DURATION_SECS: u32 = 3600;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Validated knobs for one exam attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ExamSettingsDraft", into = "ExamSettingsDraft")]
pub struct ExamSettings {
    duration_secs: u32,
    tick_interval_ms: u64,
    shuffle_questions: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamSettingsDraft {
    pub duration_secs: Option<u32>,
    pub tick_interval_ms: Option<u64>,
    pub shuffle_questions: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamSettingsError {
    #[error("exam duration must be at least one second")]
    ZeroDuration,
    #[error("tick interval must be at least one millisecond")]
    ZeroTickInterval,
}

impl ExamSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill defaults and validate.
    ///
    /// # Errors
    ///
    /// Returns `ExamSettingsError` if the duration or tick interval is zero.
    pub fn validate(self) -> Result<ExamSettings, ExamSettingsError> {
        let duration_secs = self.duration_secs.unwrap_or(DEFAULT_DURATION_SECS);
        let tick_interval_ms = self.tick_interval_ms.unwrap_or(DEFAULT_TICK_INTERVAL_MS);

        if duration_secs == 0 {
            return Err(ExamSettingsError::ZeroDuration);
        }
        if tick_interval_ms == 0 {
            return Err(ExamSettingsError::ZeroTickInterval);
        }

        Ok(ExamSettings {
            duration_secs,
            tick_interval_ms,
            shuffle_questions: self.shuffle_questions,
        })
    }
}

impl ExamSettings {
    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    /// Countdown length as a `chrono::Duration`.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::seconds(i64::from(self.duration_secs))
    }

    /// Real-time spacing between ticks. Each tick still removes one second.
    #[must_use]
    pub fn tick_interval(&self) -> StdDuration {
        StdDuration::from_millis(self.tick_interval_ms)
    }

    #[must_use]
    pub fn shuffle_questions(&self) -> bool {
        self.shuffle_questions
    }
}

impl Default for ExamSettings {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_DURATION_SECS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            shuffle_questions: false,
        }
    }
}

impl TryFrom<ExamSettingsDraft> for ExamSettings {
    type Error = ExamSettingsError;

    fn try_from(draft: ExamSettingsDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl From<ExamSettings> for ExamSettingsDraft {
    fn from(settings: ExamSettings) -> Self {
        Self {
            duration_secs: Some(settings.duration_secs),
            tick_interval_ms: Some(settings.tick_interval_ms),
            shuffle_questions: settings.shuffle_questions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_draft_uses_defaults() {
        let settings = ExamSettingsDraft::new().validate().unwrap();
        assert_eq!(settings, ExamSettings::default());
        assert_eq!(settings.duration(), Duration::hours(1));
        assert_eq!(settings.tick_interval(), StdDuration::from_secs(1));
        assert!(!settings.shuffle_questions());
    }

    #[test]
    fn zero_duration_is_rejected() {
        let draft = ExamSettingsDraft {
            duration_secs: Some(0),
            ..ExamSettingsDraft::default()
        };
        assert_eq!(draft.validate(), Err(ExamSettingsError::ZeroDuration));
    }

    #[test]
    fn zero_tick_interval_is_rejected() {
        let draft = ExamSettingsDraft {
            tick_interval_ms: Some(0),
            ..ExamSettingsDraft::default()
        };
        assert_eq!(draft.validate(), Err(ExamSettingsError::ZeroTickInterval));
    }

    #[test]
    fn deserializes_partial_json_through_validation() {
        let settings: ExamSettings =
            serde_json::from_str(r#"{"duration_secs": 90, "shuffle_questions": true}"#).unwrap();
        assert_eq!(settings.duration_secs(), 90);
        assert!(settings.shuffle_questions());

        let err = serde_json::from_str::<ExamSettings>(r#"{"duration_secs": 0}"#);
        assert!(err.is_err());
    }
}
