use thiserror::Error;

use crate::config::ExamSettingsError;

/// Errors raised while setting up an exam session.
///
/// Running sessions never error: out-of-range actions are ignored.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamError {
    #[error("an exam needs at least one question")]
    NoQuestions,
    #[error("exam duration cannot be negative ({seconds}s)")]
    InvalidDuration { seconds: i64 },
    #[error(transparent)]
    Settings(#[from] ExamSettingsError),
}
