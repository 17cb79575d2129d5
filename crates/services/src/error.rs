//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::{ExamError, ExamSettingsError};

/// Errors emitted by `ExamSetup` and `ExamDriver`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExamServiceError {
    #[error("the exam countdown needs a running tokio runtime")]
    NoRuntime,
    #[error(transparent)]
    Exam(#[from] ExamError),
}

impl From<ExamSettingsError> for ExamServiceError {
    fn from(err: ExamSettingsError) -> Self {
        Self::Exam(ExamError::Settings(err))
    }
}
