use exam_core::model::Question;
use exam_core::{Clock, ExamSession, ExamSettings, ExamSettingsDraft};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use super::driver::ExamDriver;
use crate::error::ExamServiceError;

/// Turns a question list and settings into a ready-to-run exam.
#[derive(Debug, Clone, Default)]
pub struct ExamSetup {
    settings: ExamSettings,
    clock: Clock,
}

impl ExamSetup {
    #[must_use]
    pub fn new(settings: ExamSettings) -> Self {
        Self {
            settings,
            clock: Clock::default_clock(),
        }
    }

    /// # Errors
    ///
    /// Returns `ExamServiceError::Exam` if the draft does not validate.
    pub fn from_draft(draft: ExamSettingsDraft) -> Result<Self, ExamServiceError> {
        Ok(Self::new(draft.validate()?))
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &ExamSettings {
        &self.settings
    }

    /// Builds a session, shuffling the question order once when enabled.
    ///
    /// # Errors
    ///
    /// Returns `ExamServiceError::Exam` for an empty question list.
    pub fn build_session(&self, questions: Vec<Question>) -> Result<ExamSession, ExamServiceError> {
        self.build_session_with_rng(questions, &mut rand::rng())
    }

    /// # Errors
    ///
    /// Returns `ExamServiceError::Exam` for an empty question list.
    pub fn build_session_with_rng<R: Rng + ?Sized>(
        &self,
        mut questions: Vec<Question>,
        rng: &mut R,
    ) -> Result<ExamSession, ExamServiceError> {
        if self.settings.shuffle_questions() {
            questions.shuffle(rng);
            debug!(count = questions.len(), "question order shuffled");
        }
        Ok(ExamSession::from_settings(questions, &self.settings)?)
    }

    /// # Errors
    ///
    /// Returns `ExamServiceError::Exam` for an empty question list.
    pub fn build_driver(&self, questions: Vec<Question>) -> Result<ExamDriver, ExamServiceError> {
        let session = self.build_session(questions)?;
        Ok(ExamDriver::new(session)
            .with_clock(self.clock)
            .with_tick_interval(self.settings.tick_interval()))
    }
}
