use std::fmt;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::config::ExamSettings;
use crate::error::ExamError;
use crate::model::{Question, QuestionStatus};
use crate::progress::{
    ExamReport, ExamSnapshot, PaletteEntry, QuestionOutcome, StatusCounts, SubmitReason,
};
use crate::timer::{CountdownTimer, TimerEvent};

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One exam attempt: a fixed, ordered question set, a cursor and a countdown.
///
/// Out-of-range actions and any mutation after submission are ignored; the
/// mutators return `false` in that case instead of erroring. The session owns
/// its timer and submits itself when the timer reports expiry.
#[derive(Clone)]
pub struct ExamSession {
    questions: Vec<Question>,
    current: usize,
    submitted: Option<SubmitReason>,
    timer: CountdownTimer,
}

impl ExamSession {
    /// # Errors
    ///
    /// Returns `ExamError::NoQuestions` for an empty question set and
    /// `ExamError::InvalidDuration` for a negative duration.
    pub fn new(questions: Vec<Question>, duration: Duration) -> Result<Self, ExamError> {
        if questions.is_empty() {
            return Err(ExamError::NoQuestions);
        }
        if duration < Duration::zero() {
            return Err(ExamError::InvalidDuration {
                seconds: duration.num_seconds(),
            });
        }

        Ok(Self {
            questions,
            current: 0,
            submitted: None,
            timer: CountdownTimer::new(duration),
        })
    }

    /// # Errors
    ///
    /// Returns `ExamError::NoQuestions` for an empty question set.
    pub fn from_settings(
        questions: Vec<Question>,
        settings: &ExamSettings,
    ) -> Result<Self, ExamError> {
        Self::new(questions, settings.duration())
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.current + 1 == self.questions.len()
    }

    #[must_use]
    pub fn timer(&self) -> &CountdownTimer {
        &self.timer
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.submitted.is_some()
    }

    #[must_use]
    pub fn submit_reason(&self) -> Option<SubmitReason> {
        self.submitted
    }

    //
    // ─── ANSWERING / NAVIGATION ────────────────────────────────────────────────
    //

    /// Selects option `index` on the current question.
    ///
    /// Promotes the question to `Attempted` unless it is marked for review.
    pub fn select_option(&mut self, index: usize) -> bool {
        if self.ignore_if_submitted("select_option") {
            return false;
        }
        let current = self.current;
        let applied = self.questions[current].select(index);
        if !applied {
            debug!(
                question = current,
                option = index,
                "ignoring out-of-range option selection"
            );
        }
        applied
    }

    /// Flags the current question for review, whatever its state.
    pub fn mark_for_review(&mut self) -> bool {
        if self.ignore_if_submitted("mark_for_review") {
            return false;
        }
        self.questions[self.current].mark_for_review();
        true
    }

    /// Moves to the next question. No-op on the last one.
    pub fn next_question(&mut self) -> bool {
        if self.ignore_if_submitted("next_question") || self.is_last_question() {
            return false;
        }
        self.current += 1;
        true
    }

    /// Jumps to `index`. Indices outside the question set are ignored.
    pub fn go_to_question(&mut self, index: usize) -> bool {
        if self.ignore_if_submitted("go_to_question") {
            return false;
        }
        if index >= self.questions.len() {
            debug!(
                index,
                total = self.questions.len(),
                "ignoring out-of-range navigation"
            );
            return false;
        }
        self.current = index;
        true
    }

    /// Ends the exam and stops the countdown. Idempotent.
    pub fn submit_exam(&mut self) -> bool {
        self.submit(SubmitReason::Manual)
    }

    fn submit(&mut self, reason: SubmitReason) -> bool {
        if self.submitted.is_some() {
            return false;
        }
        self.timer.stop();
        self.submitted = Some(reason);
        let counts = self.status_counts();
        info!(
            ?reason,
            attempted = counts.attempted,
            marked_for_review = counts.marked_for_review,
            unseen = counts.unseen,
            "exam submitted"
        );
        true
    }

    fn ignore_if_submitted(&self, action: &'static str) -> bool {
        if self.submitted.is_some() {
            debug!(action, "ignoring action on submitted exam");
            return true;
        }
        false
    }

    //
    // ─── TIMER ─────────────────────────────────────────────────────────────────
    //

    /// Starts the countdown, typically when the exam screen appears.
    pub fn start_timer(&mut self) -> bool {
        !self.is_submitted() && self.timer.start()
    }

    pub fn pause_timer(&mut self) -> bool {
        self.timer.pause()
    }

    /// Advances the countdown by one tick and submits on expiry.
    pub fn tick(&mut self) -> TimerEvent {
        let event = self.timer.tick();
        self.apply_timer_event(event)
    }

    pub fn on_suspend(&mut self, now: DateTime<Utc>) {
        self.timer.on_suspend(now);
    }

    /// Catches up on time spent suspended and submits on expiry.
    pub fn on_resume(&mut self, now: DateTime<Utc>) -> TimerEvent {
        let event = self.timer.on_resume(now);
        self.apply_timer_event(event)
    }

    fn apply_timer_event(&mut self, event: TimerEvent) -> TimerEvent {
        if event == TimerEvent::Expired {
            self.submit(SubmitReason::TimeExpired);
        }
        event
    }

    //
    // ─── READ MODELS ───────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn attempted_count(&self) -> usize {
        self.count_status(QuestionStatus::Attempted)
    }

    #[must_use]
    pub fn marked_for_review_count(&self) -> usize {
        self.count_status(QuestionStatus::MarkedForReview)
    }

    #[must_use]
    pub fn unseen_count(&self) -> usize {
        self.count_status(QuestionStatus::Unseen)
    }

    fn count_status(&self, status: QuestionStatus) -> usize {
        self.questions.iter().filter(|q| q.status() == status).count()
    }

    #[must_use]
    pub fn status_counts(&self) -> StatusCounts {
        StatusCounts::tally(self.questions.iter().map(Question::status))
    }

    #[must_use]
    pub fn palette(&self) -> Vec<PaletteEntry> {
        self.questions
            .iter()
            .enumerate()
            .map(|(index, q)| PaletteEntry {
                index,
                status: q.status(),
                is_current: index == self.current,
                has_selection: q.selected().is_some(),
            })
            .collect()
    }

    #[must_use]
    pub fn snapshot(&self) -> ExamSnapshot {
        ExamSnapshot {
            current_index: self.current,
            total_questions: self.questions.len(),
            counts: self.status_counts(),
            submitted: self.submitted,
            remaining_secs: self.timer.remaining_secs(),
            time_string: self.timer.time_string(),
            urgency: self.timer.urgency(),
            timer_phase: self.timer.phase(),
        }
    }

    /// Summary for the report screen. `None` until the exam is submitted.
    #[must_use]
    pub fn report(&self) -> Option<ExamReport> {
        let reason = self.submitted?;
        let questions = self
            .questions
            .iter()
            .enumerate()
            .map(|(index, q)| QuestionOutcome {
                number: index + 1,
                id: q.id(),
                status: q.status(),
                selected: q.selected(),
            })
            .collect();

        Some(ExamReport {
            reason,
            counts: self.status_counts(),
            time_used_secs: u64::try_from(self.timer.elapsed().num_seconds()).unwrap_or(0),
            questions,
        })
    }
}

impl fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSession")
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("submitted", &self.submitted)
            .field("timer", &self.timer)
            .finish()
    }
}
