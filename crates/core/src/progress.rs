use serde::{Deserialize, Serialize};

use crate::model::{QuestionId, QuestionStatus};
use crate::timer::{TimerPhase, Urgency};

/// Why an exam ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitReason {
    /// The candidate pressed submit.
    Manual,
    /// The countdown reached zero.
    TimeExpired,
}

/// Per-status question counts. Always sums to the question total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub attempted: usize,
    pub marked_for_review: usize,
    pub unseen: usize,
}

impl StatusCounts {
    pub fn tally<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = QuestionStatus>,
    {
        statuses
            .into_iter()
            .fold(Self::default(), |mut counts, status| {
                match status {
                    QuestionStatus::Attempted => counts.attempted += 1,
                    QuestionStatus::MarkedForReview => counts.marked_for_review += 1,
                    QuestionStatus::Unseen => counts.unseen += 1,
                }
                counts
            })
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.attempted + self.marked_for_review + self.unseen
    }
}

/// One cell of the question palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub index: usize,
    pub status: QuestionStatus,
    pub is_current: bool,
    pub has_selection: bool,
}

impl PaletteEntry {
    /// 1-based question number as shown to candidates.
    #[must_use]
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// Point-in-time view of a session, published after every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamSnapshot {
    pub current_index: usize,
    pub total_questions: usize,
    pub counts: StatusCounts,
    pub submitted: Option<SubmitReason>,
    pub remaining_secs: u64,
    pub time_string: String,
    pub urgency: Urgency,
    pub timer_phase: TimerPhase,
}

impl ExamSnapshot {
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.submitted.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub number: usize,
    pub id: QuestionId,
    pub status: QuestionStatus,
    pub selected: Option<usize>,
}

/// Post-exam summary. Status counts only; answers are not graded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamReport {
    pub reason: SubmitReason,
    pub counts: StatusCounts,
    pub time_used_secs: u64,
    pub questions: Vec<QuestionOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_counts_each_status() {
        let counts = StatusCounts::tally([
            QuestionStatus::Attempted,
            QuestionStatus::Unseen,
            QuestionStatus::MarkedForReview,
            QuestionStatus::Unseen,
        ]);
        assert_eq!(counts.attempted, 1);
        assert_eq!(counts.marked_for_review, 1);
        assert_eq!(counts.unseen, 2);
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn palette_numbers_are_one_based() {
        let entry = PaletteEntry {
            index: 0,
            status: QuestionStatus::Unseen,
            is_current: true,
            has_selection: false,
        };
        assert_eq!(entry.number(), 1);
    }
}
