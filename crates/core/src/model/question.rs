use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Progress classification of a single question.
///
/// `MarkedForReview` is sticky: selecting an option afterwards keeps the flag.
/// Nothing ever moves a question back to `Unseen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum QuestionStatus {
    #[default]
    Unseen,
    Attempted,
    MarkedForReview,
}

impl QuestionStatus {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            QuestionStatus::Unseen => "Unseen",
            QuestionStatus::Attempted => "Attempted",
            QuestionStatus::MarkedForReview => "In Review",
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question together with the candidate's progress on it.
///
/// Prompt, options and the correct index are fixed at creation. Selection and
/// status change only through `ExamSession`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: Vec<String>,
    correct_index: usize,
    selected: Option<usize>,
    status: QuestionStatus,
}

impl Question {
    #[must_use]
    pub fn new<T, O>(text: T, options: O, correct_index: usize) -> Self
    where
        T: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self::with_id(QuestionId::new(), text, options, correct_index)
    }

    #[must_use]
    pub fn with_id<T, O>(id: QuestionId, text: T, options: O, correct_index: usize) -> Self
    where
        T: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self {
            id,
            text: text.into(),
            options: options.into_iter().map(Into::into).collect(),
            correct_index,
            selected: None,
            status: QuestionStatus::Unseen,
        }
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    /// Index of the correct option. Carried for hosts; never evaluated here.
    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn status(&self) -> QuestionStatus {
        self.status
    }

    /// Records a selection. Returns `false` if `index` is not an option.
    pub(crate) fn select(&mut self, index: usize) -> bool {
        if index >= self.options.len() {
            return false;
        }
        self.selected = Some(index);
        if self.status != QuestionStatus::MarkedForReview {
            self.status = QuestionStatus::Attempted;
        }
        true
    }

    pub(crate) fn mark_for_review(&mut self) {
        self.status = QuestionStatus::MarkedForReview;
    }
}
