//! Required-response rules.
//!
//! | Kind    | Valid when                                   |
//! |---------|----------------------------------------------|
//! | extra   | always                                       |
//! | vote    | not required, or a vote is set               |
//! | comment | not required, or the comment is non-empty    |
//!
//! A comment attached to a vote question is always optional.

use std::collections::BTreeSet;

use crate::question::{Question, QuestionId, QuestionKind};
use crate::response::{Response, ResponseModel};

/// Outcome of validating a whole survey.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub failing: BTreeSet<QuestionId>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.failing.is_empty()
    }

    pub fn fail(&mut self, id: QuestionId) {
        self.failing.insert(id);
    }

    /// Failing ids in survey order.
    pub fn failing_ids(&self) -> Vec<QuestionId> {
        self.failing.iter().copied().collect()
    }
}

/// Whether `response` satisfies `question`'s rule.
pub fn is_answered(question: &Question, response: &Response) -> bool {
    if !question.is_required() {
        return true;
    }
    match (question.kind(), response) {
        (QuestionKind::Extra { .. }, _) => true,
        (QuestionKind::Vote { .. }, Response::Vote { vote, .. }) => vote.is_some(),
        (QuestionKind::Comment { .. }, Response::Comment { comment }) => {
            comment.as_deref().is_some_and(|c| !c.is_empty())
        }
        // Shape mismatch cannot be built through ResponseModel; treat as unanswered.
        _ => false,
    }
}

/// Validate every entry of `model`.
pub fn validate(model: &ResponseModel) -> ValidationReport {
    let mut report = ValidationReport::default();
    for (id, entry) in model.iter() {
        if !is_answered(entry.question(), entry.response()) {
            report.fail(id);
        }
    }
    report
}
