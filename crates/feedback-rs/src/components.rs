//! Interactive question components.
//!
//! The data-driven survey keeps every response in a [`ResponseModel`]. When
//! questions are standalone interactive objects instead, each one owns its
//! own response fragment and the survey pulls from it at submit time. What a
//! component can do is declared explicitly through capability traits:
//!
//! | Capability       | Meaning                                   | Missing means        |
//! |------------------|-------------------------------------------|----------------------|
//! | [`Validatable`]  | can check its own response                | treated as valid     |
//! | [`HasResponse`]  | contributes an entry to the payload       | not submitted        |
//! | [`Disableable`]  | can be locked while a submit is in flight | left alone           |
//!
//! [`QuestionSlots`] holds components in survey order and is what the
//! coordinator drives for component-style surveys.
//!
//! [`ResponseModel`]: crate::response::ResponseModel

use std::any::Any;
use std::fmt;

use crate::question::{PLACEHOLDER_OPTIONAL, PLACEHOLDER_REQUIRED, QuestionId, Vote};
use crate::response::QuestionResponse;
use crate::validate::ValidationReport;

/// Validity message for a required vote with no vote.
pub const VOTE_REQUIRED: &str = "A vote is required.";

/// Validity message for a required comment with no text.
pub const COMMENT_REQUIRED: &str = "A comment is required.";

// ── Capabilities ───────────────────────────────────────────────────

/// A question that can check its own response.
pub trait Validatable {
    /// Check the current response, recording the outcome for styling.
    fn validate(&mut self) -> bool;

    /// Message describing why the last validation failed, if it did.
    fn validity_message(&self) -> Option<&'static str>;
}

/// A question that contributes to the submission payload.
pub trait HasResponse {
    fn response(&self) -> QuestionResponse;
}

/// A question that can be locked against input.
pub trait Disableable {
    fn is_disabled(&self) -> bool;
    fn set_disabled(&mut self, disabled: bool);
}

/// A component that can sit in a survey.
///
/// The `as_*` accessors default to `None`; implementations override the ones
/// whose capability they provide.
pub trait SurveyQuestion: Any + Send + fmt::Debug {
    /// Whether the user sees this question.
    fn visible(&self) -> bool;

    /// Whether this question takes part in numbering.
    fn numbered(&self) -> bool;

    fn as_validatable(&mut self) -> Option<&mut dyn Validatable> {
        None
    }

    fn as_response(&self) -> Option<&dyn HasResponse> {
        None
    }

    fn as_disableable(&self) -> Option<&dyn Disableable> {
        None
    }

    fn as_disableable_mut(&mut self) -> Option<&mut dyn Disableable> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

// ── Vote ───────────────────────────────────────────────────────────

/// Up/down vote with an optional comment box.
#[derive(Clone, Debug, Default)]
pub struct VoteQuestion {
    prompt: String,
    vote: Option<Vote>,
    comment: Option<String>,
    comment_placeholder: Option<String>,
    show_comments: bool,
    required: bool,
    disabled: bool,
    skip_number: bool,
    invalid: bool,
}

impl VoteQuestion {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_comments(mut self) -> Self {
        self.show_comments = true;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.comment_placeholder = Some(placeholder.into());
        self
    }

    pub fn skip_number(mut self) -> Self {
        self.skip_number = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn vote(&self) -> Option<Vote> {
        self.vote
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn shows_comments(&self) -> bool {
        self.show_comments
    }

    /// Placeholder for the comment box. A vote's comment is always optional.
    pub fn placeholder(&self) -> &str {
        self.comment_placeholder
            .as_deref()
            .unwrap_or(PLACEHOLDER_OPTIONAL)
    }

    /// Whether the last validation failed and no vote has been cast since.
    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    /// Record a vote. Returns `false` if the question is disabled.
    pub fn select(&mut self, vote: Vote) -> bool {
        if self.disabled {
            return false;
        }
        self.vote = Some(vote);
        self.invalid = false;
        true
    }

    /// Update the comment text. Ignored when disabled or when no comment
    /// box is shown. An empty string clears the comment.
    pub fn set_comment(&mut self, text: impl Into<String>) -> bool {
        if self.disabled || !self.show_comments {
            return false;
        }
        let text = text.into();
        self.comment = (!text.is_empty()).then_some(text);
        true
    }
}

impl Validatable for VoteQuestion {
    fn validate(&mut self) -> bool {
        let valid = !self.required || self.vote.is_some();
        self.invalid = !valid;
        valid
    }

    fn validity_message(&self) -> Option<&'static str> {
        self.invalid.then_some(VOTE_REQUIRED)
    }
}

impl HasResponse for VoteQuestion {
    fn response(&self) -> QuestionResponse {
        let comment = if self.show_comments {
            self.comment.clone()
        } else {
            None
        };
        QuestionResponse::new(&self.prompt)
            .with_rating(self.vote)
            .with_comment(comment)
    }
}

impl Disableable for VoteQuestion {
    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }
}

// ── Comment ────────────────────────────────────────────────────────

/// Free-text comment question.
#[derive(Clone, Debug, Default)]
pub struct CommentQuestion {
    prompt: String,
    value: Option<String>,
    placeholder: Option<String>,
    required: bool,
    disabled: bool,
    skip_number: bool,
    invalid: bool,
}

impl CommentQuestion {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn skip_number(mut self) -> Self {
        self.skip_number = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn placeholder(&self) -> &str {
        match &self.placeholder {
            Some(p) => p,
            None if self.required => PLACEHOLDER_REQUIRED,
            None => PLACEHOLDER_OPTIONAL,
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    /// Update the text. Returns `false` if the question is disabled.
    pub fn set_value(&mut self, text: impl Into<String>) -> bool {
        if self.disabled {
            return false;
        }
        let text = text.into();
        if !text.is_empty() {
            self.invalid = false;
        }
        self.value = (!text.is_empty()).then_some(text);
        true
    }
}

impl Validatable for CommentQuestion {
    fn validate(&mut self) -> bool {
        let valid = !self.required || self.value.is_some();
        self.invalid = !valid;
        valid
    }

    fn validity_message(&self) -> Option<&'static str> {
        self.invalid.then_some(COMMENT_REQUIRED)
    }
}

impl HasResponse for CommentQuestion {
    fn response(&self) -> QuestionResponse {
        QuestionResponse::new(&self.prompt).with_comment(self.value.clone())
    }
}

impl Disableable for CommentQuestion {
    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }
}

// ── Extra ──────────────────────────────────────────────────────────

/// Hidden name/value pair submitted with the survey.
#[derive(Clone, Debug, Default)]
pub struct ExtraQuestion {
    name: String,
    value: Option<String>,
}

impl ExtraQuestion {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl HasResponse for ExtraQuestion {
    fn response(&self) -> QuestionResponse {
        QuestionResponse::new(&self.name).with_comment(self.value.clone())
    }
}

// ── SurveyQuestion impls ───────────────────────────────────────────

macro_rules! interactive_question {
    ($ty:ty) => {
        impl SurveyQuestion for $ty {
            fn visible(&self) -> bool {
                true
            }

            fn numbered(&self) -> bool {
                !self.skip_number
            }

            fn as_validatable(&mut self) -> Option<&mut dyn Validatable> {
                Some(self)
            }

            fn as_response(&self) -> Option<&dyn HasResponse> {
                Some(self)
            }

            fn as_disableable(&self) -> Option<&dyn Disableable> {
                Some(self)
            }

            fn as_disableable_mut(&mut self) -> Option<&mut dyn Disableable> {
                Some(self)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }
    };
}

interactive_question!(VoteQuestion);
interactive_question!(CommentQuestion);

impl SurveyQuestion for ExtraQuestion {
    fn visible(&self) -> bool {
        false
    }

    fn numbered(&self) -> bool {
        false
    }

    fn as_response(&self) -> Option<&dyn HasResponse> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ── Slots ──────────────────────────────────────────────────────────

/// Ordered question components of a survey.
#[derive(Debug, Default)]
pub struct QuestionSlots {
    slots: Vec<Box<dyn SurveyQuestion>>,
}

impl QuestionSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a component, builder style.
    pub fn with(mut self, question: impl SurveyQuestion) -> Self {
        self.push(question);
        self
    }

    pub fn push(&mut self, question: impl SurveyQuestion) -> QuestionId {
        self.slots.push(Box::new(question));
        QuestionId(self.slots.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, id: QuestionId) -> Option<&dyn SurveyQuestion> {
        self.slots.get(id.index()).map(|q| q.as_ref())
    }

    pub fn get_mut(&mut self, id: QuestionId) -> Option<&mut dyn SurveyQuestion> {
        self.slots.get_mut(id.index()).map(|q| q.as_mut())
    }

    /// Typed access to a slot, e.g. to forward a UI event to a
    /// [`VoteQuestion`].
    pub fn slot<T: SurveyQuestion>(&self, id: QuestionId) -> Option<&T> {
        self.get(id)?.as_any().downcast_ref()
    }

    pub fn slot_mut<T: SurveyQuestion>(&mut self, id: QuestionId) -> Option<&mut T> {
        self.get_mut(id)?.as_any_mut().downcast_mut()
    }

    /// Run every component's own validation. Components without the
    /// capability count as valid.
    pub fn validate(&mut self) -> ValidationReport {
        let mut report = ValidationReport::default();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if let Some(v) = slot.as_validatable()
                && !v.validate()
            {
                report.fail(QuestionId(i));
            }
        }
        report
    }

    /// Payload entries from every component that has a response.
    pub fn responses(&self) -> Vec<QuestionResponse> {
        self.slots
            .iter()
            .filter_map(|q| q.as_response().map(|r| r.response()))
            .collect()
    }

    /// 1-based display numbers, `None` for hidden or unnumbered questions.
    pub fn numbers(&self) -> Vec<Option<u32>> {
        question_numbers(self.slots.iter().map(|q| q.visible() && q.numbered()))
    }
}

/// Assign 1-based numbers to the questions flagged as numbered, in order.
pub fn question_numbers(numbered: impl IntoIterator<Item = bool>) -> Vec<Option<u32>> {
    let mut next = 0;
    numbered
        .into_iter()
        .map(|n| {
            n.then(|| {
                next += 1;
                next
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survey() -> QuestionSlots {
        QuestionSlots::new()
            .with(VoteQuestion::new("Useful?").required().with_comments())
            .with(CommentQuestion::new("Anything else?"))
            .with(ExtraQuestion::new("extra info", "foo-extra-1"))
    }

    #[test]
    fn vote_response_shape() {
        let mut q = VoteQuestion::new("Useful?").with_comments();
        q.select(Vote::Up);
        q.set_comment("nice");
        assert_eq!(
            q.response(),
            QuestionResponse {
                name: "Useful?".into(),
                rating: Some(Vote::Up),
                comment: Some("nice".into()),
            }
        );
    }

    #[test]
    fn vote_without_comment_box_ignores_comment() {
        let mut q = VoteQuestion::new("Useful?");
        assert!(!q.set_comment("ignored"));
        assert_eq!(q.response().comment, None);
    }

    #[test]
    fn extra_response_has_no_rating() {
        let q = ExtraQuestion::new("extra info", "foo-extra-1");
        let json = serde_json::to_value(q.response()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "extra info", "comment": "foo-extra-1"})
        );
    }

    #[test]
    fn disabled_components_ignore_edits() {
        let mut vote = VoteQuestion::new("v").disabled();
        assert!(!vote.select(Vote::Down));
        assert_eq!(vote.vote(), None);

        let mut comment = CommentQuestion::new("c");
        comment.set_disabled(true);
        assert!(!comment.set_value("text"));
        assert_eq!(comment.value(), None);
    }

    #[test]
    fn validation_marks_and_clears_invalid() {
        let mut q = VoteQuestion::new("v").required();
        assert!(!q.validate());
        assert!(q.is_invalid());
        assert_eq!(q.validity_message(), Some(VOTE_REQUIRED));

        q.select(Vote::Up);
        assert!(!q.is_invalid());
        assert!(q.validate());

        let mut c = CommentQuestion::new("c").required();
        assert!(!c.validate());
        assert_eq!(c.validity_message(), Some(COMMENT_REQUIRED));
        c.set_value("ok");
        assert!(!c.is_invalid());
    }

    #[test]
    fn slots_validate_only_validatable() {
        let mut slots = survey();
        let report = slots.validate();
        assert_eq!(report.failing_ids(), vec![QuestionId(0)]);

        slots.slot_mut::<VoteQuestion>(QuestionId(0)).unwrap().select(Vote::Down);
        assert!(slots.validate().is_valid());
    }

    #[test]
    fn slots_collect_responses_in_order() {
        let mut slots = survey();
        slots
            .slot_mut::<CommentQuestion>(QuestionId(1))
            .unwrap()
            .set_value("more please");
        let names: Vec<_> = slots.responses().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Useful?", "Anything else?", "extra info"]);
    }

    #[test]
    fn typed_access_checks_type() {
        let slots = survey();
        assert!(slots.slot::<CommentQuestion>(QuestionId(0)).is_none());
        assert!(slots.slot::<ExtraQuestion>(QuestionId(2)).is_some());
    }

    #[test]
    fn extras_cannot_be_disabled() {
        let mut slots = survey();
        assert!(
            slots
                .get_mut(QuestionId(2))
                .unwrap()
                .as_disableable_mut()
                .is_none()
        );
    }

    #[test]
    fn numbering_skips_hidden_and_unnumbered() {
        let slots = QuestionSlots::new()
            .with(VoteQuestion::new("a"))
            .with(ExtraQuestion::new("x", "y"))
            .with(CommentQuestion::new("b").skip_number())
            .with(CommentQuestion::new("c"));
        assert_eq!(slots.numbers(), vec![Some(1), None, None, Some(2)]);
    }

    #[test]
    fn placeholders() {
        assert_eq!(CommentQuestion::new("c").placeholder(), PLACEHOLDER_OPTIONAL);
        assert_eq!(
            CommentQuestion::new("c").required().placeholder(),
            PLACEHOLDER_REQUIRED
        );
        assert_eq!(
            VoteQuestion::new("v").required().placeholder(),
            PLACEHOLDER_OPTIONAL
        );
    }
}
