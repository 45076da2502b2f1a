//! What the coordinator submits.
//!
//! [`SurveyContent`] is the seam between the submission coordinator and the
//! questions it drives. Two implementations ship with the crate:
//!
//! - [`ResponseModel`]: data-driven surveys built from [`Question`] descriptors.
//! - [`QuestionSlots`]: surveys assembled from interactive components.
//!
//! [`Question`]: crate::question::Question

use crate::components::QuestionSlots;
use crate::question::{QuestionId, QuestionType};
use crate::response::{QuestionResponse, ResponseModel};
use crate::validate::{self, ValidationReport};

/// Questions a coordinator can validate, lock and read responses from.
pub trait SurveyContent: Send + 'static {
    /// Check every question, returning the ones that fail.
    fn validate(&mut self) -> ValidationReport;

    /// Payload entries in survey order.
    fn responses(&self) -> Vec<QuestionResponse>;

    /// Current disabled flag of every question that can be disabled.
    fn disabled_states(&self) -> Vec<(QuestionId, bool)>;

    fn set_disabled(&mut self, id: QuestionId, disabled: bool);
}

impl SurveyContent for ResponseModel {
    fn validate(&mut self) -> ValidationReport {
        validate::validate(self)
    }

    fn responses(&self) -> Vec<QuestionResponse> {
        self.payload()
    }

    fn disabled_states(&self) -> Vec<(QuestionId, bool)> {
        self.iter()
            .filter(|(_, entry)| entry.question().question_type() != QuestionType::Extra)
            .map(|(id, entry)| (id, entry.is_disabled()))
            .collect()
    }

    fn set_disabled(&mut self, id: QuestionId, disabled: bool) {
        ResponseModel::set_disabled(self, id, disabled);
    }
}

impl SurveyContent for QuestionSlots {
    fn validate(&mut self) -> ValidationReport {
        QuestionSlots::validate(self)
    }

    fn responses(&self) -> Vec<QuestionResponse> {
        QuestionSlots::responses(self)
    }

    fn disabled_states(&self) -> Vec<(QuestionId, bool)> {
        (0..self.len())
            .map(QuestionId)
            .filter_map(|id| {
                let d = self.get(id)?.as_disableable()?;
                Some((id, d.is_disabled()))
            })
            .collect()
    }

    fn set_disabled(&mut self, id: QuestionId, disabled: bool) {
        if let Some(d) = self.get_mut(id).and_then(|q| q.as_disableable_mut()) {
            d.set_disabled(disabled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ExtraQuestion, VoteQuestion};
    use crate::question::Question;

    #[test]
    fn model_reports_only_interactive_questions() {
        let mut model = ResponseModel::new([
            Question::vote("a"),
            Question::extra("x", "y"),
            Question::comment("b"),
        ]);
        SurveyContent::set_disabled(&mut model, QuestionId(2), true);
        assert_eq!(
            model.disabled_states(),
            vec![(QuestionId(0), false), (QuestionId(2), true)]
        );
    }

    #[test]
    fn slots_report_only_disableable_components() {
        let mut slots = QuestionSlots::new()
            .with(ExtraQuestion::new("x", "y"))
            .with(VoteQuestion::new("a").disabled());
        assert_eq!(slots.disabled_states(), vec![(QuestionId(1), true)]);

        SurveyContent::set_disabled(&mut slots, QuestionId(1), false);
        SurveyContent::set_disabled(&mut slots, QuestionId(0), true);
        assert_eq!(slots.disabled_states(), vec![(QuestionId(1), false)]);
    }
}
