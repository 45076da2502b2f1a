//! Per-question response state and the ordered response model.
//!
//! [`ResponseModel`] pairs every [`Question`] with a [`Response`] whose shape
//! is fixed by the question kind. UI callbacks edit responses by
//! [`QuestionId`] (or by the positional data attribute carried on DOM-like
//! events); the coordinator reads the aggregate [`payload`](ResponseModel::payload)
//! at submit time.
//!
//! Replacing the question set is destructive: [`ResponseModel::regenerate`]
//! throws away every response and reseeds extras from their static text.

use serde::{Deserialize, Serialize};

use crate::error::EditError;
use crate::question::{Question, QuestionId, QuestionKind, Vote};

/// One entry of a submission payload.
///
/// Vote questions contribute a `rating` (and a `comment` if one was written),
/// comment questions a `comment`, and extras their static text as `comment`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct QuestionResponse {
    /// The question prompt, or the extra's name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Vote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl QuestionResponse {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rating: None,
            comment: None,
        }
    }

    pub fn with_rating(mut self, rating: Option<Vote>) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }
}

/// The user's current answer to one question.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    Vote {
        vote: Option<Vote>,
        comment: Option<String>,
    },
    Comment {
        comment: Option<String>,
    },
    /// Seeded from the question's `extra_info`; never edited.
    Extra {
        info: Option<String>,
    },
}

impl Response {
    /// The blank response for `question`.
    pub fn seed(question: &Question) -> Self {
        match question.kind() {
            QuestionKind::Vote { .. } => Response::Vote {
                vote: None,
                comment: None,
            },
            QuestionKind::Comment { .. } => Response::Comment { comment: None },
            QuestionKind::Extra { extra_info } => Response::Extra {
                info: extra_info.clone(),
            },
        }
    }

    pub fn vote(&self) -> Option<Vote> {
        match self {
            Response::Vote { vote, .. } => *vote,
            _ => None,
        }
    }

    /// The comment text, or the static text for extras.
    pub fn comment(&self) -> Option<&str> {
        match self {
            Response::Vote { comment, .. } | Response::Comment { comment } => comment.as_deref(),
            Response::Extra { info } => info.as_deref(),
        }
    }

    /// Payload entry for this response under `name`.
    pub fn to_payload(&self, name: &str) -> QuestionResponse {
        QuestionResponse::new(name)
            .with_rating(self.vote())
            .with_comment(self.comment().map(str::to_string))
    }
}

/// A question, its response, and whether it currently accepts input.
#[derive(Clone, Debug)]
pub struct SurveyEntry {
    question: Question,
    response: Response,
    disabled: bool,
}

impl SurveyEntry {
    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }
}

/// Ordered {question, response} pairs for a data-driven survey.
#[derive(Clone, Debug, Default)]
pub struct ResponseModel {
    entries: Vec<SurveyEntry>,
}

impl ResponseModel {
    pub fn new(questions: impl IntoIterator<Item = Question>) -> Self {
        let mut model = Self::default();
        model.regenerate(questions);
        model
    }

    /// Replace the question set, discarding every previous response.
    pub fn regenerate(&mut self, questions: impl IntoIterator<Item = Question>) {
        self.entries = questions
            .into_iter()
            .map(|question| SurveyEntry {
                response: Response::seed(&question),
                question,
                disabled: false,
            })
            .collect();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: QuestionId) -> Option<&SurveyEntry> {
        self.entries.get(id.index())
    }

    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.get(id).map(SurveyEntry::question)
    }

    pub fn response(&self, id: QuestionId) -> Option<&Response> {
        self.get(id).map(SurveyEntry::response)
    }

    /// Resolve the positional data attribute a UI event carries.
    pub fn at_position(&self, attr: &str) -> Option<QuestionId> {
        QuestionId::from_data_attr(attr).filter(|id| id.index() < self.entries.len())
    }

    /// Iterate `(id, entry)` pairs in survey order.
    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, &SurveyEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (QuestionId(i), e))
    }

    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.entries.iter().map(SurveyEntry::question)
    }

    /// Record a vote on a vote question.
    pub fn set_vote(&mut self, id: QuestionId, vote: Vote) -> Result<(), EditError> {
        self.replace_vote(id, Some(vote))
    }

    /// Remove the vote on a vote question.
    pub fn clear_vote(&mut self, id: QuestionId) -> Result<(), EditError> {
        self.replace_vote(id, None)
    }

    /// Record comment text. An empty string clears the comment.
    pub fn set_comment(&mut self, id: QuestionId, text: impl Into<String>) -> Result<(), EditError> {
        let text = text.into();
        let accepts = self.editable(id)?.question.accepts_comment();
        if !accepts {
            return Err(EditError::NotCommentable(id));
        }
        let value = (!text.is_empty()).then_some(text);
        match &mut self.entries[id.index()].response {
            Response::Vote { comment, .. } | Response::Comment { comment } => *comment = value,
            Response::Extra { .. } => return Err(EditError::NotCommentable(id)),
        }
        Ok(())
    }

    pub fn is_disabled(&self, id: QuestionId) -> Option<bool> {
        self.get(id).map(SurveyEntry::is_disabled)
    }

    /// Enable or disable input on a question. Extras are never interactive
    /// and ignore this.
    pub fn set_disabled(&mut self, id: QuestionId, disabled: bool) {
        if let Some(entry) = self.entries.get_mut(id.index())
            && !matches!(entry.response, Response::Extra { .. })
        {
            entry.disabled = disabled;
        }
    }

    /// One payload entry per question, in order.
    pub fn payload(&self) -> Vec<QuestionResponse> {
        self.entries
            .iter()
            .map(|e| e.response.to_payload(e.question.text()))
            .collect()
    }

    fn replace_vote(&mut self, id: QuestionId, new_vote: Option<Vote>) -> Result<(), EditError> {
        let entry = self.editable(id)?;
        match &mut entry.response {
            Response::Vote { vote, .. } => {
                *vote = new_vote;
                Ok(())
            }
            _ => Err(EditError::NotVotable(id)),
        }
    }

    fn editable(&mut self, id: QuestionId) -> Result<&mut SurveyEntry, EditError> {
        let entry = self
            .entries
            .get_mut(id.index())
            .ok_or(EditError::UnknownQuestion(id))?;
        if entry.disabled {
            return Err(EditError::Disabled(id));
        }
        Ok(entry)
    }
}
