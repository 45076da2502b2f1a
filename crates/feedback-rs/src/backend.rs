//! Submission backend abstraction.
//!
//! A [`FeedbackBackend`] carries feature feedback and survey submissions to
//! the feedback service. Expected failures come back as
//! [`SubmitOutcome::Rejected`]; only transport-level faults are errors.
//! [`HttpFeedbackService`](crate::http::HttpFeedbackService) is the real
//! implementation.

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;

use crate::error::TransportError;
use crate::question::Vote;
use crate::response::QuestionResponse;

/// Boxed future returned by [`FeedbackBackend`] methods.
pub type BackendFuture<'a> = Pin<Box<dyn Future<Output = Result<SubmitOutcome, TransportError>> + Send + 'a>>;

/// Feedback on a single feature.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFeedback {
    pub feature_identifier: String,
    pub vote: Vote,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    pub recaptcha_token: String,
}

/// A completed survey.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SurveySubmission {
    pub survey_identifier: String,
    pub responses: Vec<QuestionResponse>,
    pub recaptcha_token: String,
}

/// What the service said about a submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    Rejected { reason: Option<String> },
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted)
    }
}

/// Destination for feedback submissions.
pub trait FeedbackBackend: Send + Sync {
    fn submit_feedback(&self, feedback: FeatureFeedback) -> BackendFuture<'_>;

    fn submit_survey(&self, survey: SurveySubmission) -> BackendFuture<'_>;
}
