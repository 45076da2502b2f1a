//! Endpoint handlers and the submission log.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use feedback_rs::question::Vote;
use feedback_rs::response::QuestionResponse;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::{StubConfig, StubMode};

/// Message of the failure result sent for a token mismatch.
pub const INVALID_TOKEN_MESSAGE: &str = "invalid CAPTCHA token";

/// A submission as the stub received it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecordedSubmission {
    Feature {
        feature_id: String,
        rating: Vote,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
        token: String,
    },
    Survey {
        survey_id: String,
        responses: Vec<QuestionResponse>,
        token: String,
    },
}

impl RecordedSubmission {
    pub fn token(&self) -> &str {
        match self {
            Self::Feature { token, .. } | Self::Survey { token, .. } => token,
        }
    }
}

/// Submissions recorded by a running stub, shared with its handlers.
#[derive(Clone, Default, Debug)]
pub struct SubmissionLog(Arc<Mutex<Vec<RecordedSubmission>>>);

impl SubmissionLog {
    pub fn record(&self, submission: RecordedSubmission) {
        self.lock().push(submission);
    }

    /// Everything recorded so far, oldest first.
    pub fn all(&self) -> Vec<RecordedSubmission> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RecordedSubmission>> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Shared application state passed to all handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<StubConfig>,
    pub log: SubmissionLog,
}

/// Query string of `GET /api/feedback`. Carries either the feature
/// parameters or the survey parameters.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackQuery {
    pub feature_id: Option<String>,
    pub rating: Option<String>,
    pub comment: Option<String>,
    pub survey_id: Option<String>,
    pub responses: Option<String>,
    pub token: Option<String>,
}

impl FeedbackQuery {
    fn into_submission(self) -> Result<RecordedSubmission, String> {
        let token = self.token.ok_or("missing parameter 'token'")?;
        if let Some(feature_id) = self.feature_id {
            let rating = self
                .rating
                .ok_or("missing parameter 'rating'")?
                .parse::<Vote>()?;
            return Ok(RecordedSubmission::Feature {
                feature_id,
                rating,
                comment: self.comment.filter(|c| !c.is_empty()),
                token,
            });
        }
        if let Some(survey_id) = self.survey_id {
            let raw = self.responses.ok_or("missing parameter 'responses'")?;
            let responses = serde_json::from_str(&raw)
                .map_err(|e| format!("invalid 'responses': {e}"))?;
            return Ok(RecordedSubmission::Survey {
                survey_id,
                responses,
                token,
            });
        }
        Err("expected 'featureId' or 'surveyId'".to_string())
    }
}

fn success() -> Response {
    Json(json!({"success": true, "value": true})).into_response()
}

fn failure(message: &str) -> Response {
    Json(json!({"success": false, "error": {"message": message}})).into_response()
}

/// `GET /api/feedback`: receive feature feedback or a survey.
///
/// Malformed queries get 400 with a plain-text reason. A token mismatch is
/// a failure result and is not recorded.
pub async fn get_feedback(State(app): State<AppState>, Query(query): Query<FeedbackQuery>) -> Response {
    if !app.config.delay.is_zero() {
        tokio::time::sleep(app.config.delay).await;
    }

    if let StubMode::Fail { status } = app.config.mode {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        debug!("answering with configured failure {status}");
        return (status, "stub configured to fail").into_response();
    }

    let submission = match query.into_submission() {
        Ok(submission) => submission,
        Err(reason) => {
            warn!("bad feedback request: {reason}");
            return (StatusCode::BAD_REQUEST, reason).into_response();
        }
    };

    if let Some(required) = &app.config.required_token
        && submission.token() != required
    {
        warn!("rejecting submission with token '{}'", submission.token());
        return failure(INVALID_TOKEN_MESSAGE);
    }

    info!("recorded {submission:?}");
    app.log.record(submission);

    match &app.config.mode {
        StubMode::Reject { message } => failure(message),
        _ => success(),
    }
}

/// `GET /api/submissions`: everything recorded so far.
pub async fn get_submissions(State(app): State<AppState>) -> Json<Vec<RecordedSubmission>> {
    Json(app.log.all())
}
