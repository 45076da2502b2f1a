//! HTTP client for the feedback service.
//!
//! Every submission is a single GET to the configured service URL with the
//! submission encoded in the query string:
//!
//! | Submission       | Query parameters                                   |
//! |------------------|----------------------------------------------------|
//! | feature feedback | `featureId`, `rating`, `comment` (if any), `token` |
//! | survey           | `surveyId`, `responses` (JSON array), `token`      |
//!
//! The service answers with a JSON result:
//!
//! ```text
//! {"success": true, "value": true}
//! {"success": false, "error": {"message": "..."}}
//! ```
//!
//! `success: false` maps to [`SubmitOutcome::Rejected`]. A non-2xx status
//! or a body that is not a result is a [`TransportError`]. No retries.

use std::time::{Duration, Instant};

use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::backend::{BackendFuture, FeatureFeedback, FeedbackBackend, SubmitOutcome, SurveySubmission};
use crate::error::TransportError;

/// Default per-request timeout of the underlying HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default `User-Agent` header.
pub const DEFAULT_USER_AGENT: &str = concat!("feedback-rs/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`HttpFeedbackService`].
#[derive(Debug, Clone)]
pub struct FeedbackClientConfig {
    /// Endpoint that receives submissions.
    pub service_url: String,
    pub user_agent: String,
    /// Client-level request timeout. The coordinator's submit timeout
    /// usually fires first.
    pub request_timeout: Duration,
}

impl FeedbackClientConfig {
    pub fn new(service_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// [`FeedbackBackend`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFeedbackService {
    client: reqwest::Client,
    service_url: Url,
}

impl HttpFeedbackService {
    pub fn new(config: FeedbackClientConfig) -> Result<Self, TransportError> {
        let service_url = Url::parse(&config.service_url)
            .map_err(|e| TransportError::new(format!("invalid service URL '{}': {e}", config.service_url)))?;
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::new(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            service_url,
        })
    }

    pub fn service_url(&self) -> &Url {
        &self.service_url
    }

    /// Request URL for a feature feedback submission.
    pub fn feedback_url(&self, feedback: &FeatureFeedback) -> Url {
        let mut url = self.service_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("featureId", &feedback.feature_identifier)
                .append_pair("rating", feedback.vote.as_str());
            if let Some(comment) = feedback.comments.as_deref().filter(|c| !c.is_empty()) {
                query.append_pair("comment", comment);
            }
            query.append_pair("token", &feedback.recaptcha_token);
        }
        url
    }

    /// Request URL for a survey submission.
    pub fn survey_url(&self, survey: &SurveySubmission) -> Result<Url, TransportError> {
        let responses = serde_json::to_string(&survey.responses)
            .map_err(|e| TransportError::new(format!("failed to encode responses: {e}")))?;
        let mut url = self.service_url.clone();
        url.query_pairs_mut()
            .append_pair("surveyId", &survey.survey_identifier)
            .append_pair("responses", &responses)
            .append_pair("token", &survey.recaptcha_token);
        Ok(url)
    }

    async fn send(&self, url: Url) -> Result<SubmitOutcome, TransportError> {
        debug!("feedback request: GET {}", self.service_url);
        let start = Instant::now();

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::new(format!("request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| TransportError::new(format!("failed to read response: {e}")))?;

        debug!(
            "feedback response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(TransportError::new(format!("feedback service HTTP {status}: {text}")));
        }
        parse_result(&text)
    }
}

impl FeedbackBackend for HttpFeedbackService {
    fn submit_feedback(&self, feedback: FeatureFeedback) -> BackendFuture<'_> {
        Box::pin(async move { self.send(self.feedback_url(&feedback)).await })
    }

    fn submit_survey(&self, survey: SurveySubmission) -> BackendFuture<'_> {
        Box::pin(async move {
            let url = self.survey_url(&survey)?;
            self.send(url).await
        })
    }
}

// ── Result body ────────────────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct ResultBody {
    success: bool,
    #[serde(default)]
    error: Option<ResultError>,
}

#[derive(Deserialize, Debug)]
struct ResultError {
    message: String,
}

/// Interpret a result body from the feedback service.
pub fn parse_result(text: &str) -> Result<SubmitOutcome, TransportError> {
    let body: ResultBody = serde_json::from_str(text)
        .map_err(|e| TransportError::new(format!("failed to parse response: {e}")))?;
    if body.success {
        Ok(SubmitOutcome::Accepted)
    } else {
        let reason = body.error.map(|e| e.message);
        warn!(
            "feedback service rejected submission: {}",
            reason.as_deref().unwrap_or("(no reason)")
        );
        Ok(SubmitOutcome::Rejected { reason })
    }
}
