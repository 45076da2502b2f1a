//! Thumbs-up / thumbs-down feedback on a single feature.
//!
//! [`FeatureFeedbackWidget`] is the small sibling of the survey: one vote,
//! an optional comment, one submit.
//!
//! | Action          | Effect                                               |
//! |-----------------|------------------------------------------------------|
//! | `select(vote)`  | Sets the vote. Selecting the current vote clears it. |
//! | `set_comment`   | Sets the comment. Empty text clears it.              |
//! | `cancel()`      | Clears the vote and closes the prompt.               |
//! | `submit()`      | Vote check, CAPTCHA token, one backend call.         |
//!
//! Input is ignored while a submission is in flight and after it succeeded.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::backend::{FeatureFeedback, FeedbackBackend, SubmitOutcome};
use crate::captcha::{CaptchaLoader, CaptchaProvider};
use crate::config::FeatureConfig;
use crate::coordinator::SubmissionState;
use crate::error::{ConfigError, SubmissionError};
use crate::question::Vote;
use crate::timeout::timed;

#[derive(Debug, Default)]
struct FeatureInner {
    vote: Option<Vote>,
    comment: Option<String>,
    open: bool,
    state: SubmissionState,
    error: Option<SubmissionError>,
}

impl FeatureInner {
    fn accepts_input(&self) -> bool {
        !matches!(self.state, SubmissionState::Processing | SubmissionState::Submitted)
    }
}

/// Single-vote feedback prompt for one feature.
pub struct FeatureFeedbackWidget {
    config: FeatureConfig,
    backend: Option<Arc<dyn FeedbackBackend>>,
    captcha: Option<CaptchaLoader>,
    inner: Mutex<FeatureInner>,
}

impl FeatureFeedbackWidget {
    pub fn new(config: FeatureConfig) -> Self {
        Self {
            config,
            backend: None,
            captcha: None,
            inner: Mutex::new(FeatureInner::default()),
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn FeedbackBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_captcha(mut self, provider: Arc<dyn CaptchaProvider>) -> Self {
        self.captcha = Some(CaptchaLoader::new(provider));
        self
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn prompt(&self) -> &str {
        &self.config.prompt
    }

    pub fn vote(&self) -> Option<Vote> {
        self.lock().vote
    }

    pub fn comment(&self) -> Option<String> {
        self.lock().comment.clone()
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    pub fn state(&self) -> SubmissionState {
        self.lock().state
    }

    pub fn error(&self) -> Option<SubmissionError> {
        self.lock().error.clone()
    }

    pub fn error_message(&self) -> Option<String> {
        self.lock().error.as_ref().map(SubmissionError::message)
    }

    /// Show the prompt and start loading the CAPTCHA widget.
    pub fn open(&self) {
        self.lock().open = true;
        if let Some(captcha) = &self.captcha {
            captcha.preload();
        }
    }

    /// Pick a vote. Picking the current vote again clears it.
    ///
    /// Returns `false` if input is not accepted right now.
    pub fn select(&self, vote: Vote) -> bool {
        let mut inner = self.lock();
        if !inner.accepts_input() {
            return false;
        }
        inner.vote = if inner.vote == Some(vote) { None } else { Some(vote) };
        true
    }

    pub fn set_comment(&self, text: impl Into<String>) -> bool {
        let text = text.into();
        let mut inner = self.lock();
        if !inner.accepts_input() {
            return false;
        }
        inner.comment = (!text.is_empty()).then_some(text);
        true
    }

    /// Clear the vote and close. The error is cleared unless submitted.
    pub fn cancel(&self) {
        let mut inner = self.lock();
        if inner.state == SubmissionState::Processing {
            debug!("cancel ignored while submitting");
            return;
        }
        inner.open = false;
        if inner.state != SubmissionState::Submitted {
            inner.vote = None;
            inner.error = None;
            inner.state = SubmissionState::Idle;
        }
    }

    /// Send the vote.
    ///
    /// Returns the resulting state. Only misconfiguration is an `Err`.
    pub async fn submit(&self) -> Result<SubmissionState, ConfigError> {
        if self.config.feature_identifier.trim().is_empty() {
            return Err(ConfigError::MissingIdentifier);
        }
        let backend = self.backend.as_ref().ok_or(ConfigError::MissingBackend)?;
        let captcha = self.captcha.as_ref().ok_or(ConfigError::MissingCaptcha)?;
        let limit = self.config.submit_timeout;

        let (vote, comments) = {
            let mut inner = self.lock();
            if !inner.accepts_input() {
                debug!("feature submit ignored in state {}", inner.state);
                return Ok(inner.state);
            }
            let Some(vote) = inner.vote else {
                inner.state = SubmissionState::Error;
                inner.error = Some(SubmissionError::MissingVote);
                return Ok(SubmissionState::Error);
            };
            inner.state = SubmissionState::Processing;
            inner.error = None;
            (vote, inner.comment.clone())
        };
        let _attempt = AttemptGuard { widget: self };

        let outcome = async {
            let widget = captcha.widget(limit).await?;
            let token = timed(widget.execute(), limit).await??;
            let feedback = FeatureFeedback {
                feature_identifier: self.config.feature_identifier.clone(),
                vote,
                comments,
                recaptcha_token: token,
            };
            debug!("submitting {vote} for feature '{}'", feedback.feature_identifier);
            Ok::<_, SubmissionError>(timed(backend.submit_feedback(feedback), limit).await??)
        }
        .await;

        let mut inner = self.lock();
        match outcome {
            Ok(SubmitOutcome::Accepted) => {
                info!("feedback on '{}' submitted", self.config.feature_identifier);
                inner.state = SubmissionState::Submitted;
                inner.open = false;
            }
            Ok(SubmitOutcome::Rejected { reason }) => {
                warn!("feedback rejected: {}", reason.as_deref().unwrap_or("no reason given"));
                inner.state = SubmissionState::Error;
                inner.error = Some(SubmissionError::Rejected { reason });
            }
            Err(e) => {
                warn!("feedback submission failed: {e}");
                inner.state = SubmissionState::Error;
                inner.error = Some(e);
            }
        }
        let state = inner.state;
        drop(inner);
        Ok(state)
    }

    fn lock(&self) -> MutexGuard<'_, FeatureInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Returns an abandoned `submit` to `idle`.
struct AttemptGuard<'a> {
    widget: &'a FeatureFeedbackWidget,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.widget.lock();
        if inner.state == SubmissionState::Processing {
            debug!("feature submit abandoned");
            inner.state = SubmissionState::Idle;
        }
    }
}

impl std::fmt::Debug for FeatureFeedbackWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureFeedbackWidget")
            .field("feature", &self.config.feature_identifier)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
