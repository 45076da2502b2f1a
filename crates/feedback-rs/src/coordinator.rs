//! The submission state machine.
//!
//! [`SubmissionCoordinator`] owns a survey's [`SurveyContent`] and drives one
//! end-to-end submission per [`submit`](SubmissionCoordinator::submit) call:
//!
//! 1. Skip if already submitted or if another attempt is in flight.
//! 2. Validate. Failing questions put the survey in `error`; nothing is sent.
//! 3. Check the wiring (identifier, backend, CAPTCHA). Misconfiguration is
//!    returned as a [`ConfigError`] rather than becoming a state.
//! 4. Wait for the CAPTCHA widget.
//! 5. Enter `processing` and disable every question that is not already
//!    disabled, remembering which ones were touched.
//! 6. Run the CAPTCHA challenge for a token.
//! 7. Send the responses to the backend.
//! 8. Accepted: `submitted`. Questions stay disabled.
//! 9. Anything else: `error`, and the questions disabled in step 5 are
//!    re-enabled. Questions the caller had disabled stay disabled.
//!
//! Steps 4, 6 and 7 each race the configured submit timeout. The previous
//! error stays visible until step 5. Replacing the content mid-attempt
//! abandons the attempt; its outcome never reaches the new questions.
//!
//! ```text
//!          submit (valid)               accepted
//!   idle ───────────────▶ processing ───────────▶ submitted
//!    │  ▲                  │      ▲
//!    │  │ reset            │ fail │ retry
//!    ▼  │                  ▼      │
//!   error ◀────────────────┘──────┘
//! ```
//!
//! All methods take `&self`. The inner lock is never held across an
//! `.await`, and observers are notified after it is released, so an
//! observer may call back into the coordinator.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::backend::{FeedbackBackend, SubmitOutcome, SurveySubmission};
use crate::captcha::{CaptchaLoader, CaptchaProvider};
use crate::config::SurveyConfig;
use crate::content::SurveyContent;
use crate::error::{ConfigError, EditError, SubmissionError};
use crate::events::{CompositeObserver, SubmissionEvent, SubmissionObserver};
use crate::question::{Question, QuestionId, Vote};
use crate::response::ResponseModel;
use crate::timeout::timed;

/// Where a survey is in its submission lifecycle.
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionState {
    /// Nothing attempted since the last reset.
    #[default]
    Idle,
    /// A submission is in flight.
    Processing,
    /// The service accepted the submission. Terminal.
    Submitted,
    /// The last attempt failed; the user may fix their input and retry.
    Error,
}

impl SubmissionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionState::Idle => "idle",
            SubmissionState::Processing => "processing",
            SubmissionState::Submitted => "submitted",
            SubmissionState::Error => "error",
        }
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of an accepted submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub identifier: String,
    pub response_count: usize,
    pub submitted_at: DateTime<Utc>,
}

// ── Internal state ─────────────────────────────────────────────────

/// Owned copy of an event, queued while the lock is held.
enum Notice {
    State(SubmissionState, SubmissionState),
    Locked(usize),
    Restored(usize),
    Submitted(SubmissionReceipt),
    Failed(SubmissionError),
}

struct Inner<C> {
    state: SubmissionState,
    error: Option<SubmissionError>,
    content: C,
    /// Questions this coordinator disabled, with their prior flag.
    disabled_by_us: HashMap<QuestionId, bool>,
    in_flight: bool,
    /// Bumped whenever the content is replaced. An attempt that started
    /// under an older generation must not touch the new content.
    generation: u64,
    receipt: Option<SubmissionReceipt>,
}

impl<C: SurveyContent> Inner<C> {
    fn transition(&mut self, to: SubmissionState, notices: &mut Vec<Notice>) {
        if self.state != to {
            notices.push(Notice::State(self.state, to));
            self.state = to;
        }
    }

    fn fail(&mut self, error: SubmissionError, notices: &mut Vec<Notice>) {
        self.error = Some(error.clone());
        self.transition(SubmissionState::Error, notices);
        notices.push(Notice::Failed(error));
    }

    fn lock_questions(&mut self, notices: &mut Vec<Notice>) {
        for (id, disabled) in self.content.disabled_states() {
            if !disabled {
                self.content.set_disabled(id, true);
                self.disabled_by_us.insert(id, disabled);
            }
        }
        if !self.disabled_by_us.is_empty() {
            notices.push(Notice::Locked(self.disabled_by_us.len()));
        }
    }

    fn restore_questions(&mut self, notices: &mut Vec<Notice>) {
        let count = self.disabled_by_us.len();
        for (id, prior) in self.disabled_by_us.drain() {
            self.content.set_disabled(id, prior);
        }
        if count > 0 {
            notices.push(Notice::Restored(count));
        }
    }
}

// ── Coordinator ────────────────────────────────────────────────────

/// Drives validation, CAPTCHA and backend submission for one survey.
pub struct SubmissionCoordinator<C: SurveyContent> {
    config: SurveyConfig,
    backend: Option<Arc<dyn FeedbackBackend>>,
    captcha: Option<CaptchaLoader>,
    observers: CompositeObserver,
    inner: Mutex<Inner<C>>,
}

impl<C: SurveyContent> SubmissionCoordinator<C> {
    pub fn new(config: SurveyConfig, content: C) -> Self {
        Self {
            config,
            backend: None,
            captcha: None,
            observers: CompositeObserver::new(),
            inner: Mutex::new(Inner {
                state: SubmissionState::Idle,
                error: None,
                content,
                disabled_by_us: HashMap::new(),
                in_flight: false,
                generation: 0,
                receipt: None,
            }),
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

    /// Add an observer. Observers are called in the order they were added.
    pub fn with_observer(mut self, observer: impl SubmissionObserver + 'static) -> Self {
        self.observers = std::mem::take(&mut self.observers).with(observer);
        self
    }

    pub fn config(&self) -> &SurveyConfig {
        &self.config
    }

    pub fn state(&self) -> SubmissionState {
        self.lock().state
    }

    /// The error behind the current `error` state.
    pub fn error(&self) -> Option<SubmissionError> {
        self.lock().error.clone()
    }

    /// User-facing text for the current error.
    pub fn error_message(&self) -> Option<String> {
        self.lock().error.as_ref().map(SubmissionError::message)
    }

    /// Questions that failed the last validation, for error styling.
    pub fn failing_questions(&self) -> Vec<QuestionId> {
        self.lock()
            .error
            .as_ref()
            .map(|e| e.failing_questions().to_vec())
            .unwrap_or_default()
    }

    pub fn last_receipt(&self) -> Option<SubmissionReceipt> {
        self.lock().receipt.clone()
    }

    /// Read the content.
    pub fn with_content<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        f(&self.lock().content)
    }

    /// Mutate the content from a UI callback.
    ///
    /// Questions disabled for an in-flight or finished submission reject
    /// edits on their own.
    pub fn edit<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        f(&mut self.lock().content)
    }

    /// Start loading the CAPTCHA widget ahead of the first submit.
    pub fn preload_captcha(&self) {
        if let Some(captcha) = &self.captcha {
            captcha.preload();
        }
    }

    /// Return to `idle` and clear the error.
    ///
    /// Does nothing once submitted or while an attempt is in flight.
    pub fn reset(&self) {
        let mut notices = Vec::new();
        {
            let mut inner = self.lock();
            if inner.state == SubmissionState::Submitted || inner.in_flight {
                debug!("reset ignored in state {}", inner.state);
                return;
            }
            inner.error = None;
            inner.transition(SubmissionState::Idle, &mut notices);
        }
        self.notify(notices);
    }

    /// Swap in a new question set. All responses, errors and the
    /// submitted flag are discarded.
    ///
    /// An attempt in flight is abandoned: whatever it later hears back is
    /// dropped, and the new questions can be submitted right away.
    pub fn replace_content(&self, content: C) {
        let mut notices = Vec::new();
        {
            let mut inner = self.lock();
            if inner.in_flight {
                debug!("question set replaced during submit; abandoning attempt");
            }
            inner.content = content;
            inner.generation = inner.generation.wrapping_add(1);
            inner.in_flight = false;
            inner.disabled_by_us.clear();
            inner.error = None;
            inner.receipt = None;
            inner.transition(SubmissionState::Idle, &mut notices);
        }
        self.notify(notices);
    }

    /// Run one submission attempt.
    ///
    /// Returns the resulting state. Only misconfiguration is an `Err`;
    /// every other failure is reported through [`state`](Self::state) and
    /// [`error`](Self::error).
    pub async fn submit(&self) -> Result<SubmissionState, ConfigError> {
        let mut notices = Vec::new();

        // Steps 1-2: guard and validate.
        let generation = {
            let mut inner = self.lock();
            if inner.state == SubmissionState::Submitted || inner.in_flight {
                debug!("submit ignored: state={}, in_flight={}", inner.state, inner.in_flight);
                return Ok(inner.state);
            }
            let report = inner.content.validate();
            if !report.is_valid() {
                debug!("validation failed for {} question(s)", report.failing.len());
                inner.fail(
                    SubmissionError::MissingRequiredInput {
                        failing: report.failing_ids(),
                    },
                    &mut notices,
                );
                drop(inner);
                self.notify(notices);
                return Ok(SubmissionState::Error);
            }
            inner.in_flight = true;
            inner.generation
        };
        let _attempt = AttemptGuard {
            coordinator: self,
            generation,
        };

        // Step 3: wiring.
        if self.config.identifier.trim().is_empty() {
            return Err(ConfigError::MissingIdentifier);
        }
        let backend = self.backend.as_ref().ok_or(ConfigError::MissingBackend)?;
        let captcha = self.captcha.as_ref().ok_or(ConfigError::MissingCaptcha)?;
        let limit = self.config.submit_timeout;

        // Step 4: CAPTCHA widget.
        let widget = match captcha.widget(limit).await {
            Ok(widget) => widget,
            Err(e) => return Ok(self.finish(generation, Err(e.into()))),
        };

        // Step 5: lock questions.
        let responses = {
            let mut inner = self.lock();
            if inner.generation != generation {
                debug!("questions replaced while the CAPTCHA loaded; nothing sent");
                return Ok(inner.state);
            }
            inner.error = None;
            inner.transition(SubmissionState::Processing, &mut notices);
            inner.lock_questions(&mut notices);
            inner.content.responses()
        };
        self.notify(std::mem::take(&mut notices));

        // Steps 6-7: token, then backend.
        let outcome = async {
            let token = timed(widget.execute(), limit).await??;
            let submission = SurveySubmission {
                survey_identifier: self.config.identifier.clone(),
                responses,
                recaptcha_token: token,
            };
            debug!(
                "submitting survey '{}' with {} response(s)",
                submission.survey_identifier,
                submission.responses.len()
            );
            Ok::<_, SubmissionError>(timed(backend.submit_survey(submission), limit).await??)
        }
        .await;

        Ok(self.finish(generation, outcome))
    }

    /// Steps 8-9: settle an attempt that got past validation. The outcome of
    /// an attempt whose content has since been replaced is dropped.
    fn finish(&self, generation: u64, outcome: Result<SubmitOutcome, SubmissionError>) -> SubmissionState {
        let mut notices = Vec::new();
        let state = {
            let mut inner = self.lock();
            if inner.generation != generation {
                debug!("dropping outcome of an abandoned attempt");
                return inner.state;
            }
            match outcome {
                Ok(SubmitOutcome::Accepted) => {
                    let receipt = SubmissionReceipt {
                        identifier: self.config.identifier.clone(),
                        response_count: inner.content.responses().len(),
                        submitted_at: Utc::now(),
                    };
                    info!("survey '{}' submitted", receipt.identifier);
                    inner.disabled_by_us.clear();
                    inner.receipt = Some(receipt.clone());
                    inner.transition(SubmissionState::Submitted, &mut notices);
                    notices.push(Notice::Submitted(receipt));
                }
                Ok(SubmitOutcome::Rejected { reason }) => {
                    inner.restore_questions(&mut notices);
                    inner.fail(SubmissionError::Rejected { reason }, &mut notices);
                }
                Err(e) => {
                    inner.restore_questions(&mut notices);
                    inner.fail(e, &mut notices);
                }
            }
            inner.state
        };
        self.notify(notices);
        state
    }

    fn lock(&self) -> MutexGuard<'_, Inner<C>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify(&self, notices: Vec<Notice>) {
        for notice in notices {
            let event = match &notice {
                Notice::State(from, to) => SubmissionEvent::StateChanged {
                    from: *from,
                    to: *to,
                },
                Notice::Locked(count) => SubmissionEvent::QuestionsLocked { count: *count },
                Notice::Restored(count) => SubmissionEvent::QuestionsRestored { count: *count },
                Notice::Submitted(receipt) => SubmissionEvent::Submitted(receipt),
                Notice::Failed(error) => SubmissionEvent::Failed(error),
            };
            self.observers.on_event(&event);
        }
    }
}

impl<C: SurveyContent> fmt::Debug for SubmissionCoordinator<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionCoordinator")
            .field("identifier", &self.config.identifier)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Clears the in-flight flag when an attempt ends, including when the
/// `submit` future is dropped mid-await. An abandoned attempt re-enables
/// its questions and returns to `idle`.
struct AttemptGuard<'a, C: SurveyContent> {
    coordinator: &'a SubmissionCoordinator<C>,
    generation: u64,
}

impl<C: SurveyContent> Drop for AttemptGuard<'_, C> {
    fn drop(&mut self) {
        let mut notices = Vec::new();
        {
            let mut inner = self.coordinator.lock();
            // Replaced content belongs to whoever submits it next.
            if inner.generation != self.generation {
                return;
            }
            inner.in_flight = false;
            if inner.state == SubmissionState::Processing {
                debug!("submit abandoned while processing");
                inner.restore_questions(&mut notices);
                inner.transition(SubmissionState::Idle, &mut notices);
            }
        }
        self.coordinator.notify(notices);
    }
}

// ── Data-driven surveys ────────────────────────────────────────────

impl SubmissionCoordinator<ResponseModel> {
    /// Coordinator for a survey built from question descriptors.
    pub fn for_questions(config: SurveyConfig, questions: impl IntoIterator<Item = Question>) -> Self {
        Self::new(config, ResponseModel::new(questions))
    }

    pub fn set_vote(&self, id: QuestionId, vote: Vote) -> Result<(), EditError> {
        self.edit(|model| model.set_vote(id, vote))
    }

    pub fn clear_vote(&self, id: QuestionId) -> Result<(), EditError> {
        self.edit(|model| model.clear_vote(id))
    }

    pub fn set_comment(&self, id: QuestionId, text: impl Into<String>) -> Result<(), EditError> {
        self.edit(|model| model.set_comment(id, text))
    }

    /// Replace the questions. Responses are discarded and the state returns
    /// to `idle`.
    pub fn regenerate(&self, questions: impl IntoIterator<Item = Question>) {
        self.replace_content(ResponseModel::new(questions));
    }
}
