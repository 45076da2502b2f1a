//! Test doubles shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::backend::{BackendFuture, FeatureFeedback, FeedbackBackend, SubmitOutcome, SurveySubmission};
use crate::captcha::{CaptchaFuture, CaptchaProvider, CaptchaWidget};
use crate::error::{CaptchaError, TransportError};

/// Records every call, waits `delay`, then answers with `outcome`.
pub struct MockBackend {
    pub surveys: Mutex<Vec<SurveySubmission>>,
    pub feedback: Mutex<Vec<FeatureFeedback>>,
    outcome: Result<SubmitOutcome, TransportError>,
    delay: Duration,
}

impl MockBackend {
    pub fn answering(outcome: Result<SubmitOutcome, TransportError>) -> Arc<Self> {
        Self::slow(outcome, Duration::ZERO)
    }

    pub fn accepting() -> Arc<Self> {
        Self::answering(Ok(SubmitOutcome::Accepted))
    }

    pub fn slow(outcome: Result<SubmitOutcome, TransportError>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            surveys: Mutex::new(Vec::new()),
            feedback: Mutex::new(Vec::new()),
            outcome,
            delay,
        })
    }

    pub fn calls(&self) -> usize {
        self.surveys.lock().unwrap().len() + self.feedback.lock().unwrap().len()
    }

    pub fn last_survey(&self) -> Option<SurveySubmission> {
        self.surveys.lock().unwrap().last().cloned()
    }

    pub fn last_feedback(&self) -> Option<FeatureFeedback> {
        self.feedback.lock().unwrap().last().cloned()
    }
}

impl FeedbackBackend for MockBackend {
    fn submit_feedback(&self, feedback: FeatureFeedback) -> BackendFuture<'_> {
        self.feedback.lock().unwrap().push(feedback);
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            self.outcome.clone()
        })
    }

    fn submit_survey(&self, survey: SurveySubmission) -> BackendFuture<'_> {
        self.surveys.lock().unwrap().push(survey);
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            self.outcome.clone()
        })
    }
}

/// How a [`MockCaptcha`] behaves.
#[derive(Clone, Debug)]
pub enum CaptchaMode {
    Token(&'static str),
    LoadFails,
    ExecuteFails,
    SlowLoad(Duration),
}

/// CAPTCHA provider with scripted behavior that counts loads.
pub struct MockCaptcha {
    mode: CaptchaMode,
    pub loads: AtomicUsize,
}

impl MockCaptcha {
    pub fn new(mode: CaptchaMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            loads: AtomicUsize::new(0),
        })
    }

    pub fn token(token: &'static str) -> Arc<Self> {
        Self::new(CaptchaMode::Token(token))
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

struct MockWidget {
    token: Option<&'static str>,
}

impl CaptchaWidget for MockWidget {
    fn execute(&self) -> CaptchaFuture<'_, String> {
        Box::pin(async move {
            self.token
                .map(str::to_string)
                .ok_or_else(|| CaptchaError::Execute("challenge expired".into()))
        })
    }
}

impl CaptchaProvider for MockCaptcha {
    fn load_widget(&self) -> CaptchaFuture<'static, Arc<dyn CaptchaWidget>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let mode = self.mode.clone();
        Box::pin(async move {
            let token = match mode {
                CaptchaMode::Token(t) => Some(t),
                CaptchaMode::LoadFails => {
                    return Err(CaptchaError::Load("script blocked".into()));
                }
                CaptchaMode::ExecuteFails => None,
                CaptchaMode::SlowLoad(delay) => {
                    tokio::time::sleep(delay).await;
                    Some("boop")
                }
            };
            let widget: Arc<dyn CaptchaWidget> = Arc::new(MockWidget { token });
            Ok(widget)
        })
    }
}
