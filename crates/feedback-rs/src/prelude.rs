//! Convenience re-exports for common `feedback-rs` types.
//!
//! ```ignore
//! use feedback_rs::prelude::*;
//! ```
//!
//! Covers building questions, wiring a coordinator or widget to a backend
//! and CAPTCHA provider, and observing submissions. Geometry types and the
//! component capability traits are left out; import them from
//! [`shell`](crate::shell) and [`components`](crate::components).

// ── Questions and responses ─────────────────────────────────────────
pub use crate::question::{Question, QuestionId, QuestionType, Vote};
pub use crate::response::{QuestionResponse, Response, ResponseModel};

// ── Components ──────────────────────────────────────────────────────
pub use crate::components::{CommentQuestion, ExtraQuestion, QuestionSlots, VoteQuestion};

// ── Submission ──────────────────────────────────────────────────────
pub use crate::config::{FeatureConfig, SurveyConfig, WidgetConfig};
pub use crate::coordinator::{SubmissionCoordinator, SubmissionReceipt, SubmissionState};
pub use crate::feature::FeatureFeedbackWidget;
pub use crate::widget::SurveyWidget;

// ── Services ────────────────────────────────────────────────────────
pub use crate::backend::{FeedbackBackend, SubmitOutcome};
pub use crate::captcha::{CaptchaProvider, CaptchaWidget, StaticTokenProvider};
pub use crate::http::{FeedbackClientConfig, HttpFeedbackService};

// ── Observers ───────────────────────────────────────────────────────
pub use crate::events::{
    CompositeObserver, FnObserver, LoggingObserver, NoopObserver, SubmissionEvent,
    SubmissionObserver,
};

// ── Errors ──────────────────────────────────────────────────────────
pub use crate::error::{CaptchaError, ConfigError, EditError, SubmissionError, TransportError};
