//! Survey and feature-feedback submission core.
//!
//! `feedback-rs` collects user feedback and sends it to a feedback service.
//! Two flows share one submission pipeline:
//!
//! - **Surveys**: an ordered list of questions (vote, comment, hidden
//!   extra), answered by the user, validated, then sent as one submission.
//! - **Feature feedback**: a single thumbs-up / thumbs-down vote on a named
//!   feature with an optional comment.
//!
//! Every submission is guarded by a CAPTCHA token and raced against a
//! timeout. The core of the crate is the
//! [`SubmissionCoordinator`](coordinator::SubmissionCoordinator), a state
//! machine (`idle → processing → submitted`, with `error` on failure) that
//! validates, locks the questions, fetches a token, submits, and restores
//! the questions if anything goes wrong.
//!
//! # Getting started
//!
//! ```ignore
//! use feedback_rs::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), String> {
//!     let backend = HttpFeedbackService::new(FeedbackClientConfig::new(
//!         "https://feedback.example.com/api/feedback",
//!     ))
//!     .map_err(|e| e.to_string())?;
//!
//!     let survey = SubmissionCoordinator::for_questions(
//!         SurveyConfig::new("search-survey"),
//!         [
//!             Question::vote("Did you find what you were looking for?").required(),
//!             Question::comment("Anything else?"),
//!             Question::extra("page", "/search"),
//!         ],
//!     )
//!     .with_backend(Arc::new(backend))
//!     .with_captcha(Arc::new(StaticTokenProvider::new("dev-token")))
//!     .with_observer(LoggingObserver);
//!
//!     survey.set_vote(QuestionId(0), Vote::Up).map_err(|e| e.to_string())?;
//!     match survey.submit().await.map_err(|e| e.to_string())? {
//!         SubmissionState::Submitted => println!("thanks!"),
//!         _ => println!("{}", survey.error_message().unwrap_or_default()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Where to find things
//!
//! - **Describe questions:** [`Question`](question::Question) builders or
//!   JSON survey definitions. Answers live in a
//!   [`ResponseModel`](response::ResponseModel), or in component-style
//!   [`QuestionSlots`](components::QuestionSlots) when each question owns its
//!   own state.
//! - **Submit:** [`SubmissionCoordinator`](coordinator::SubmissionCoordinator)
//!   for surveys, [`FeatureFeedbackWidget`](feature::FeatureFeedbackWidget)
//!   for single votes.
//! - **Plug in services:** implement
//!   [`FeedbackBackend`](backend::FeedbackBackend) and
//!   [`CaptchaProvider`](captcha::CaptchaProvider), or use
//!   [`HttpFeedbackService`](http::HttpFeedbackService).
//! - **React to progress:** implement
//!   [`SubmissionObserver`](events::SubmissionObserver).
//! - **Host a popup:** [`SurveyWidget`](widget::SurveyWidget) and
//!   [`PopupShell`](shell::PopupShell).
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`question`] | Question descriptors, votes, JSON survey definitions |
//! | [`response`] | Response side table and submission payload |
//! | [`validate`] | Required-answer validation |
//! | [`components`] | Component-style questions with capability traits |
//! | [`content`] | [`SurveyContent`](content::SurveyContent), what a coordinator drives |
//! | [`coordinator`] | Submission state machine |
//! | [`feature`] | Single-vote feature feedback |
//! | [`widget`] | Survey popup widget |
//! | [`shell`] | Popup visibility, positioning, outside-interaction subscriptions |
//! | [`captcha`] | CAPTCHA provider seam and cached widget load |
//! | [`backend`] | Backend seam and submission payloads |
//! | [`http`] | HTTP backend |
//! | [`events`] | Submission observers |
//! | [`timeout`] | Future-vs-timer race |
//! | [`config`] | Configuration structs and defaults |
//! | [`error`] | Error types and user-facing messages |

pub mod backend;
pub mod captcha;
pub mod components;
pub mod config;
pub mod content;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod feature;
pub mod http;
pub mod prelude;
pub mod question;
pub mod response;
pub mod shell;
pub mod timeout;
pub mod validate;
pub mod widget;

#[cfg(test)]
mod testing;

pub use coordinator::{SubmissionCoordinator, SubmissionReceipt, SubmissionState};
pub use error::{CaptchaError, ConfigError, EditError, SubmissionError, TransportError};
pub use question::{Question, QuestionId, Vote};
