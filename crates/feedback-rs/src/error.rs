//! Error types.
//!
//! Two families, handled differently by the coordinator:
//!
//! - [`ConfigError`] means the embedding application wired the widget up
//!   wrong (no identifier, no backend, no CAPTCHA provider). It is returned
//!   from `submit()` as an `Err` and never shown to the end user.
//! - [`SubmissionError`] covers everything the user can recover from. It is
//!   caught at the coordinator boundary and stored alongside the `error`
//!   submission state; [`SubmissionError::message`] is the text to display.

use thiserror::Error;

use crate::question::QuestionId;
use crate::timeout::TimeoutError;

/// Shown when required questions are unanswered.
pub const MESSAGE_MISSING_REQUIRED_INPUT: &str = "Please respond to the indicated questions.";

/// Shown when a feature-feedback submit is attempted without a vote.
pub const MESSAGE_MISSING_VOTE: &str = "Please select a vote.";

/// Shown when submission fails for any reason other than validation.
pub const MESSAGE_SUBMIT_REQUEST_FAILED: &str = "There was an error submitting your feedback.";

/// Misuse by the embedding application.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("an identifier is required")]
    MissingIdentifier,
    #[error("a feedback backend is required")]
    MissingBackend,
    #[error("a CAPTCHA provider is required")]
    MissingCaptcha,
}

/// Failures from the CAPTCHA provider or widget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptchaError {
    /// The provider reported an error while loading the widget.
    #[error("CAPTCHA widget load failed: {0}")]
    Load(String),
    /// The widget did not finish loading within the time limit.
    #[error("CAPTCHA widget load timed out after {after_ms} ms")]
    LoadTimeout { after_ms: u64 },
    /// The widget failed to produce a token.
    #[error("CAPTCHA challenge failed: {0}")]
    Execute(String),
}

/// A transport-level fault talking to the feedback service (connection
/// failure, non-2xx status, unreadable body).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }
}

/// A recoverable submission failure, surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// Required questions have no response.
    #[error("{}", MESSAGE_MISSING_REQUIRED_INPUT)]
    MissingRequiredInput { failing: Vec<QuestionId> },
    /// Feature feedback submitted without a vote.
    #[error("{}", MESSAGE_MISSING_VOTE)]
    MissingVote,
    /// The backend answered with a structured failure.
    #[error("feedback service rejected the submission{}", reason_suffix(.reason))]
    Rejected { reason: Option<String> },
    #[error(transparent)]
    Captcha(#[from] CaptchaError),
    #[error(transparent)]
    Timeout(#[from] TimeoutError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default()
}

impl SubmissionError {
    /// User-facing message for this error.
    ///
    /// Validation errors use their fixed text. A backend rejection uses the
    /// generic failure text. Everything else appends the failure detail on a
    /// second line.
    pub fn message(&self) -> String {
        match self {
            Self::MissingRequiredInput { .. } => MESSAGE_MISSING_REQUIRED_INPUT.to_string(),
            Self::MissingVote => MESSAGE_MISSING_VOTE.to_string(),
            Self::Rejected { .. } => MESSAGE_SUBMIT_REQUEST_FAILED.to_string(),
            Self::Captcha(e) => format!("{MESSAGE_SUBMIT_REQUEST_FAILED}\nError: {e}"),
            Self::Timeout(e) => format!("{MESSAGE_SUBMIT_REQUEST_FAILED}\nError: {e}"),
            Self::Transport(e) => format!("{MESSAGE_SUBMIT_REQUEST_FAILED}\nError: {e}"),
        }
    }

    /// Whether this is a validation failure (user must fix their input).
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::MissingRequiredInput { .. } | Self::MissingVote)
    }

    /// Questions to highlight as invalid, if any.
    pub fn failing_questions(&self) -> &[QuestionId] {
        match self {
            Self::MissingRequiredInput { failing } => failing,
            _ => &[],
        }
    }
}

/// A rejected edit to a survey response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("no question at position {}", .0.index())]
    UnknownQuestion(QuestionId),
    #[error("question {0} does not take a vote")]
    NotVotable(QuestionId),
    #[error("question {0} does not take a comment")]
    NotCommentable(QuestionId),
    #[error("question {0} is disabled")]
    Disabled(QuestionId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn validation_messages_are_fixed() {
        let err = SubmissionError::MissingRequiredInput {
            failing: vec![QuestionId(0)],
        };
        assert_eq!(err.message(), MESSAGE_MISSING_REQUIRED_INPUT);
        assert!(err.is_validation());
        assert_eq!(err.failing_questions(), &[QuestionId(0)]);
        assert_eq!(SubmissionError::MissingVote.message(), MESSAGE_MISSING_VOTE);
    }

    #[test]
    fn rejection_uses_generic_message() {
        let err = SubmissionError::Rejected {
            reason: Some("quota exceeded".into()),
        };
        assert_eq!(err.message(), MESSAGE_SUBMIT_REQUEST_FAILED);
        assert_eq!(
            err.to_string(),
            "feedback service rejected the submission: quota exceeded"
        );
        assert!(!err.is_validation());
        assert!(err.failing_questions().is_empty());
    }

    #[test]
    fn transport_and_timeout_append_detail() {
        let err = SubmissionError::from(TransportError::new("connection refused"));
        assert_eq!(
            err.message(),
            "There was an error submitting your feedback.\nError: connection refused"
        );

        let err = SubmissionError::from(TimeoutError::new(Duration::from_millis(10)));
        assert!(err.message().ends_with("Error: Operation timed out"));
    }

    #[test]
    fn captcha_errors_distinguish_timeout_from_failure() {
        let load = CaptchaError::Load("script blocked".into());
        let timeout = CaptchaError::LoadTimeout { after_ms: 8000 };
        assert_ne!(load.to_string(), timeout.to_string());
        assert!(
            SubmissionError::from(timeout)
                .message()
                .contains("timed out after 8000 ms")
        );
    }

    #[test]
    fn edit_error_display() {
        assert_eq!(
            EditError::UnknownQuestion(QuestionId(7)).to_string(),
            "no question at position 7"
        );
        assert_eq!(
            EditError::Disabled(QuestionId(1)).to_string(),
            "question #1 is disabled"
        );
    }
}
