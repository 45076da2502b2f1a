//! Configuration for the submission coordinator and the widgets built on it.
//!
//! Minimal configuration, everything else defaulted:
//!
//! ```ignore
//! let config = SurveyConfig::new("search-survey");
//! ```
//!
//! With overrides:
//!
//! ```ignore
//! let config = SurveyConfig::new("search-survey").with_submit_timeout_ms(3_000);
//! let widget = WidgetConfig::default()
//!     .with_button_text("Tell us!")
//!     .with_question_numbers(true);
//! ```

use std::time::Duration;

/// Time limit applied to each of the CAPTCHA load, the CAPTCHA challenge and
/// the backend call.
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_millis(8000);

/// Label of the button that opens the survey popup.
pub const DEFAULT_BUTTON_TEXT: &str = "Feedback";

/// Submit button label while idle.
pub const SUBMIT_LABEL: &str = "Submit feedback";

/// Submit button label while a submission is in flight.
pub const SUBMITTING_LABEL: &str = "Submitting...";

// ── Survey ─────────────────────────────────────────────────────────

/// What to submit a survey as, and how long to wait.
#[derive(Debug, Clone)]
pub struct SurveyConfig {
    /// Survey identifier sent with every submission. Must be non-empty.
    pub identifier: String,
    /// Default: [`DEFAULT_SUBMIT_TIMEOUT`] (8000 ms).
    pub submit_timeout: Duration,
}

impl SurveyConfig {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
        }
    }

    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    pub fn with_submit_timeout_ms(self, ms: u64) -> Self {
        self.with_submit_timeout(Duration::from_millis(ms))
    }
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self::new("")
    }
}

// ── Feature feedback ───────────────────────────────────────────────

/// Settings for a single-vote feature feedback widget.
#[derive(Debug, Clone)]
pub struct FeatureConfig {
    pub feature_identifier: String,
    pub submit_timeout: Duration,
    /// Prompt shown above the vote buttons.
    pub prompt: String,
}

impl FeatureConfig {
    pub fn new(feature_identifier: impl Into<String>) -> Self {
        Self {
            feature_identifier: feature_identifier.into(),
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
            prompt: "Do you find this feature useful?".to_string(),
        }
    }

    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }
}

// ── Presentation ───────────────────────────────────────────────────

/// Knobs that only affect how the survey widget renders.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    /// Default: `"Feedback"`.
    pub button_text: String,
    /// Show a thumbs icon on the open button. Default: `true`.
    pub show_thumbs: bool,
    /// Prefix visible questions with their number. Default: `false`.
    pub show_question_numbers: bool,
    /// A disabled widget refuses to open. Default: `false`.
    pub disabled: bool,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            button_text: DEFAULT_BUTTON_TEXT.to_string(),
            show_thumbs: true,
            show_question_numbers: false,
            disabled: false,
        }
    }
}

impl WidgetConfig {
    pub fn with_button_text(mut self, text: impl Into<String>) -> Self {
        self.button_text = text.into();
        self
    }

    pub fn with_thumbs(mut self, show: bool) -> Self {
        self.show_thumbs = show;
        self
    }

    pub fn with_question_numbers(mut self, show: bool) -> Self {
        self.show_question_numbers = show;
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}
