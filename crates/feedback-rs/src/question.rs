//! Question descriptors supplied by the embedding application.
//!
//! A [`Question`] is immutable once built. Its [`QuestionKind`] is a tagged
//! union so each kind carries only the fields that mean something for it:
//! vote questions may allow an optional comment, comment questions always
//! have a text box, and extra questions carry a static string that rides
//! along with the submission.
//!
//! Questions can also be loaded from JSON using the same field names the
//! browser widgets accept (`questionText`, `type`, `required`, ...):
//!
//! ```
//! use feedback_rs::question::{Question, QuestionType};
//!
//! let q: Question = serde_json::from_str(
//!     r#"{"questionText": "Was this useful?", "type": "vote", "required": true}"#,
//! ).unwrap();
//! assert_eq!(q.question_type(), QuestionType::Vote);
//! assert!(q.is_required());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default comment box height in pixels.
pub const DEFAULT_COMMENT_HEIGHT: u32 = 50;

/// Placeholder shown in a required comment box with no explicit placeholder.
pub const PLACEHOLDER_REQUIRED: &str = "Comments";

/// Placeholder shown in an optional comment box with no explicit placeholder.
pub const PLACEHOLDER_OPTIONAL: &str = "Comments (optional)";

// ── Vote ───────────────────────────────────────────────────────────

/// A thumbs up / thumbs down rating.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Up,
    Down,
}

impl Vote {
    /// Wire representation (`"up"` / `"down"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Vote::Up => "up",
            Vote::Down => "down",
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vote {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Vote::Up),
            "down" => Ok(Vote::Down),
            other => Err(format!("invalid vote '{other}' (expected 'up' or 'down')")),
        }
    }
}

// ── Identity ───────────────────────────────────────────────────────

/// Identity of a question within a survey: its position in the ordered list.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct QuestionId(pub usize);

impl QuestionId {
    /// Parse the positional data attribute UI events carry (e.g. `"2"`).
    ///
    /// Returns `None` for anything that is not a non-negative integer.
    pub fn from_data_attr(attr: &str) -> Option<Self> {
        attr.trim().parse::<usize>().ok().map(QuestionId)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ── Presentation hints ─────────────────────────────────────────────

/// Directions a comment box may be resized in.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CommentResize {
    #[default]
    None,
    Vertical,
    Horizontal,
    Both,
}

/// Rendering hints for a comment box. Not used by validation or submission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommentHints {
    pub placeholder: Option<String>,
    pub height: Option<u32>,
    pub resize: CommentResize,
}

impl CommentHints {
    /// Effective box height in pixels.
    pub fn height_px(&self) -> u32 {
        self.height.unwrap_or(DEFAULT_COMMENT_HEIGHT)
    }
}

// ── Question ───────────────────────────────────────────────────────

/// Discriminant of a [`QuestionKind`], as written in survey definitions.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Vote,
    Comment,
    Extra,
}

/// What kind of answer a question collects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuestionKind {
    /// Up/down vote, optionally with a free-text comment.
    Vote {
        allow_comments: bool,
        comment: CommentHints,
    },
    /// Free-text comment only.
    Comment { comment: CommentHints },
    /// Not shown to the user. `extra_info` is submitted as the comment.
    Extra { extra_info: Option<String> },
}

/// A single item in a survey.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(from = "QuestionDef", into = "QuestionDef")]
pub struct Question {
    text: String,
    required: bool,
    kind: QuestionKind,
}

impl Question {
    /// An optional up/down vote question without a comment box.
    pub fn vote(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            required: false,
            kind: QuestionKind::Vote {
                allow_comments: false,
                comment: CommentHints::default(),
            },
        }
    }

    /// An optional comment-only question.
    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            required: false,
            kind: QuestionKind::Comment {
                comment: CommentHints::default(),
            },
        }
    }

    /// A hidden question whose static text is submitted under `name`.
    pub fn extra(name: impl Into<String>, extra_info: impl Into<String>) -> Self {
        Self {
            text: name.into(),
            required: false,
            kind: QuestionKind::Extra {
                extra_info: Some(extra_info.into()),
            },
        }
    }

    /// Mark this question as requiring a response. Ignored for extras.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Show a comment box on a vote question. No-op for other kinds.
    pub fn with_comments(mut self) -> Self {
        if let QuestionKind::Vote { allow_comments, .. } = &mut self.kind {
            *allow_comments = true;
        }
        self
    }

    /// Set the comment box placeholder.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        if let Some(hints) = self.hints_mut() {
            hints.placeholder = Some(placeholder.into());
        }
        self
    }

    /// Set the comment box height in pixels.
    pub fn with_comment_height(mut self, height: u32) -> Self {
        if let Some(hints) = self.hints_mut() {
            hints.height = Some(height);
        }
        self
    }

    /// Set which directions the comment box may be resized in.
    pub fn with_comment_resize(mut self, resize: CommentResize) -> Self {
        if let Some(hints) = self.hints_mut() {
            hints.resize = resize;
        }
        self
    }

    /// Prompt text. Also used as the `name` of the submitted response.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> &QuestionKind {
        &self.kind
    }

    pub fn question_type(&self) -> QuestionType {
        match self.kind {
            QuestionKind::Vote { .. } => QuestionType::Vote,
            QuestionKind::Comment { .. } => QuestionType::Comment,
            QuestionKind::Extra { .. } => QuestionType::Extra,
        }
    }

    /// Whether a response is required. Always `false` for extras.
    pub fn is_required(&self) -> bool {
        self.required && !matches!(self.kind, QuestionKind::Extra { .. })
    }

    /// Whether the user can type a comment for this question.
    pub fn accepts_comment(&self) -> bool {
        match self.kind {
            QuestionKind::Vote { allow_comments, .. } => allow_comments,
            QuestionKind::Comment { .. } => true,
            QuestionKind::Extra { .. } => false,
        }
    }

    /// Static text for extra questions.
    pub fn extra_info(&self) -> Option<&str> {
        match &self.kind {
            QuestionKind::Extra { extra_info } => extra_info.as_deref(),
            _ => None,
        }
    }

    /// Comment box hints, if this question renders a comment box.
    pub fn comment_hints(&self) -> Option<&CommentHints> {
        match &self.kind {
            QuestionKind::Vote {
                allow_comments: true,
                comment,
            } => Some(comment),
            QuestionKind::Comment { comment } => Some(comment),
            _ => None,
        }
    }

    /// Placeholder to display in the comment box, falling back to the
    /// required/optional default.
    pub fn placeholder(&self) -> Option<&str> {
        let hints = self.comment_hints()?;
        Some(match &hints.placeholder {
            Some(p) => p.as_str(),
            // Comments on a vote question are optional even when the vote is required.
            None if self.is_required() && self.question_type() == QuestionType::Comment => {
                PLACEHOLDER_REQUIRED
            }
            None => PLACEHOLDER_OPTIONAL,
        })
    }

    fn hints_mut(&mut self) -> Option<&mut CommentHints> {
        match &mut self.kind {
            QuestionKind::Vote { comment, .. } | QuestionKind::Comment { comment } => Some(comment),
            QuestionKind::Extra { .. } => None,
        }
    }
}

// ── JSON shape ─────────────────────────────────────────────────────

/// Flat survey-definition shape shared with the browser widgets.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
struct QuestionDef {
    question_text: String,
    #[serde(rename = "type")]
    question_type: QuestionType,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    required: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    allow_comments: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment_placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment_height: Option<u32>,
    #[serde(default)]
    comment_resize: CommentResize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    extra_info: Option<String>,
}

impl From<QuestionDef> for Question {
    fn from(def: QuestionDef) -> Self {
        let hints = CommentHints {
            placeholder: def.comment_placeholder,
            height: def.comment_height,
            resize: def.comment_resize,
        };
        let kind = match def.question_type {
            QuestionType::Vote => QuestionKind::Vote {
                allow_comments: def.allow_comments,
                comment: hints,
            },
            QuestionType::Comment => QuestionKind::Comment { comment: hints },
            QuestionType::Extra => QuestionKind::Extra {
                extra_info: def.extra_info,
            },
        };
        Question {
            text: def.question_text,
            required: def.required,
            kind,
        }
    }
}

impl From<Question> for QuestionDef {
    fn from(q: Question) -> Self {
        let question_type = q.question_type();
        let (allow_comments, hints, extra_info) = match q.kind {
            QuestionKind::Vote {
                allow_comments,
                comment,
            } => (allow_comments, comment, None),
            QuestionKind::Comment { comment } => (true, comment, None),
            QuestionKind::Extra { extra_info } => (false, CommentHints::default(), extra_info),
        };
        QuestionDef {
            question_text: q.text,
            question_type,
            required: q.required,
            allow_comments,
            comment_placeholder: hints.placeholder,
            comment_height: hints.height,
            comment_resize: hints.resize,
            extra_info,
        }
    }
}
