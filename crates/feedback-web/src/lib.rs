//! Development stub of the feedback service.
//!
//! `feedback-web` serves the one endpoint the `feedback-rs` HTTP backend
//! talks to, records every submission it receives, and can be told to
//! misbehave so widgets can be exercised against slow, rejecting or broken
//! services.
//!
//! # Quick start
//!
//! ```ignore
//! use feedback_web::{StubConfig, spawn_stub};
//!
//! let (addr, log) = spawn_stub(StubConfig::default()).await?;
//! println!("service: http://{addr}/api/feedback");
//!
//! // ... point an HttpFeedbackService at it and submit ...
//! assert_eq!(log.len(), 1);
//! ```
//!
//! # Endpoints
//!
//! | Route                  | Description                                     |
//! |------------------------|-------------------------------------------------|
//! | `GET /api/feedback`    | Feature feedback or survey, in the query string |
//! | `GET /api/submissions` | Everything recorded so far, oldest first        |
//!
//! `/api/feedback` answers with the service's JSON result shape:
//!
//! ```text
//! {"success": true, "value": true}
//! {"success": false, "error": {"message": "invalid CAPTCHA token"}}
//! ```

mod api;
mod server;

pub use api::{INVALID_TOKEN_MESSAGE, RecordedSubmission, SubmissionLog};
pub use server::build_router;

use std::net::SocketAddr;
use std::time::Duration;

/// How the stub answers valid submissions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StubMode {
    /// Record and accept.
    #[default]
    Accept,
    /// Record, then answer `success: false` with `message`.
    Reject { message: String },
    /// Answer with a bare HTTP error status. Nothing is recorded.
    Fail { status: u16 },
}

/// Configuration for the stub server.
#[derive(Debug, Clone)]
pub struct StubConfig {
    /// Address to bind to. Default: `127.0.0.1:3002`.
    pub bind_addr: SocketAddr,
    /// Default: [`StubMode::Accept`].
    pub mode: StubMode,
    /// Reject submissions carrying any other CAPTCHA token. Default: `None`
    /// (any token is accepted).
    pub required_token: Option<String>,
    /// Wait this long before answering. Default: zero.
    pub delay: Duration,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3002)),
            mode: StubMode::Accept,
            required_token: None,
            delay: Duration::ZERO,
        }
    }
}

impl StubConfig {
    pub fn with_bind_addr(mut self, addr: impl Into<SocketAddr>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    pub fn with_mode(mut self, mode: StubMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_required_token(mut self, token: impl Into<String>) -> Self {
        self.required_token = Some(token.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Spawn the stub server on a Tokio task.
///
/// Returns the bound address and the log the server records submissions
/// into. The server runs until the Tokio runtime shuts down.
pub async fn spawn_stub(config: StubConfig) -> std::io::Result<(SocketAddr, SubmissionLog)> {
    let log = SubmissionLog::default();
    let router = server::build_router(config.clone(), log.clone());
    let addr = server::start_server(router, config.bind_addr).await?;
    Ok((addr, log))
}
