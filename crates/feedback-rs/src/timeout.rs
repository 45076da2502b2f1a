//! Race a future against a timer.
//!
//! [`timed`] wraps [`tokio::time::timeout`] with a distinguishable
//! [`TimeoutError`] carrying a message. The inner future is polled before
//! the timer is checked, so a future that is already complete resolves
//! even with a zero time limit.
//!
//! A time-out does not cancel whatever work the inner future was driving on
//! someone else's behalf. The future itself is dropped, but if it is a clone
//! of a shared future (as the cached CAPTCHA load is), the shared work keeps
//! running and later callers can still pick up its result.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Message used when no custom time-out message is given.
pub const DEFAULT_TIMEOUT_MESSAGE: &str = "Operation timed out";

/// The timer won the race.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TimeoutError {
    pub message: String,
    pub limit: Duration,
}

impl TimeoutError {
    /// A time-out error with the default message.
    pub fn new(limit: Duration) -> Self {
        Self::with_message(limit, DEFAULT_TIMEOUT_MESSAGE)
    }

    pub fn with_message(limit: Duration, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            limit,
        }
    }
}

/// Await `future`, failing with [`TimeoutError`] if it takes longer than `limit`.
pub async fn timed<F>(future: F, limit: Duration) -> Result<F::Output, TimeoutError>
where
    F: Future,
{
    timed_with_message(future, limit, DEFAULT_TIMEOUT_MESSAGE).await
}

/// Like [`timed`], with a custom message on the time-out error.
pub async fn timed_with_message<F>(
    future: F,
    limit: Duration,
    message: &str,
) -> Result<F::Output, TimeoutError>
where
    F: Future,
{
    match tokio::time::timeout(limit, future).await {
        Ok(value) => Ok(value),
        Err(_) => {
            debug!("timed out after {} ms: {message}", limit.as_millis());
            Err(TimeoutError::with_message(limit, message))
        }
    }
}
