//! Events emitted by the [`SubmissionCoordinator`](crate::coordinator::SubmissionCoordinator).
//!
//! The coordinator never touches layout. It reports what happened through
//! [`SubmissionEvent`]s and leaves it to the presentation layer to react,
//! e.g. repositioning the popup when an error message appears or goes away
//! ([`SubmissionEvent::needs_reposition`]).
//!
//! # Choosing an observer
//!
//! | Observer | Use case |
//! |----------|----------|
//! | [`NoopObserver`] | Tests, headless use |
//! | [`LoggingObserver`] | Structured logging via `tracing` |
//! | [`FnObserver`] | Quick closures |
//! | [`CompositeObserver`] | Several observers in order |

use tracing::{debug, info, warn};

use crate::coordinator::{SubmissionReceipt, SubmissionState};
use crate::error::SubmissionError;

/// Something the coordinator did.
#[derive(Debug)]
pub enum SubmissionEvent<'a> {
    /// The submission state changed.
    StateChanged {
        from: SubmissionState,
        to: SubmissionState,
    },
    /// Questions were disabled for the duration of a submit.
    QuestionsLocked { count: usize },
    /// Questions disabled by the coordinator were re-enabled after a failure.
    QuestionsRestored { count: usize },
    /// The service accepted the submission.
    Submitted(&'a SubmissionReceipt),
    /// An attempt ended in the `error` state.
    Failed(&'a SubmissionError),
}

impl SubmissionEvent<'_> {
    /// Whether the popup layout may have changed height.
    ///
    /// True for transitions into or out of `error`, which show or hide the
    /// error message.
    pub fn needs_reposition(&self) -> bool {
        match self {
            SubmissionEvent::StateChanged { from, to } => {
                from != to && (*from == SubmissionState::Error || *to == SubmissionState::Error)
            }
            _ => false,
        }
    }
}

/// Observer of submission events.
pub trait SubmissionObserver: Send + Sync {
    fn on_event(&self, event: &SubmissionEvent<'_>) {
        let _ = event;
    }
}

/// Ignores every event.
pub struct NoopObserver;
impl SubmissionObserver for NoopObserver {}

/// Logs events with `tracing`.
pub struct LoggingObserver;

impl SubmissionObserver for LoggingObserver {
    fn on_event(&self, event: &SubmissionEvent<'_>) {
        match event {
            SubmissionEvent::StateChanged { from, to } => {
                debug!("submission state: {from} -> {to}");
            }
            SubmissionEvent::QuestionsLocked { count } => {
                debug!("disabled {count} question(s) during submit");
            }
            SubmissionEvent::QuestionsRestored { count } => {
                debug!("re-enabled {count} question(s)");
            }
            SubmissionEvent::Submitted(receipt) => {
                info!(
                    "submitted '{}' with {} response(s)",
                    receipt.identifier, receipt.response_count
                );
            }
            SubmissionEvent::Failed(err) => {
                if err.is_validation() {
                    debug!("submission blocked: {err}");
                } else {
                    warn!("submission failed: {err}");
                }
            }
        }
    }
}

/// Observer backed by a closure.
///
/// ```ignore
/// let observer = FnObserver::new(|event| {
///     if event.needs_reposition() {
///         shell.reposition();
///     }
/// });
/// ```
pub struct FnObserver<F>(F)
where
    F: Fn(&SubmissionEvent<'_>) + Send + Sync;

impl<F> FnObserver<F>
where
    F: Fn(&SubmissionEvent<'_>) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> SubmissionObserver for FnObserver<F>
where
    F: Fn(&SubmissionEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &SubmissionEvent<'_>) {
        (self.0)(event)
    }
}

/// Dispatches every event to several observers, in registration order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Box<dyn SubmissionObserver>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: impl SubmissionObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Add `observer` only when `condition` holds.
    pub fn with_if(self, condition: bool, observer: impl SubmissionObserver + 'static) -> Self {
        if condition { self.with(observer) } else { self }
    }
}

impl SubmissionObserver for CompositeObserver {
    fn on_event(&self, event: &SubmissionEvent<'_>) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn changed(from: SubmissionState, to: SubmissionState) -> SubmissionEvent<'static> {
        SubmissionEvent::StateChanged { from, to }
    }

    #[test]
    fn reposition_on_error_edges_only() {
        use SubmissionState::*;
        assert!(changed(Idle, Error).needs_reposition());
        assert!(changed(Error, Processing).needs_reposition());
        assert!(changed(Error, Idle).needs_reposition());
        assert!(changed(Processing, Error).needs_reposition());
        assert!(!changed(Idle, Processing).needs_reposition());
        assert!(!changed(Processing, Submitted).needs_reposition());
        assert!(!SubmissionEvent::QuestionsLocked { count: 1 }.needs_reposition());
    }

    #[test]
    fn composite_dispatches_to_all() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h1 = hits.clone();
        let h2 = hits.clone();
        let observer = CompositeObserver::new()
            .with(FnObserver::new(move |_| {
                h1.fetch_add(1, Ordering::SeqCst);
            }))
            .with(LoggingObserver)
            .with_if(false, NoopObserver)
            .with(FnObserver::new(move |_| {
                h2.fetch_add(10, Ordering::SeqCst);
            }));
        observer.on_event(&changed(SubmissionState::Idle, SubmissionState::Processing));
        assert_eq!(hits.load(Ordering::SeqCst), 11);
    }
}
