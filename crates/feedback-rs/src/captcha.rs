//! CAPTCHA provider abstraction and the cached widget load.
//!
//! A [`CaptchaProvider`] loads a [`CaptchaWidget`]; the widget produces
//! one-time tokens. Loading is slow (a script download in a browser), so
//! [`CaptchaLoader`] starts it once, early, and hands the same in-flight load
//! to every later caller:
//!
//! - [`CaptchaLoader::preload`] kicks the load off in the background (the
//!   survey does this when its popup opens).
//! - [`CaptchaLoader::widget`] waits for it under a time limit.
//!
//! A failed load is evicted so the next attempt starts over. A load that is
//! merely slow stays cached and keeps running after the caller gives up.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use futures::future::Shared;
use tracing::{debug, warn};

use crate::error::CaptchaError;
use crate::timeout::timed;

/// Boxed future returned by CAPTCHA operations.
pub type CaptchaFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CaptchaError>> + Send + 'a>>;

/// A loaded CAPTCHA widget.
pub trait CaptchaWidget: Send + Sync {
    /// Run the challenge and return a one-time token.
    fn execute(&self) -> CaptchaFuture<'_, String>;
}

/// Source of CAPTCHA widgets.
pub trait CaptchaProvider: Send + Sync {
    /// Start loading a widget. The returned future must not borrow the
    /// provider so it can outlive the caller that started it.
    fn load_widget(&self) -> CaptchaFuture<'static, Arc<dyn CaptchaWidget>>;
}

type SharedLoad = Shared<CaptchaFuture<'static, Arc<dyn CaptchaWidget>>>;

/// Caches the widget load of one provider.
pub struct CaptchaLoader {
    provider: Arc<dyn CaptchaProvider>,
    load: Mutex<Option<SharedLoad>>,
}

impl CaptchaLoader {
    pub fn new(provider: Arc<dyn CaptchaProvider>) -> Self {
        Self {
            provider,
            load: Mutex::new(None),
        }
    }

    /// Start loading the widget if no load is cached.
    ///
    /// When called inside a tokio runtime the load is driven by a background
    /// task; otherwise it starts on the first [`widget`](Self::widget) call.
    pub fn preload(&self) {
        let load = self.cached_or_start();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(load.map(|_| ()));
        }
    }

    /// Whether a load is cached (in flight or finished successfully).
    pub fn is_loading_or_loaded(&self) -> bool {
        self.load.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    /// Wait for the widget, giving up after `limit`.
    pub async fn widget(&self, limit: Duration) -> Result<Arc<dyn CaptchaWidget>, CaptchaError> {
        let load = self.cached_or_start();
        match timed(load.clone(), limit).await {
            Ok(Ok(widget)) => Ok(widget),
            Ok(Err(e)) => {
                warn!("CAPTCHA widget load failed: {e}");
                self.evict(&load);
                Err(e)
            }
            Err(_) => {
                warn!("CAPTCHA widget not loaded after {} ms", limit.as_millis());
                Err(CaptchaError::LoadTimeout {
                    after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                })
            }
        }
    }

    fn cached_or_start(&self) -> SharedLoad {
        let mut slot = self.load.lock().unwrap_or_else(|e| e.into_inner());
        slot.get_or_insert_with(|| {
            debug!("loading CAPTCHA widget");
            self.provider.load_widget().shared()
        })
        .clone()
    }

    fn evict(&self, failed: &SharedLoad) {
        let mut slot = self.load.lock().unwrap_or_else(|e| e.into_inner());
        if slot.as_ref().is_some_and(|cached| cached.ptr_eq(failed)) {
            *slot = None;
        }
    }
}

impl std::fmt::Debug for CaptchaLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptchaLoader")
            .field("cached", &self.is_loading_or_loaded())
            .finish_non_exhaustive()
    }
}

// ── Static token ───────────────────────────────────────────────────

/// Provider whose widget always returns the same token.
///
/// For the CLI, demos and tests against a service that accepts a known token.
#[derive(Clone, Debug)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

struct StaticTokenWidget(String);

impl CaptchaWidget for StaticTokenWidget {
    fn execute(&self) -> CaptchaFuture<'_, String> {
        Box::pin(async move { Ok(self.0.clone()) })
    }
}

impl CaptchaProvider for StaticTokenProvider {
    fn load_widget(&self) -> CaptchaFuture<'static, Arc<dyn CaptchaWidget>> {
        let widget: Arc<dyn CaptchaWidget> = Arc::new(StaticTokenWidget(self.token.clone()));
        Box::pin(async move { Ok(widget) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts loads; fails the first `failures` of them, each after `delay`.
    struct FlakyProvider {
        loads: Arc<AtomicUsize>,
        failures: usize,
        delay: Duration,
    }

    impl CaptchaProvider for FlakyProvider {
        fn load_widget(&self) -> CaptchaFuture<'static, Arc<dyn CaptchaWidget>> {
            let n = self.loads.fetch_add(1, Ordering::SeqCst);
            let fail = n < self.failures;
            let delay = self.delay;
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                if fail {
                    Err(CaptchaError::Load("script blocked".into()))
                } else {
                    let widget: Arc<dyn CaptchaWidget> =
                        Arc::new(StaticTokenWidget("boop".into()));
                    Ok(widget)
                }
            })
        }
    }

    fn loader(failures: usize, delay: Duration) -> (CaptchaLoader, Arc<AtomicUsize>) {
        let loads = Arc::new(AtomicUsize::new(0));
        let provider = FlakyProvider {
            loads: loads.clone(),
            failures,
            delay,
        };
        (CaptchaLoader::new(Arc::new(provider)), loads)
    }

    #[tokio::test]
    async fn static_provider_yields_token() {
        let loader = CaptchaLoader::new(Arc::new(StaticTokenProvider::new("boop")));
        let widget = loader.widget(Duration::from_secs(1)).await.unwrap();
        assert_eq!(widget.execute().await.unwrap(), "boop");
    }

    #[tokio::test]
    async fn load_is_shared_between_callers() {
        let (loader, loads) = loader(0, Duration::from_millis(1));
        loader.preload();
        loader.widget(Duration::from_secs(1)).await.unwrap();
        loader.widget(Duration::from_secs(1)).await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_load_is_evicted() {
        let (loader, loads) = loader(1, Duration::ZERO);
        let err = loader.widget(Duration::from_secs(1)).await.err().unwrap();
        assert_eq!(err, CaptchaError::Load("script blocked".into()));
        assert!(!loader.is_loading_or_loaded());

        assert!(loader.widget(Duration::from_secs(1)).await.is_ok());
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_load_stays_cached() {
        let (loader, loads) = loader(0, Duration::from_secs(20));
        let err = loader.widget(Duration::from_secs(8)).await.err().unwrap();
        assert_eq!(err, CaptchaError::LoadTimeout { after_ms: 8000 });
        assert!(loader.is_loading_or_loaded());

        // The retry picks up the same load, which finishes at t=20s.
        assert!(loader.widget(Duration::from_secs(30)).await.is_ok());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }
}
