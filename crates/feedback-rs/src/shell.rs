//! Headless presentation shell for the survey popup.
//!
//! [`PopupShell`] owns what the popup needs that is not business logic:
//! whether it is open, where it sits relative to its anchor button, and the
//! page-level listeners (escape key, scroll, resize) it needs while open.
//!
//! Those listeners live behind an injected [`OutsideInteractionObserver`].
//! Subscribing hands back a [`Subscription`] guard that unsubscribes when
//! dropped, and the shell holds that guard only while the popup is open, so
//! closing the popup or dropping the shell always releases its listeners.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::coordinator::SubmissionState;
use crate::events::SubmissionEvent;

/// Horizontal overlap between the anchor and the popup.
pub const POPUP_OFFSET_X: f64 = 20.0;

/// Vertical overlap between the anchor and the popup.
pub const POPUP_OFFSET_Y: f64 = 10.0;

/// Minimum distance kept between the popup and the viewport edges.
pub const VIEWPORT_BUFFER: f64 = 5.0;

// ── Geometry ───────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned box in viewport coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Measurements needed to place the popup.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PopupLayout {
    /// The button the popup opens from.
    pub anchor: Rect,
    pub popup: Size,
    pub viewport: Size,
}

/// Top-left corner for the popup.
///
/// The popup grows away from the nearest viewport edge: an anchor on the
/// left half gets a popup extending right, one on the top half a popup
/// extending down. The result is then pulled back inside the viewport,
/// keeping [`VIEWPORT_BUFFER`] from the edges where the popup fits.
pub fn position_popup(anchor: Rect, popup: Size, viewport: Size) -> Point {
    let mut x = if anchor.left < viewport.width / 2.0 {
        anchor.right() - POPUP_OFFSET_X
    } else {
        anchor.left + POPUP_OFFSET_X - popup.width
    };
    if x + popup.width > viewport.width {
        x = viewport.width - popup.width - VIEWPORT_BUFFER;
    }

    let mut y = if anchor.top < viewport.height / 2.0 {
        anchor.bottom() - POPUP_OFFSET_Y
    } else {
        anchor.top + POPUP_OFFSET_Y - popup.height
    };
    if y + popup.height > viewport.height {
        y = viewport.height - popup.height - VIEWPORT_BUFFER;
    }

    Point {
        x: x.max(VIEWPORT_BUFFER),
        y: y.max(VIEWPORT_BUFFER),
    }
}

// ── Outside interactions ───────────────────────────────────────────

/// Page-level input the open popup reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutsideInteraction {
    /// Escape key: close as if cancelled.
    Escape,
    /// The page scrolled: reposition.
    Scroll,
    /// The viewport or anchor resized: reposition.
    Resize,
}

pub type InteractionCallback = Arc<dyn Fn(OutsideInteraction) + Send + Sync>;

/// Source of outside interactions, e.g. document listeners in a browser
/// host or a terminal's resize signal.
pub trait OutsideInteractionObserver: Send + Sync {
    /// Deliver interactions to `callback` until the returned guard is dropped.
    fn subscribe(&self, callback: InteractionCallback) -> Subscription;
}

/// Unsubscribes when dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// A subscription with nothing to release.
    pub fn empty() -> Self {
        Self { unsubscribe: None }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

type Subscribers = Mutex<HashMap<u64, InteractionCallback>>;

/// In-process [`OutsideInteractionObserver`]: hosts push interactions in
/// with [`emit`](Self::emit).
#[derive(Clone, Default)]
pub struct InteractionHub {
    subscribers: Arc<Subscribers>,
    next_id: Arc<AtomicU64>,
}

impl InteractionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `interaction` to every current subscriber.
    pub fn emit(&self, interaction: OutsideInteraction) {
        // Callbacks may unsubscribe, so call them outside the lock.
        let callbacks: Vec<InteractionCallback> = self
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        for callback in callbacks {
            callback(interaction);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl OutsideInteractionObserver for InteractionHub {
    fn subscribe(&self, callback: InteractionCallback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, callback);
        let subscribers = Arc::downgrade(&self.subscribers);
        Subscription::new(move || {
            if let Some(subscribers) = subscribers.upgrade() {
                subscribers
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .remove(&id);
            }
        })
    }
}

impl fmt::Debug for InteractionHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionHub")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

// ── Shell ──────────────────────────────────────────────────────────

/// Visibility, placement and listener lifetime of the survey popup.
#[derive(Default)]
pub struct PopupShell {
    is_open: bool,
    disabled: bool,
    layout: PopupLayout,
    origin: Option<Point>,
    observer: Option<Arc<dyn OutsideInteractionObserver>>,
    subscription: Option<Subscription>,
    /// Whether the popup was open when the last attempt entered `processing`.
    open_when_processing: bool,
}

impl PopupShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(mut self, observer: Arc<dyn OutsideInteractionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// A disabled shell refuses to open. Does not close an open popup.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Where the popup was last placed, while open.
    pub fn origin(&self) -> Option<Point> {
        self.origin
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Record new measurements, repositioning an open popup.
    pub fn set_layout(&mut self, layout: PopupLayout) {
        self.layout = layout;
        if self.is_open {
            self.reposition();
        }
    }

    /// Record new measurements without moving the popup. It moves on the
    /// next [`reposition`](Self::reposition).
    pub fn update_measurements(&mut self, layout: PopupLayout) {
        self.layout = layout;
    }

    /// Open the popup and subscribe to outside interactions.
    ///
    /// Refused (returns `false`) when disabled or once the survey has been
    /// submitted. Opening an open popup only repositions it.
    pub fn open(&mut self, state: SubmissionState, on_interaction: InteractionCallback) -> bool {
        if self.disabled || state == SubmissionState::Submitted {
            debug!("popup open refused: disabled={}, state={state}", self.disabled);
            return false;
        }
        if self.subscription.is_none() {
            self.subscription = Some(match &self.observer {
                Some(observer) => observer.subscribe(on_interaction),
                None => Subscription::empty(),
            });
        }
        self.is_open = true;
        self.reposition();
        true
    }

    /// Close the popup and release its listeners.
    pub fn close(&mut self) {
        self.subscription = None;
        self.is_open = false;
        self.origin = None;
    }

    /// Recompute the popup origin from the current layout.
    pub fn reposition(&mut self) {
        if self.is_open {
            let PopupLayout {
                anchor,
                popup,
                viewport,
            } = self.layout;
            self.origin = Some(position_popup(anchor, popup, viewport));
        }
    }

    /// Whether the popup was open when the most recent attempt entered
    /// `processing`. An accepted submission closes the popup only then.
    pub fn was_open_when_processing(&self) -> bool {
        self.open_when_processing
    }

    /// React to a coordinator event. Returns `true` if the popup moved.
    pub fn on_submission_event(&mut self, event: &SubmissionEvent<'_>) -> bool {
        if let SubmissionEvent::StateChanged {
            to: SubmissionState::Processing,
            ..
        } = event
        {
            self.open_when_processing = self.is_open;
        }
        if self.is_open && event.needs_reposition() {
            self.reposition();
            return true;
        }
        false
    }
}

impl fmt::Debug for PopupShell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopupShell")
            .field("is_open", &self.is_open)
            .field("disabled", &self.disabled)
            .field("origin", &self.origin)
            .field("subscribed", &self.subscription.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    const VIEWPORT: Size = Size {
        width: 1000.0,
        height: 800.0,
    };

    fn noop() -> InteractionCallback {
        Arc::new(|_: OutsideInteraction| {})
    }

    #[test]
    fn top_left_anchor_opens_down_right() {
        let anchor = Rect::new(100.0, 50.0, 80.0, 30.0);
        let origin = position_popup(anchor, Size::new(300.0, 400.0), VIEWPORT);
        assert_eq!(origin, Point { x: 160.0, y: 70.0 });
    }

    #[test]
    fn bottom_right_anchor_opens_up_left() {
        let anchor = Rect::new(800.0, 700.0, 80.0, 30.0);
        let origin = position_popup(anchor, Size::new(300.0, 400.0), VIEWPORT);
        assert_eq!(origin, Point { x: 520.0, y: 310.0 });
    }

    #[test]
    fn clamps_into_viewport() {
        // Left half, but too wide to extend right.
        let anchor = Rect::new(400.0, 50.0, 80.0, 30.0);
        let origin = position_popup(anchor, Size::new(600.0, 400.0), VIEWPORT);
        assert_eq!(origin.x, 1000.0 - 600.0 - VIEWPORT_BUFFER);

        // Popup taller than the viewport pins to the top buffer.
        let origin = position_popup(anchor, Size::new(100.0, 900.0), VIEWPORT);
        assert_eq!(origin.y, VIEWPORT_BUFFER);
    }

    #[test]
    fn open_refused_when_disabled_or_submitted() {
        let mut shell = PopupShell::new();
        assert!(!shell.open(SubmissionState::Submitted, noop()));
        assert!(!shell.is_open());

        shell.set_disabled(true);
        assert!(!shell.open(SubmissionState::Idle, noop()));

        shell.set_disabled(false);
        assert!(shell.open(SubmissionState::Error, noop()));
        assert!(shell.is_open());
    }

    #[test]
    fn close_drops_subscription() {
        let hub = InteractionHub::new();
        let mut shell = PopupShell::new().with_observer(Arc::new(hub.clone()));

        assert!(shell.open(SubmissionState::Idle, noop()));
        assert_eq!(hub.subscriber_count(), 1);

        // Re-opening does not subscribe twice.
        shell.open(SubmissionState::Idle, noop());
        assert_eq!(hub.subscriber_count(), 1);

        shell.close();
        assert_eq!(hub.subscriber_count(), 0);
        assert!(shell.origin().is_none());
    }

    #[test]
    fn dropping_shell_unsubscribes() {
        let hub = InteractionHub::new();
        {
            let mut shell = PopupShell::new().with_observer(Arc::new(hub.clone()));
            shell.open(SubmissionState::Idle, noop());
            assert_eq!(hub.subscriber_count(), 1);
        }
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn hub_delivers_until_unsubscribed() {
        let hub = InteractionHub::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let sub = hub.subscribe(Arc::new(move |i: OutsideInteraction| {
            assert_eq!(i, OutsideInteraction::Scroll);
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        hub.emit(OutsideInteraction::Scroll);
        drop(sub);
        hub.emit(OutsideInteraction::Scroll);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn repositions_on_error_edges_while_open() {
        let mut shell = PopupShell::new();
        let layout = PopupLayout {
            anchor: Rect::new(100.0, 50.0, 80.0, 30.0),
            popup: Size::new(300.0, 200.0),
            viewport: VIEWPORT,
        };
        shell.set_layout(layout);
        shell.open(SubmissionState::Idle, noop());
        assert_eq!(shell.origin(), Some(Point { x: 160.0, y: 70.0 }));

        // A shorter viewport pulls the open popup up.
        shell.set_layout(PopupLayout {
            viewport: Size::new(1000.0, 250.0),
            ..layout
        });
        assert_eq!(shell.origin(), Some(Point { x: 160.0, y: 45.0 }));

        let moved = shell.on_submission_event(&SubmissionEvent::StateChanged {
            from: SubmissionState::Idle,
            to: SubmissionState::Error,
        });
        assert!(moved);
        let unmoved = shell.on_submission_event(&SubmissionEvent::StateChanged {
            from: SubmissionState::Idle,
            to: SubmissionState::Processing,
        });
        assert!(!unmoved);
    }

    #[test]
    fn remembers_visibility_when_processing_starts() {
        let processing = SubmissionEvent::StateChanged {
            from: SubmissionState::Idle,
            to: SubmissionState::Processing,
        };
        let mut shell = PopupShell::new();
        shell.on_submission_event(&processing);
        assert!(!shell.was_open_when_processing());

        // Opening later does not change what was recorded.
        shell.open(SubmissionState::Processing, noop());
        assert!(!shell.was_open_when_processing());

        shell.on_submission_event(&processing);
        assert!(shell.was_open_when_processing());
    }
}
