//! Page-wide custom events.
//!
//! Components publish and subscribe without knowing about each other. A
//! subscription stays active until its `Subscription` handle is dropped, so
//! tying the handle to a component's lifetime is enough to unsubscribe.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::Serialize;

use crate::breakpoint::Breakpoint;

/// Events exchanged between loosely coupled components.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ThemeEvent {
    /// The viewport crossed a breakpoint.
    BreakpointChanged { breakpoint: Breakpoint },
    /// Request to open the cart drawer.
    CartDrawerOpen,
    /// Request to close the cart drawer.
    CartDrawerClose,
    /// Request to refresh cart contents.
    CartRefresh,
    /// A cart operation failed; `message` is display-ready.
    CartError {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        source_id: Option<String>,
    },
    /// Facet filters were applied.
    FiltersUpdated { search_params: String },
    /// More results were appended by pagination.
    ResultsAppended { count: usize },
    /// The page was restored from the back/forward cache.
    RestoredFromCache,
    /// Request to close the quick-add overlay.
    QuickAddClose,
}

impl ThemeEvent {
    /// Event name as it would appear on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            ThemeEvent::BreakpointChanged { .. } => "breakpoint-changed",
            ThemeEvent::CartDrawerOpen => "cart-drawer-open",
            ThemeEvent::CartDrawerClose => "cart-drawer-close",
            ThemeEvent::CartRefresh => "cart-refresh",
            ThemeEvent::CartError { .. } => "cart-error",
            ThemeEvent::FiltersUpdated { .. } => "filters-updated",
            ThemeEvent::ResultsAppended { .. } => "results-appended",
            ThemeEvent::RestoredFromCache => "restored-from-cache",
            ThemeEvent::QuickAddClose => "quick-add-close",
        }
    }
}

type Handler = Rc<dyn Fn(&ThemeEvent)>;

#[derive(Default)]
struct BusInner {
    next_id: u64,
    handlers: Vec<(u64, Handler)>,
}

/// Process-wide publish/subscribe channel.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler.
    pub fn subscribe(&self, handler: impl Fn(&ThemeEvent) + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.handlers.push((id, Rc::new(handler)));
        Subscription {
            id,
            bus: Rc::downgrade(&self.inner),
        }
    }

    /// Deliver an event to every current subscriber.
    ///
    /// Handlers may publish or subscribe re-entrantly; the handler list is
    /// snapshotted before delivery.
    pub fn publish(&self, event: ThemeEvent) {
        let handlers: Vec<Handler> = self
            .inner
            .borrow()
            .handlers
            .iter()
            .map(|(_, h)| Rc::clone(h))
            .collect();
        for handler in handlers {
            handler(&event);
        }
    }

    /// Subscribe a recorder that stores every event it sees.
    pub fn record(&self) -> (Subscription, Rc<RefCell<Vec<ThemeEvent>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let sub = self.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        (sub, log)
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().handlers.len()
    }
}

/// Handle that keeps a subscription alive.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    bus: Weak<RefCell<BusInner>>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            if let Ok(mut inner) = bus.try_borrow_mut() {
                inner.handlers.retain(|(id, _)| *id != self.id);
            }
        }
    }
}
