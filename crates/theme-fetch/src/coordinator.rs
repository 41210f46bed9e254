//! Per-operation request coordination.
//!
//! A component asks for a `FetchSession` every time a user action needs
//! the network. Starting a session under a key aborts whatever session
//! was live under the same key, so for any key only the most recently
//! started request can ever complete successfully. Aborting drops the
//! in-flight future at its next poll; the owner sees
//! `ThemeError::Cancelled` and must treat it as a silent outcome.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use futures::future::{AbortHandle, Abortable, Aborted};
use theme_core::{FetchError, ThemeError};

use crate::client::Fetcher;

/// Logical operation name, e.g. `"facets"` or `"pagination"`.
pub type OperationKey = &'static str;

#[derive(Debug)]
struct SessionInner {
    id: u64,
    key: OperationKey,
    url: String,
    aborted: Cell<bool>,
    handles: RefCell<Vec<AbortHandle>>,
    in_flight: Cell<usize>,
}

/// Read-only view of a session's cancellation state.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    inner: Rc<SessionInner>,
}

impl AbortSignal {
    /// Whether the owning session was aborted.
    pub fn is_aborted(&self) -> bool {
        self.inner.aborted.get()
    }
}

/// One logical request owned by a component.
#[derive(Debug, Clone)]
pub struct FetchSession {
    inner: Rc<SessionInner>,
}

impl FetchSession {
    fn new(id: u64, key: OperationKey, url: String) -> Self {
        Self {
            inner: Rc::new(SessionInner {
                id,
                key,
                url,
                aborted: Cell::new(false),
                handles: RefCell::new(Vec::new()),
                in_flight: Cell::new(0),
            }),
        }
    }

    /// Session identifier, unique per coordinator.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Operation key.
    pub fn key(&self) -> OperationKey {
        self.inner.key
    }

    /// URL this session fetches.
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Cancellation view to hand to collaborators.
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            inner: Rc::clone(&self.inner),
        }
    }

    /// Whether a future is currently running under this session.
    pub fn in_flight(&self) -> bool {
        self.inner.in_flight.get() > 0
    }

    /// Whether this session was aborted.
    pub fn is_aborted(&self) -> bool {
        self.inner.aborted.get()
    }

    /// Whether results of this session may still be applied.
    ///
    /// Must be checked immediately before every DOM mutation that depends
    /// on this session's response.
    pub fn is_current(&self) -> bool {
        !self.is_aborted()
    }

    /// Abort the session and every future running under it.
    pub fn abort(&self) {
        if self.inner.aborted.replace(true) {
            return;
        }
        for handle in self.inner.handles.borrow().iter() {
            handle.abort();
        }
    }

    /// Drive `fut` under this session's abort registration.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, ThemeError>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        if self.is_aborted() {
            return Err(ThemeError::Cancelled);
        }

        let (handle, registration) = AbortHandle::new_pair();
        self.inner.handles.borrow_mut().push(handle);
        self.inner.in_flight.set(self.inner.in_flight.get() + 1);

        let result = Abortable::new(fut, registration).await;

        self.inner.in_flight.set(self.inner.in_flight.get() - 1);
        match result {
            Err(Aborted) => Err(ThemeError::Cancelled),
            Ok(_) if self.is_aborted() => Err(ThemeError::Cancelled),
            Ok(inner) => inner.map_err(ThemeError::from),
        }
    }

    /// GET this session's URL and return the body of a 2xx response.
    pub async fn fetch_text(&self, fetcher: &dyn Fetcher) -> Result<String, ThemeError> {
        let url = self.url().to_string();
        let response = self
            .run(async {
                let response = fetcher.get(&url).await?;
                response.error_for_status(&url)
            })
            .await?;
        Ok(response.body)
    }
}

/// Guarantees at most one live session per operation key.
#[derive(Debug, Default)]
pub struct RequestCoordinator {
    slots: RefCell<HashMap<OperationKey, FetchSession>>,
    next_id: Cell<u64>,
}

impl RequestCoordinator {
    /// Create an empty coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session under `key`, aborting the previous one.
    pub fn start_operation(&self, key: OperationKey, url: impl Into<String>) -> FetchSession {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let session = FetchSession::new(id, key, url.into());

        let previous = self.slots.borrow_mut().insert(key, session.clone());
        if let Some(previous) = previous {
            tracing::debug!(
                key,
                superseded = previous.id(),
                by = id,
                "aborting superseded request"
            );
            previous.abort();
        }
        session
    }

    /// Clear the slot for `key` if it still holds `session`.
    ///
    /// Returns false when the session was already superseded; the slot then
    /// belongs to the newer session and is left alone.
    pub fn end_operation(&self, key: OperationKey, session: &FetchSession) -> bool {
        let mut slots = self.slots.borrow_mut();
        match slots.get(key) {
            Some(current) if current.id() == session.id() => {
                slots.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Abort whatever is live under `key`. Returns true if something was
    /// aborted.
    pub fn cancel(&self, key: OperationKey) -> bool {
        let previous = self.slots.borrow_mut().remove(key);
        match previous {
            Some(session) => {
                tracing::debug!(key, session = session.id(), "request cancelled");
                session.abort();
                true
            }
            None => false,
        }
    }

    /// Whether `session` is the live session for its key.
    pub fn is_current(&self, session: &FetchSession) -> bool {
        session.is_current()
            && self
                .slots
                .borrow()
                .get(session.key())
                .is_some_and(|s| s.id() == session.id())
    }

    /// Whether a session is live under `key`.
    pub fn is_active(&self, key: OperationKey) -> bool {
        self.slots.borrow().contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[test]
    fn test_start_aborts_previous() {
        let coordinator = RequestCoordinator::new();
        let first = coordinator.start_operation("facets", "/a");
        let second = coordinator.start_operation("facets", "/b");

        assert!(first.is_aborted());
        assert!(!second.is_aborted());
        assert!(coordinator.is_current(&second));
        assert!(!coordinator.is_current(&first));
    }

    #[test]
    fn test_keys_are_independent() {
        let coordinator = RequestCoordinator::new();
        let facets = coordinator.start_operation("facets", "/a");
        let _cart = coordinator.start_operation("cart", "/cart");
        assert!(facets.is_current());
    }

    #[test]
    fn test_superseded_end_does_not_clear_successor() {
        let coordinator = RequestCoordinator::new();
        let first = coordinator.start_operation("facets", "/a");
        let second = coordinator.start_operation("facets", "/b");

        assert!(!coordinator.end_operation("facets", &first));
        assert!(coordinator.is_active("facets"));
        assert!(coordinator.end_operation("facets", &second));
        assert!(!coordinator.is_active("facets"));
    }

    #[tokio::test]
    async fn test_abort_cancels_pending_future() {
        let coordinator = RequestCoordinator::new();
        let session = coordinator.start_operation("pagination", "/page-2");
        let (_tx, rx) = oneshot::channel::<()>();

        let pending = session.run(async move {
            let _ = rx.await;
            Ok::<_, FetchError>("late")
        });
        let abort = async {
            tokio::task::yield_now().await;
            assert!(session.in_flight());
            coordinator.cancel("pagination");
        };

        let (result, ()) = futures::join!(pending, abort);
        assert_eq!(result, Err(ThemeError::Cancelled));
        assert!(!session.in_flight());
    }

    #[tokio::test]
    async fn test_run_after_abort_is_cancelled() {
        let session = FetchSession::new(1, "cart", "/cart".to_string());
        session.abort();
        let result = session.run(async { Ok::<_, FetchError>(1) }).await;
        assert!(result.unwrap_err().is_cancellation());
    }
}
