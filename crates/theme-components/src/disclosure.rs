//! Open/close state machine shared by drawers and modals.

use std::cell::Cell;
use std::time::Duration;

use tokio::sync::Notify;

/// Visibility state of a drawer or modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawerState {
    #[default]
    Closed,
    Opening,
    Open,
    Closing,
}

impl DrawerState {
    /// Whether a transition is running.
    pub fn is_transitioning(&self) -> bool {
        matches!(self, DrawerState::Opening | DrawerState::Closing)
    }

    /// Whether the element is (becoming) visible.
    pub fn is_visible(&self) -> bool {
        matches!(self, DrawerState::Opening | DrawerState::Open)
    }
}

/// Result of an open or close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A transition began.
    Started,
    /// Already there or already heading there; nothing changed.
    Unchanged,
    /// The opposite transition is running; the request was dropped.
    Refused,
}

/// Disclosure embedded in each drawer or modal.
///
/// State only advances out of `Opening`/`Closing` when `transition_end`
/// is called, never by a request, so rapid toggles cannot interleave.
#[derive(Debug)]
pub struct Disclosure {
    state: Cell<DrawerState>,
    duration: Duration,
    settled: Notify,
}

impl Disclosure {
    /// Create a closed disclosure with the given transition duration.
    pub fn new(duration: Duration) -> Self {
        Self {
            state: Cell::new(DrawerState::Closed),
            duration,
            settled: Notify::new(),
        }
    }

    pub fn state(&self) -> DrawerState {
        self.state.get()
    }

    pub fn is_open(&self) -> bool {
        self.state.get() == DrawerState::Open
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn request_open(&self) -> Transition {
        match self.state.get() {
            DrawerState::Closed => {
                self.state.set(DrawerState::Opening);
                Transition::Started
            }
            DrawerState::Opening | DrawerState::Open => Transition::Unchanged,
            DrawerState::Closing => Transition::Refused,
        }
    }

    pub fn request_close(&self) -> Transition {
        match self.state.get() {
            DrawerState::Open => {
                self.state.set(DrawerState::Closing);
                Transition::Started
            }
            DrawerState::Closing | DrawerState::Closed => Transition::Unchanged,
            DrawerState::Opening => Transition::Refused,
        }
    }

    /// Signal that the running transition finished.
    pub fn transition_end(&self) {
        let next = match self.state.get() {
            DrawerState::Opening => DrawerState::Open,
            DrawerState::Closing => DrawerState::Closed,
            settled => settled,
        };
        self.state.set(next);
        self.settled.notify_waiters();
    }

    /// Wait until no transition is running.
    pub async fn wait_settled(&self) {
        while self.state.get().is_transitioning() {
            self.settled.notified().await;
        }
    }

    /// Wait for the configured transition, then settle.
    pub async fn settle(&self) {
        if !self.duration.is_zero() {
            tokio::time::sleep(self.duration).await;
        }
        self.transition_end();
    }

    /// Request open and wait for the transition to finish.
    pub async fn open(&self) -> Transition {
        let transition = self.request_open();
        if transition == Transition::Started {
            self.settle().await;
        }
        transition
    }

    /// Request close and wait for the transition to finish.
    pub async fn close(&self) -> Transition {
        let transition = self.request_close();
        if transition == Transition::Started {
            self.settle().await;
        }
        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_during_transition() {
        let d = Disclosure::new(Duration::from_millis(300));
        assert_eq!(d.request_open(), Transition::Started);
        assert_eq!(d.request_open(), Transition::Unchanged);
        assert_eq!(d.request_close(), Transition::Refused);
        assert_eq!(d.state(), DrawerState::Opening);

        d.transition_end();
        assert!(d.is_open());
        assert_eq!(d.request_close(), Transition::Started);
        assert_eq!(d.request_open(), Transition::Refused);
        d.transition_end();
        assert_eq!(d.state(), DrawerState::Closed);
    }

    #[test]
    fn test_transition_end_when_settled_is_noop() {
        let d = Disclosure::new(Duration::ZERO);
        d.transition_end();
        assert_eq!(d.state(), DrawerState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_waits_for_duration() {
        let d = Disclosure::new(Duration::from_millis(300));
        let start = tokio::time::Instant::now();
        assert_eq!(d.open().await, Transition::Started);
        assert!(start.elapsed() >= Duration::from_millis(300));
        assert!(d.is_open());
        assert_eq!(d.open().await, Transition::Unchanged);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_settled_resumes_after_transition() {
        let d = Disclosure::new(Duration::from_millis(300));
        let (_, state) = tokio::join!(d.open(), async {
            d.wait_settled().await;
            d.state()
        });
        assert_eq!(state, DrawerState::Open);

        d.wait_settled().await;
        assert!(d.is_open());
    }
}
