//! Viewport breakpoint tracking.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::config::Breakpoints;

/// Layout breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Mobile,
    Tablet,
    Desktop,
}

impl Breakpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Breakpoint::Mobile => "mobile",
            Breakpoint::Tablet => "tablet",
            Breakpoint::Desktop => "desktop",
        }
    }

    /// Whether this is the desktop layout.
    pub fn is_desktop(&self) -> bool {
        matches!(self, Breakpoint::Desktop)
    }
}

impl std::fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reactive breakpoint channel.
///
/// The host reports viewport widths; subscribers are woken only when the
/// classified breakpoint actually changes.
#[derive(Debug)]
pub struct BreakpointWatch {
    thresholds: Breakpoints,
    sender: watch::Sender<Breakpoint>,
}

impl BreakpointWatch {
    /// Create a channel with an initial breakpoint.
    pub fn new(thresholds: Breakpoints, initial: Breakpoint) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { thresholds, sender }
    }

    /// Current breakpoint.
    pub fn current(&self) -> Breakpoint {
        *self.sender.borrow()
    }

    /// Subscribe to changes.
    pub fn subscribe(&self) -> watch::Receiver<Breakpoint> {
        self.sender.subscribe()
    }

    /// Report a new viewport width. Returns the new breakpoint when it
    /// changed.
    pub fn update_width(&self, width: u32) -> Option<Breakpoint> {
        let next = self.thresholds.classify(width);
        let changed = self.sender.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        changed.then_some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_width_only_reports_changes() {
        let watch = BreakpointWatch::new(Breakpoints::default(), Breakpoint::Desktop);
        let mut rx = watch.subscribe();

        assert_eq!(watch.update_width(1400), None);
        assert!(!rx.has_changed().unwrap());

        assert_eq!(watch.update_width(400), Some(Breakpoint::Mobile));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Breakpoint::Mobile);
        assert_eq!(watch.current(), Breakpoint::Mobile);
    }
}
