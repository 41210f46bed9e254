//! In-memory capture of log entries.

use std::cell::RefCell;
use std::rc::Rc;

use crate::logging::{LogEntry, LogLevel};

/// Shared buffer of emitted entries.
///
/// Clones share the same buffer, so one sink can be handed to every
/// component logger on a page.
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    entries: Rc<RefCell<Vec<LogEntry>>>,
}

impl LogSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, entry: LogEntry) {
        self.entries.borrow_mut().push(entry);
    }

    /// Snapshot of every captured entry.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.borrow().clone()
    }

    /// Entries at exactly `level`.
    pub fn at_level(&self, level: LogLevel) -> Vec<LogEntry> {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.level == level)
            .cloned()
            .collect()
    }

    /// Entries logged by `component`.
    pub fn for_component(&self, component: &str) -> Vec<LogEntry> {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.component == component)
            .cloned()
            .collect()
    }

    /// Number of captured entries.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Drop every captured entry.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    /// Render every entry as newline-delimited JSON.
    pub fn to_json_lines(&self) -> String {
        self.entries
            .borrow()
            .iter()
            .map(LogEntry::to_json)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::ComponentLogger;

    #[test]
    fn test_clones_share_buffer() {
        let sink = LogSink::new();
        let facets = ComponentLogger::new("facets").with_sink(sink.clone());
        let cart = ComponentLogger::new("cart-drawer").with_sink(sink.clone());

        facets.warn("fetch failed");
        cart.debug("opened");

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.at_level(LogLevel::Warn).len(), 1);
        assert_eq!(sink.for_component("cart-drawer")[0].message, "opened");
        assert_eq!(sink.to_json_lines().lines().count(), 2);

        sink.clear();
        assert!(sink.is_empty());
    }
}
