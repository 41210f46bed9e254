//! Shared collaborators handed to every component.

use std::cell::RefCell;
use std::rc::Rc;

use theme_core::{EventBus, ThemeConfig};
use theme_dom::Document;
use theme_fetch::Fetcher;
use theme_observability::{ComponentLogger, LogSink};

/// The live page document. Borrows are never held across an await.
pub type SharedDocument = Rc<RefCell<Document>>;

/// Wrap a parsed document for sharing between components.
pub fn share(doc: Document) -> SharedDocument {
    Rc::new(RefCell::new(doc))
}

/// Everything a component needs besides the document itself.
#[derive(Clone)]
pub struct ThemeContext {
    /// Immutable theme configuration.
    pub config: Rc<ThemeConfig>,
    /// Page-wide event bus.
    pub bus: EventBus,
    /// Network transport.
    pub fetcher: Rc<dyn Fetcher>,
    logs: Option<LogSink>,
}

impl ThemeContext {
    /// Create a context.
    pub fn new(config: ThemeConfig, fetcher: Rc<dyn Fetcher>) -> Self {
        Self {
            config: Rc::new(config),
            bus: EventBus::new(),
            fetcher,
            logs: None,
        }
    }

    /// Capture every component log entry into `sink`.
    pub fn with_log_sink(mut self, sink: LogSink) -> Self {
        self.logs = Some(sink);
        self
    }

    /// Logger for a named component.
    pub fn logger(&self, component: &str) -> ComponentLogger {
        let logger = ComponentLogger::new(component);
        match &self.logs {
            Some(sink) => logger.with_sink(sink.clone()),
            None => logger,
        }
    }

    /// The captured log, if a sink was installed.
    pub fn log_sink(&self) -> Option<&LogSink> {
        self.logs.as_ref()
    }
}

impl std::fmt::Debug for ThemeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeContext")
            .field("config", &self.config)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}
