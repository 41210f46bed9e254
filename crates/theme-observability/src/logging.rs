//! Structured logging with component context.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use serde::Serialize;

use crate::sink::LogSink;

/// Log level for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trace => write!(f, "TRACE"),
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// A structured log entry.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// Log level.
    pub level: LogLevel,
    /// Log message.
    pub message: String,
    /// Component that logged, e.g. `facets` or `cart-drawer`.
    pub component: String,
    /// Operation in progress.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Additional structured fields.
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
    /// Microseconds since the logger was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_us: Option<u64>,
}

impl LogEntry {
    /// Format as JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }

    /// Format as human-readable string.
    pub fn to_human(&self) -> String {
        let mut s = format!("[{}] {}", self.level, self.component);
        if let Some(op) = &self.operation {
            s.push_str(&format!("/{}", op));
        }
        s.push_str(": ");
        s.push_str(&self.message);

        if let Some(elapsed) = self.elapsed_us {
            s.push_str(&format!(" ({}us)", elapsed));
        }

        if !self.fields.is_empty() {
            s.push_str(" | ");
            let fields: Vec<String> = self
                .fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            s.push_str(&fields.join(" "));
        }

        s
    }

    /// String value of a field, if present.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }
}

/// Output format for logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON format (for log aggregation and reports).
    Json,
    /// Human-readable format.
    #[default]
    Human,
}

/// Structured logger scoped to one component.
///
/// Entries are emitted as `tracing` events at the matching level, so
/// whatever subscriber the host installed decides where they go. A
/// `LogSink` can additionally capture them.
#[derive(Debug, Clone)]
pub struct ComponentLogger {
    component: String,
    operation: Option<String>,
    start_time: Instant,
    min_level: LogLevel,
    format: LogFormat,
    sink: Option<LogSink>,
}

impl ComponentLogger {
    /// Create a logger for a component.
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            operation: None,
            start_time: Instant::now(),
            min_level: LogLevel::Debug,
            format: LogFormat::Human,
            sink: None,
        }
    }

    /// Derive a logger for one operation of this component.
    pub fn for_operation(&self, operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            start_time: Instant::now(),
            ..self.clone()
        }
    }

    /// Set minimum log level.
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Set output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Capture entries into `sink` as well.
    pub fn with_sink(mut self, sink: LogSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Component name.
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Log at trace level.
    pub fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message, BTreeMap::new());
    }

    /// Log at debug level.
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, BTreeMap::new());
    }

    /// Log at info level.
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, BTreeMap::new());
    }

    /// Log at warn level.
    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message, BTreeMap::new());
    }

    /// Log at error level.
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, BTreeMap::new());
    }

    /// Log at warn level with fields.
    pub fn warn_with(&self, message: &str, fields: &[(&str, &dyn fmt::Display)]) {
        let fields = fields
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::json!(v.to_string())))
            .collect();
        self.log(LogLevel::Warn, message, fields);
    }

    /// Log at debug level with fields.
    pub fn debug_with(&self, message: &str, fields: &[(&str, &dyn fmt::Display)]) {
        let fields = fields
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::json!(v.to_string())))
            .collect();
        self.log(LogLevel::Debug, message, fields);
    }

    fn log(&self, level: LogLevel, message: &str, fields: BTreeMap<String, serde_json::Value>) {
        if level < self.min_level {
            return;
        }

        let entry = LogEntry {
            level,
            message: message.to_string(),
            component: self.component.clone(),
            operation: self.operation.clone(),
            fields,
            elapsed_us: Some(self.elapsed_us()),
        };

        let output = match self.format {
            LogFormat::Json => entry.to_json(),
            LogFormat::Human => entry.to_human(),
        };

        let component = self.component.as_str();
        match level {
            LogLevel::Trace => tracing::trace!(component, "{}", output),
            LogLevel::Debug => tracing::debug!(component, "{}", output),
            LogLevel::Info => tracing::info!(component, "{}", output),
            LogLevel::Warn => tracing::warn!(component, "{}", output),
            LogLevel::Error => tracing::error!(component, "{}", output),
        }

        if let Some(sink) = &self.sink {
            sink.push(entry);
        }
    }

    /// Microseconds since logger (or operation) creation.
    pub fn elapsed_us(&self) -> u64 {
        self.start_time.elapsed().as_micros() as u64
    }
}

/// Builder for log entries with fluent API.
pub struct LogBuilder<'a> {
    logger: &'a ComponentLogger,
    level: LogLevel,
    message: String,
    fields: BTreeMap<String, serde_json::Value>,
}

impl<'a> LogBuilder<'a> {
    /// Create a new log builder.
    pub fn new(logger: &'a ComponentLogger, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            logger,
            level,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Add a string field.
    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields
            .insert(key.to_string(), serde_json::json!(value.into()));
        self
    }

    /// Add an integer field.
    pub fn field_u64(mut self, key: &str, value: u64) -> Self {
        self.fields.insert(key.to_string(), serde_json::json!(value));
        self
    }

    /// Add a boolean field.
    pub fn field_bool(mut self, key: &str, value: bool) -> Self {
        self.fields.insert(key.to_string(), serde_json::json!(value));
        self
    }

    /// Emit the log entry.
    pub fn emit(self) {
        self.logger.log(self.level, &self.message, self.fields);
    }
}

impl ComponentLogger {
    /// Start building an info log entry.
    pub fn info_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, LogLevel::Info, message)
    }

    /// Start building a warn log entry.
    pub fn warn_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, LogLevel::Warn, message)
    }

    /// Start building a debug log entry.
    pub fn debug_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, LogLevel::Debug, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_format() {
        let mut fields = BTreeMap::new();
        fields.insert("status".to_string(), serde_json::json!(503));
        let entry = LogEntry {
            level: LogLevel::Warn,
            message: "fetch failed".to_string(),
            component: "facets".to_string(),
            operation: Some("apply".to_string()),
            fields,
            elapsed_us: None,
        };
        assert_eq!(entry.to_human(), "[WARN] facets/apply: fetch failed | status=503");
    }

    #[test]
    fn test_json_flattens_fields() {
        let sink = LogSink::new();
        let logger = ComponentLogger::new("pagination")
            .with_format(LogFormat::Json)
            .with_sink(sink.clone());
        logger.info_builder("appended").field_u64("count", 12).emit();

        let entry = &sink.entries()[0];
        let json: serde_json::Value = serde_json::from_str(&entry.to_json()).unwrap();
        assert_eq!(json["level"], "info");
        assert_eq!(json["component"], "pagination");
        assert_eq!(json["count"], 12);
    }

    #[test]
    fn test_min_level_filters() {
        let sink = LogSink::new();
        let logger = ComponentLogger::new("cart-drawer")
            .with_min_level(LogLevel::Warn)
            .with_sink(sink.clone());
        logger.debug("opening");
        logger.warn_with("refresh failed", &[("status", &503)]);

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.entries()[0].field_str("status"), Some("503"));
    }

    #[test]
    fn test_operation_scope() {
        let sink = LogSink::new();
        let logger = ComponentLogger::new("facets").with_sink(sink.clone());
        logger.for_operation("popstate").debug("replaying");
        assert_eq!(sink.entries()[0].operation.as_deref(), Some("popstate"));
    }
}
