//! Observability for the storefront theme runtime.
//!
//! This crate provides:
//! - `ComponentLogger` - Structured logging with component and operation context
//! - `LogEntry` - A single structured record, JSON or human formatted
//! - `LogSink` - In-memory capture of emitted entries

mod logging;
mod sink;

pub use logging::*;
pub use sink::*;
