//! Core abstractions for the storefront theme runtime.
//!
//! This crate provides the fundamental types shared by every component:
//! - `ThemeConfig` - Immutable settings, string table and capabilities
//! - `BreakpointWatch` - Reactive viewport breakpoint channel
//! - `EventBus` / `ThemeEvent` - Page-wide custom events
//! - `ThemeError` - Error taxonomy (cancellation, fetch, missing section, validation)
//! - `SearchParams` - Ordered query parameters
//! - `selectors` - Markup contract shared with the server-rendered sections

mod breakpoint;
mod config;
mod error;
mod events;
mod params;
pub mod selectors;

pub use breakpoint::*;
pub use config::*;
pub use error::*;
pub use events::*;
pub use params::*;
