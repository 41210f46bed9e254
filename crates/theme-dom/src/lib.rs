//! Arena document model for the storefront theme runtime.
//!
//! This crate provides:
//! - `Document` - Mutable node arena with a live tree, focus and viewport state
//! - `Selector` - The CSS selector subset the theme markup relies on
//! - HTML parsing (html5ever) and serialization
//! - Form serialization for filter forms

mod document;
mod error;
mod form;
mod parse;
mod selector;
mod serialize;

pub use document::*;
pub use error::*;
pub use form::*;
pub use selector::*;
