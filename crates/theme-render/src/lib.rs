//! Partial section rendering.
//!
//! This crate provides:
//! - `SectionDescriptor` - Which fetched section feeds which live element
//! - `SectionRequest` - `section_id=` / `sections=` URL construction
//! - `SectionPayload` - A response parsed once into detached documents
//! - `PartialRenderer` - Copies fetched section content into the live document

mod payload;
mod renderer;
mod request;
mod section;

pub use payload::*;
pub use renderer::*;
pub use request::*;
pub use section::*;
