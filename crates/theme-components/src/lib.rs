//! Interactive storefront components.
//!
//! This crate provides:
//! - `FacetFilterController` - Filter and sort changes re-render the results in place
//! - `PaginationController` - Load-more and infinite scroll
//! - `CartDrawerController` - The slide-out cart and its re-rendering
//! - `ModalDialog`, `MenuDrawer`, `Slider`, `ProductRecommendations`, `StickyHeader`
//! - `StorefrontPage` - Mounts the components a page needs and routes events to them
//!
//! Components share one document (`SharedDocument`) and one
//! `ThemeContext`. They run on a single thread and never hold a document
//! borrow across an await.

mod cart_drawer;
mod context;
mod deferred;
mod disclosure;
mod facets;
mod focus_trap;
mod header;
mod history;
mod lifecycle;
mod modal;
mod navigation;
mod page;
mod pagination;
mod recommendations;
mod slider;

pub use cart_drawer::*;
pub use context::*;
pub use deferred::*;
pub use disclosure::*;
pub use facets::*;
pub use focus_trap::*;
pub use header::*;
pub use history::*;
pub use lifecycle::*;
pub use modal::ModalDialog;
pub use navigation::*;
pub use page::*;
pub use pagination::*;
pub use recommendations::*;
pub use slider::*;
