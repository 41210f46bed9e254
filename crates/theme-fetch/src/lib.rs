//! Cancel-safe section fetching.
//!
//! This crate provides:
//! - `Fetcher` - Transport seam (`HttpFetcher` over reqwest, `ReplayFetcher` for recordings)
//! - `FetchPolicy` - Timeouts and retries
//! - `RequestCoordinator` / `FetchSession` - At most one live request per operation key

mod client;
mod coordinator;
mod replay;
mod response;
mod retry;
mod timeout;

pub use client::*;
pub use coordinator::*;
pub use replay::*;
pub use response::*;
pub use retry::*;
pub use timeout::*;
