//! Generic caching layer for data persistence and offline support.
//!
//! This module provides a catalog-agnostic caching mechanism that:
//! - Stores serialized responses per key, one table per kind of content
//! - Serves entries younger than their category's TTL without touching the network
//! - Refreshes expired or missing entries from the network
//! - Provides basic offline mode (serve stale cache when network unavailable)

mod codec;
mod layer;
mod policy;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use policy::Category;
pub use storage::{CacheStorage, NoopStorage, SqliteStorage};
pub use traits::{CacheTable, Page, QueryKey};

#[cfg(test)]
pub use traits::ManualClock;
