//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and LRU eviction.

mod entry;
mod recency;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{CacheEntry, EntryInfo};
pub use recency::RecencyIndex;
pub use stats::{CacheStats, LatencyWindow, LATENCY_WINDOW};
pub use store::CacheStore;

use std::sync::Arc;
use tokio::sync::RwLock;

/// Cache handle shared between the gateway, the fetch worker and the sweep task.
pub type SharedCache<V> = Arc<RwLock<CacheStore<V>>>;
