//! Backing Store Module
//!
//! The slow key/value source that sits behind the cache. The coalescer only
//! sees the [`BackingStore`] trait, so tests can plug in gated, counting or
//! failing stores.

mod memory;

pub use memory::MemoryUserStore;

use async_trait::async_trait;

use crate::error::FetchError;

// == Backing Store Trait ==
/// Asynchronous key lookup with opaque latency.
#[async_trait]
pub trait BackingStore: Send + Sync + 'static {
    /// Value produced for a key.
    type Value: Clone + Send + Sync + 'static;

    /// Looks up `key`, failing with [`FetchError::NotFound`] when it does not
    /// exist.
    async fn fetch(&self, key: &str) -> Result<Self::Value, FetchError>;
}
