//! Keygate - a caching read-through gateway
//!
//! Puts a TTL/LRU cache, a dual-window rate limiter and a fetch coalescer in
//! front of a slow backing store.

pub mod api;
pub mod cache;
pub mod clock;
pub mod coalescer;
pub mod config;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod store;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::{CacheStore, SharedCache};
pub use coalescer::Coalescer;
pub use config::Config;
pub use rate_limit::{RateLimiter, SharedRateLimiter};
pub use store::BackingStore;
pub use tasks::BackgroundTasks;
