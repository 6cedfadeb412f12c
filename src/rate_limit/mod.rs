//! Rate Limit Module
//!
//! Per-client admission control using two fixed-window counters: a short
//! burst window checked first, then a longer window.

mod limiter;
mod window;

pub use limiter::{RateLimitDecision, RateLimiter, RateLimits};
pub use window::{LimitScope, RateLimitState};

use std::sync::Arc;
use tokio::sync::RwLock;

/// Limiter handle shared between the gateway and the sweep task.
pub type SharedRateLimiter = Arc<RwLock<RateLimiter>>;
