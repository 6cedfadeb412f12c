//! Periodic Sweep Tasks
//!
//! Background tasks that proactively drop expired cache entries and idle
//! rate-limit state, independent of request traffic.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;
use crate::rate_limit::SharedRateLimiter;

/// Spawns a background task that periodically removes expired cache entries.
///
/// The task sleeps for `interval` between runs and takes the cache write lock
/// only for the sweep itself.
///
/// # Returns
/// A JoinHandle for the spawned task, aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(RwLock::new(CacheStore::new(1000, Duration::from_secs(60))));
/// let sweep = spawn_cache_sweep_task(cache.clone(), Duration::from_secs(30));
/// // Later, during shutdown:
/// sweep.abort();
/// ```
pub fn spawn_cache_sweep_task<V>(cache: SharedCache<V>, interval: Duration) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(
            "Starting cache expiry sweep with interval of {} ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.write().await.cleanup_expired();

            if removed > 0 {
                info!("Cache sweep: removed {} expired entries", removed);
            } else {
                debug!("Cache sweep: no expired entries found");
            }
        }
    })
}

/// Spawns a background task that forgets clients whose windows have elapsed.
pub fn spawn_rate_limit_sweep_task(limiter: SharedRateLimiter, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting rate limiter sweep with interval of {} ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = limiter.write().await.cleanup_expired();

            if removed > 0 {
                info!("Rate limiter sweep: dropped {} idle clients", removed);
            } else {
                debug!("Rate limiter sweep: no idle clients");
            }
        }
    })
}
