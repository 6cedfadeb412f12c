//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Cache sweep: removes expired cache entries at a fixed interval
//! - Rate limiter sweep: forgets clients whose windows have both elapsed
//! - Fetch worker: drains the coalescer queue (started by
//!   [`crate::coalescer::Coalescer::spawn`])

mod cleanup;

pub use cleanup::{spawn_cache_sweep_task, spawn_rate_limit_sweep_task};

use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Handles of every long-lived task, aborted together on shutdown.
#[derive(Debug)]
pub struct BackgroundTasks {
    pub fetch_worker: JoinHandle<()>,
    pub cache_sweep: JoinHandle<()>,
    pub rate_limit_sweep: JoinHandle<()>,
}

impl BackgroundTasks {
    /// Aborts all tasks and waits for them to wind down.
    pub async fn shutdown(self) {
        let tasks = [
            ("fetch worker", self.fetch_worker),
            ("cache sweep", self.cache_sweep),
            ("rate limit sweep", self.rate_limit_sweep),
        ];

        for (name, handle) in tasks {
            handle.abort();
            if let Err(err) = handle.await {
                if !err.is_cancelled() {
                    warn!("{} ended abnormally: {}", name, err);
                }
            }
            info!("{} stopped", name);
        }
    }
}
