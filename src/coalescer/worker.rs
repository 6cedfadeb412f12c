//! Fetch worker loop.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use super::Shared;
use crate::cache::SharedCache;
use crate::error::FetchError;
use crate::store::BackingStore;

/// Fails whatever is still queued when the worker future is dropped.
struct StopGuard<V> {
    shared: Arc<Shared<V>>,
}

impl<V> Drop for StopGuard<V> {
    fn drop(&mut self) {
        let open = self.shared.lock().drain();
        if !open.is_empty() {
            warn!(cycles = open.len(), "fetch worker stopped with open cycles");
        }
        for pending in open {
            pending.fail(FetchError::WorkerStopped);
        }
    }
}

/// Drains the queue one key at a time, forever.
///
/// Exactly one backend call is in flight at any instant.
pub(super) async fn run<S>(
    shared: Arc<Shared<S::Value>>,
    store: Arc<S>,
    cache: SharedCache<S::Value>,
    tick: Duration,
) where
    S: BackingStore,
{
    let _guard = StopGuard {
        shared: Arc::clone(&shared),
    };
    info!(tick_ms = tick.as_millis() as u64, "fetch worker started");

    loop {
        let (key, enqueued_at) = next_key(&shared).await;
        let queued_for = shared.clock.now().saturating_duration_since(enqueued_at);

        let outcome = fetch_guarded(store.as_ref(), &key).await;

        match &outcome {
            Ok(value) => {
                cache.write().await.set(key.clone(), value.clone());
                debug!(key = %key, queued_ms = queued_for.as_millis() as u64, "fetch resolved");
            }
            Err(err) => {
                warn!(key = %key, error = %err, "fetch failed");
            }
        }

        // remove the cycle and release its waiters under one lock so a new
        // request either joins this cycle or opens the next one
        {
            let mut queue = shared.lock();
            if let Some(pending) = queue.finish(&key) {
                debug!(key = %key, waiters = pending.waiter_count(), "releasing waiters");
                pending.resolve(outcome);
            }
        }

        if !tick.is_zero() {
            tokio::time::sleep(tick).await;
        }
    }
}

/// Calls the store, turning a panic into a failed cycle so the worker keeps
/// draining other keys.
async fn fetch_guarded<S>(store: &S, key: &str) -> Result<S::Value, FetchError>
where
    S: BackingStore,
{
    match AssertUnwindSafe(store.fetch(key)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(_) => {
            error!(key = %key, "backing store panicked during fetch");
            Err(FetchError::Internal(format!(
                "backing store panicked while fetching '{}'",
                key
            )))
        }
    }
}

/// Waits until the queue has a head and marks the worker busy.
async fn next_key<V>(shared: &Shared<V>) -> (String, std::time::Instant) {
    loop {
        let head = shared.lock().begin_next();
        if let Some(next) = head {
            return next;
        }
        shared.wake.notified().await;
    }
}
