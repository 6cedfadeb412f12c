//! Coalescer Module
//!
//! Deduplicates concurrent fetches of the same key against a slow backing
//! store. The first request for a cold key opens a fetch cycle and queues the
//! key; later requests for that key attach to the open cycle. A single worker
//! drains the queue one key at a time, writes successful results into the
//! cache and then releases every waiter with the same outcome.

mod pending;
mod worker;

pub use pending::{FetchQueue, FetchResult, PendingFetch};

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::SharedCache;
use crate::clock::{system_clock, SharedClock};
use crate::error::FetchError;
use crate::store::BackingStore;

// == Coalescer Stats ==
/// Snapshot of the fetch queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoalescerStats {
    /// Keys waiting for (or undergoing) a backend fetch
    pub queue_length: usize,
    /// Open fetch cycles
    pub pending_key_count: usize,
    /// Callers suspended across all open cycles
    pub total_waiters: usize,
    /// Whether a backend call is in flight
    pub worker_busy: bool,
}

// == Fetch Handle ==
/// Completes when the fetch cycle the caller attached to resolves.
#[derive(Debug)]
pub struct FetchHandle<V> {
    rx: oneshot::Receiver<FetchResult<V>>,
}

impl<V> Future for FetchHandle<V> {
    type Output = FetchResult<V>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(FetchError::WorkerStopped)))
    }
}

pub(crate) struct Shared<V> {
    queue: Mutex<FetchQueue<V>>,
    wake: Notify,
    clock: SharedClock,
}

impl<V> Shared<V> {
    fn lock(&self) -> MutexGuard<'_, FetchQueue<V>> {
        // the queue holds no invariants a panicking holder could break halfway
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// == Coalescer ==
/// Handle to the fetch queue. Cheap to clone.
pub struct Coalescer<V> {
    shared: Arc<Shared<V>>,
}

impl<V> Clone for Coalescer<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V> std::fmt::Debug for Coalescer<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coalescer")
            .field("stats", &self.stats())
            .finish()
    }
}

impl<V: Clone + Send + Sync + 'static> Coalescer<V> {
    // == Spawn ==
    /// Creates the queue and starts its single worker.
    ///
    /// The worker pauses `tick` between consecutive fetches. Aborting the
    /// returned handle stops the worker and fails every open cycle with
    /// [`FetchError::WorkerStopped`].
    pub fn spawn<S>(store: Arc<S>, cache: SharedCache<V>, tick: Duration) -> (Self, JoinHandle<()>)
    where
        S: BackingStore<Value = V>,
    {
        Self::spawn_with_clock(store, cache, tick, system_clock())
    }

    pub fn spawn_with_clock<S>(
        store: Arc<S>,
        cache: SharedCache<V>,
        tick: Duration,
        clock: SharedClock,
    ) -> (Self, JoinHandle<()>)
    where
        S: BackingStore<Value = V>,
    {
        let shared = Arc::new(Shared {
            queue: Mutex::new(FetchQueue::default()),
            wake: Notify::new(),
            clock,
        });
        let handle = tokio::spawn(worker::run(Arc::clone(&shared), store, cache, tick));
        (Self { shared }, handle)
    }

    // == Enqueue ==
    /// Attaches the caller to the fetch cycle for `key`, opening one if needed.
    ///
    /// Never issues a backend call itself; the worker does.
    pub fn enqueue(&self, key: impl Into<String>) -> FetchHandle<V> {
        let key = key.into();
        let now = self.shared.clock.now();

        let (rx, opened) = self.shared.lock().attach(&key, now);
        if opened {
            debug!(key = %key, "fetch cycle opened");
            self.shared.wake.notify_one();
        } else {
            debug!(key = %key, "attached to pending fetch");
        }

        FetchHandle { rx }
    }

    // == Fetch ==
    /// Fetches `key` through the queue, suspending until its cycle resolves.
    pub async fn fetch(&self, key: impl Into<String>) -> FetchResult<V> {
        self.enqueue(key).await
    }
}

impl<V> Coalescer<V> {
    // == Stats ==
    pub fn stats(&self) -> CoalescerStats {
        let queue = self.shared.lock();
        CoalescerStats {
            queue_length: queue.queue_len(),
            pending_key_count: queue.pending_len(),
            total_waiters: queue.total_waiters(),
            worker_busy: queue.is_busy(),
        }
    }

    /// Whether a fetch cycle is open for `key`.
    pub fn is_pending(&self, key: &str) -> bool {
        self.shared.lock().is_pending(key)
    }
}
