//! Pending fetch cycles and the queue that orders them.

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use tokio::sync::oneshot;

use crate::error::FetchError;

/// Outcome delivered to every waiter of a cycle.
pub type FetchResult<V> = Result<V, FetchError>;

// == Pending Fetch ==
/// One in-progress fetch cycle for a key.
#[derive(Debug)]
pub struct PendingFetch<V> {
    pub key: String,
    pub enqueued_at: Instant,
    waiters: Vec<oneshot::Sender<FetchResult<V>>>,
}

impl<V> PendingFetch<V> {
    fn new(key: String, enqueued_at: Instant) -> Self {
        Self {
            key,
            enqueued_at,
            waiters: Vec::new(),
        }
    }

    fn attach(&mut self) -> oneshot::Receiver<FetchResult<V>> {
        let (tx, rx) = oneshot::channel();
        self.waiters.push(tx);
        rx
    }

    pub fn waiter_count(&self) -> usize {
        self.waiters.len()
    }

    /// Completes every waiter with the same error, in attachment order.
    pub fn fail(self, err: FetchError) {
        for waiter in self.waiters {
            // a waiter that stopped listening is not an error
            let _ = waiter.send(Err(err.clone()));
        }
    }
}

impl<V: Clone> PendingFetch<V> {
    /// Completes every waiter with `outcome`, in attachment order.
    pub fn resolve(self, outcome: FetchResult<V>) {
        match outcome {
            Ok(value) => {
                for waiter in self.waiters {
                    let _ = waiter.send(Ok(value.clone()));
                }
            }
            Err(err) => self.fail(err),
        }
    }
}

// == Fetch Queue ==
/// Pending map and FIFO queue, always updated together.
///
/// A key is in `order` exactly when it has an entry in `pending`.
#[derive(Debug)]
pub struct FetchQueue<V> {
    pending: HashMap<String, PendingFetch<V>>,
    order: VecDeque<String>,
    busy: bool,
}

impl<V> Default for FetchQueue<V> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
            order: VecDeque::new(),
            busy: false,
        }
    }
}

impl<V> FetchQueue<V> {
    /// Attaches a waiter for `key`, opening a new cycle if none is pending.
    ///
    /// Returns the receiver and whether a new cycle was queued.
    pub fn attach(&mut self, key: &str, now: Instant) -> (oneshot::Receiver<FetchResult<V>>, bool) {
        if let Some(pending) = self.pending.get_mut(key) {
            return (pending.attach(), false);
        }

        let mut pending = PendingFetch::new(key.to_string(), now);
        let rx = pending.attach();
        self.pending.insert(key.to_string(), pending);
        self.order.push_back(key.to_string());
        (rx, true)
    }

    /// Head of the queue, marking the worker busy.
    pub fn begin_next(&mut self) -> Option<(String, Instant)> {
        let key = self.order.front()?;
        let enqueued_at = self.pending.get(key)?.enqueued_at;
        self.busy = true;
        Some((key.clone(), enqueued_at))
    }

    /// Ends the cycle for `key`, removing it from both the queue and the map.
    pub fn finish(&mut self, key: &str) -> Option<PendingFetch<V>> {
        self.busy = false;
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.pending.remove(key)
    }

    /// Empties the queue, handing back every open cycle.
    pub fn drain(&mut self) -> Vec<PendingFetch<V>> {
        self.busy = false;
        self.order.clear();
        self.pending.drain().map(|(_, pending)| pending).collect()
    }

    pub fn queue_len(&self) -> usize {
        self.order.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn total_waiters(&self) -> usize {
        self.pending.values().map(PendingFetch::waiter_count).sum()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_opens_one_cycle_per_key() {
        let now = Instant::now();
        let mut queue: FetchQueue<u32> = FetchQueue::default();

        let (_a, first) = queue.attach("1", now);
        let (_b, second) = queue.attach("1", now);
        let (_c, other) = queue.attach("2", now);

        assert!(first);
        assert!(!second);
        assert!(other);
        assert_eq!(queue.queue_len(), 2);
        assert_eq!(queue.pending_len(), 2);
        assert_eq!(queue.total_waiters(), 3);
    }

    #[test]
    fn test_begin_next_is_fifo() {
        let now = Instant::now();
        let mut queue: FetchQueue<u32> = FetchQueue::default();
        let _a = queue.attach("b", now);
        let _b = queue.attach("a", now);

        let (key, _) = queue.begin_next().unwrap();
        assert_eq!(key, "b");
        assert!(queue.is_busy());
        // the head stays queued until it is finished
        assert_eq!(queue.queue_len(), 2);

        queue.finish("b");
        assert!(!queue.is_busy());
        assert_eq!(queue.begin_next().unwrap().0, "a");
    }

    #[test]
    fn test_finish_keeps_queue_and_map_in_lockstep() {
        let now = Instant::now();
        let mut queue: FetchQueue<u32> = FetchQueue::default();
        let _a = queue.attach("1", now);
        let _b = queue.attach("2", now);

        let pending = queue.finish("1").unwrap();
        assert_eq!(pending.key, "1");
        assert!(!queue.is_pending("1"));
        assert_eq!(queue.queue_len(), queue.pending_len());
        assert!(queue.finish("1").is_none());
    }

    #[test]
    fn test_resolve_delivers_same_value_to_all() {
        let now = Instant::now();
        let mut queue: FetchQueue<String> = FetchQueue::default();
        let (mut rx1, _) = queue.attach("k", now);
        let (mut rx2, _) = queue.attach("k", now);

        queue.finish("k").unwrap().resolve(Ok("v".to_string()));

        assert_eq!(rx1.try_recv().unwrap(), Ok("v".to_string()));
        assert_eq!(rx2.try_recv().unwrap(), Ok("v".to_string()));
    }

    #[test]
    fn test_fail_delivers_same_error_to_all() {
        let now = Instant::now();
        let mut queue: FetchQueue<String> = FetchQueue::default();
        let (mut rx1, _) = queue.attach("k", now);
        let (mut rx2, _) = queue.attach("k", now);

        let err = FetchError::NotFound("k".to_string());
        queue.finish("k").unwrap().resolve(Err(err.clone()));

        assert_eq!(rx1.try_recv().unwrap(), Err(err.clone()));
        assert_eq!(rx2.try_recv().unwrap(), Err(err));
    }

    #[test]
    fn test_drain_empties_everything() {
        let now = Instant::now();
        let mut queue: FetchQueue<u32> = FetchQueue::default();
        let _a = queue.attach("1", now);
        let _b = queue.attach("2", now);
        queue.begin_next();

        let drained = queue.drain();

        assert_eq!(drained.len(), 2);
        assert_eq!(queue.queue_len(), 0);
        assert_eq!(queue.pending_len(), 0);
        assert!(!queue.is_busy());
    }
}
