//! Recency Index Module
//!
//! Orders cache keys by last access time for LRU eviction.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

/// Position of a key in the recency order.
///
/// The sequence number breaks ties between keys touched at the same instant,
/// so the earlier touch is always the older one.
type Stamp = (Instant, u64);

// == Recency Index ==
/// Tracks access order for LRU eviction.
///
/// The oldest key is the first entry of `order`; touching a key re-stamps it
/// at the end. All operations are O(log n).
#[derive(Debug, Default)]
pub struct RecencyIndex {
    /// Keys ordered by (last access, touch sequence)
    order: BTreeMap<Stamp, String>,
    /// Current stamp of each tracked key
    stamps: HashMap<String, Stamp>,
    /// Monotonic touch counter
    seq: u64,
}

impl RecencyIndex {
    // == Constructor ==
    /// Creates a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks `key` as used at `at`, making it the most recent entry.
    pub fn touch(&mut self, key: &str, at: Instant) {
        self.seq += 1;
        let stamp = (at, self.seq);

        if let Some(old) = self.stamps.insert(key.to_string(), stamp) {
            self.order.remove(&old);
        }
        self.order.insert(stamp, key.to_string());
    }

    // == Remove ==
    /// Stops tracking `key`.
    pub fn remove(&mut self, key: &str) {
        if let Some(stamp) = self.stamps.remove(key) {
            self.order.remove(&stamp);
        }
    }

    // == Pop Oldest ==
    /// Removes and returns the least recently used key.
    pub fn pop_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.stamps.remove(&key);
        Some(key)
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    #[cfg(test)]
    pub fn peek_oldest(&self) -> Option<&str> {
        self.order.first_key_value().map(|(_, key)| key.as_str())
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.stamps.clear();
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, key: &str) -> bool {
        self.stamps.contains_key(key)
    }
}
