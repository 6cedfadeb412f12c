//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with recency tracking and TTL
//! expiration.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, EntryInfo, LatencyWindow, RecencyIndex};
use crate::clock::{system_clock, SharedClock};

// == Cache Store ==
/// Bounded cache with LRU eviction and TTL support.
///
/// None of the operations fail: absence is reported as `None` or `false`.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access order
    recency: RecencyIndex,
    /// Performance counters
    stats: CacheStats,
    /// Rolling request latency samples
    latency: LatencyWindow,
    /// Maximum number of entries allowed
    max_size: usize,
    /// TTL applied when no override is given
    default_ttl: Duration,
    clock: SharedClock,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore driven by the system clock.
    ///
    /// # Arguments
    /// * `max_size` - Maximum number of entries the cache can hold
    /// * `default_ttl` - Lifetime of entries written with `set`
    pub fn new(max_size: usize, default_ttl: Duration) -> Self {
        Self::with_clock(max_size, default_ttl, system_clock())
    }

    /// Creates a new CacheStore reading time from `clock`.
    pub fn with_clock(max_size: usize, default_ttl: Duration, clock: SharedClock) -> Self {
        Self {
            entries: HashMap::new(),
            recency: RecencyIndex::new(),
            stats: CacheStats::new(max_size),
            latency: LatencyWindow::default(),
            max_size,
            default_ttl,
            clock,
        }
    }

    // == Set ==
    /// Stores a value under `key` with the default TTL.
    ///
    /// Overwriting resets the TTL and refreshes recency. Inserting a new key
    /// into a full cache evicts the least recently used entry first.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, None);
    }

    /// Stores a value with an optional TTL override.
    pub fn set_with_ttl(&mut self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let key = key.into();
        if self.max_size == 0 {
            return;
        }

        let now = self.clock.now();
        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite {
            while self.entries.len() >= self.max_size {
                let Some(evicted) = self.recency.pop_oldest() else {
                    break;
                };
                self.entries.remove(&evicted);
                self.stats.record_eviction();
                debug!(key = %evicted, "evicted least recently used entry");
            }
        }

        let entry = CacheEntry::new(value, now, ttl.unwrap_or(self.default_ttl));
        self.entries.insert(key.clone(), entry);
        self.recency.touch(&key, now);
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// A hit refreshes recency and bumps the access count. An expired entry
    /// is removed and counted as a miss.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now();

        let live = self.entries.get(key).map(|entry| !entry.is_expired(now));

        match live {
            Some(true) => {
                let entry = self.entries.get_mut(key)?;
                entry.touch(now);
                let value = entry.value.clone();
                self.recency.touch(key, now);
                self.stats.record_hit();
                Some(value)
            }
            Some(false) => {
                self.remove_entry(key);
                debug!(key, "expired entry dropped on read");
                self.stats.record_miss();
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Has ==
    /// Reports whether a live entry exists, without touching stats or recency.
    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    // == Entry Info ==
    /// Returns metadata for a live entry, without touching stats or recency.
    pub fn entry_info(&self, key: &str) -> Option<EntryInfo> {
        let now = self.clock.now();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| EntryInfo {
                age: entry.age(now),
                access_count: entry.access_count,
                ttl_remaining: entry.ttl_remaining(now),
            })
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether an entry was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_entry(key)
    }

    // == Clear ==
    /// Drops every entry and resets all statistics.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
        self.stats.reset();
        self.latency.clear();
    }

    // == Record Latency ==
    /// Adds a request latency sample to the rolling average.
    pub fn record_latency(&mut self, latency: Duration) {
        self.latency.record(latency);
    }

    // == Stats ==
    /// Returns a snapshot of the current statistics.
    ///
    /// `current_size` counts live entries only; expired entries awaiting the
    /// sweep are left out.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let mut stats = self.stats.clone();
        stats.current_size = self
            .entries
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count();
        stats.average_latency_ms = self.latency.average().as_secs_f64() * 1000.0;
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }
        expired_keys.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        self.recency.remove(key);
        self.entries.remove(key).is_some()
    }
}
