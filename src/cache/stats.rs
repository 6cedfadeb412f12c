//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, evictions and
//! request latency.

use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;

/// Number of latency samples kept for the rolling average.
pub const LATENCY_WINDOW: usize = 1000;

// == Cache Stats ==
/// Snapshot of cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of `get` calls
    pub total_requests: u64,
    /// Number of entries evicted to make room
    pub evictions: u64,
    /// Current number of live entries
    pub current_size: usize,
    /// Capacity of the cache
    pub max_size: usize,
    /// Mean of the most recent latency samples, in milliseconds
    pub average_latency_ms: f64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            ..Self::default()
        }
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
        self.total_requests += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
        self.total_requests += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Zeroes every counter, keeping the capacity.
    pub fn reset(&mut self) {
        *self = Self::new(self.max_size);
    }
}

// == Latency Window ==
/// Bounded rolling window of latency samples.
///
/// Keeps a running sum so the average is O(1) to read.
#[derive(Debug)]
pub struct LatencyWindow {
    samples: VecDeque<Duration>,
    total: Duration,
    capacity: usize,
}

impl LatencyWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            total: Duration::ZERO,
            capacity,
        }
    }

    /// Adds a sample, dropping the oldest one once the window is full.
    pub fn record(&mut self, sample: Duration) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() == self.capacity {
            if let Some(oldest) = self.samples.pop_front() {
                self.total -= oldest;
            }
        }
        self.samples.push_back(sample);
        self.total += sample;
    }

    /// Mean of the retained samples, zero when empty.
    pub fn average(&self) -> Duration {
        match self.samples.len() {
            0 => Duration::ZERO,
            n => self.total / n as u32,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.total = Duration::ZERO;
    }
}

impl Default for LatencyWindow {
    fn default() -> Self {
        Self::new(LATENCY_WINDOW)
    }
}
