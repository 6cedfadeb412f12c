//! Dual-window rate limiter.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::clock::{system_clock, SharedClock};
use crate::rate_limit::{LimitScope, RateLimitState};

// == Limits ==
/// Capacities and durations of the two windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimits {
    /// Long window duration
    pub window: Duration,
    /// Requests admitted per long window
    pub max_window_requests: u32,
    /// Burst window duration
    pub burst_window: Duration,
    /// Requests admitted per burst window
    pub burst_capacity: u32,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            max_window_requests: 100,
            burst_window: Duration::from_secs(10),
            burst_capacity: 20,
        }
    }
}

// == Decision ==
/// Outcome of a single check.
///
/// A denial is an ordinary value: it carries the gate that refused the request
/// and how long until that gate reopens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Gate that denied the request, `None` when allowed
    pub scope: Option<LimitScope>,
    /// Time until the denying gate reopens, `None` when allowed
    pub retry_after: Option<Duration>,
    /// Capacity of the reported window
    pub limit: u32,
    /// Requests left in the reported window
    pub remaining: u32,
    /// When the reported window resets
    pub reset_at: Instant,
}

impl RateLimitDecision {
    /// Retry hint rounded up to whole seconds.
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after.map(|wait| {
            let secs = wait.as_secs();
            if wait.subsec_nanos() > 0 {
                secs + 1
            } else {
                secs
            }
        })
    }
}

// == Rate Limiter ==
/// Per-client admission control with a burst gate in front of a long window.
///
/// Uses fixed-window counters, so memory and update cost are O(1) per client.
#[derive(Debug)]
pub struct RateLimiter {
    clients: HashMap<String, RateLimitState>,
    limits: RateLimits,
    clock: SharedClock,
}

impl RateLimiter {
    pub fn new(limits: RateLimits) -> Self {
        Self::with_clock(limits, system_clock())
    }

    pub fn with_clock(limits: RateLimits, clock: SharedClock) -> Self {
        Self {
            clients: HashMap::new(),
            limits,
            clock,
        }
    }

    // == Check ==
    /// Decides whether `client_id` may proceed, counting the request if so.
    ///
    /// The burst gate is evaluated first: when both gates are exhausted the
    /// caller gets the shorter, burst-scoped retry hint.
    pub fn check(&mut self, client_id: &str) -> RateLimitDecision {
        let now = self.clock.now();
        let limits = self.limits;

        let state = self
            .clients
            .entry(client_id.to_string())
            .or_insert_with(|| RateLimitState::new(now));
        state.roll(now, limits.window, limits.burst_window);

        if state.burst_count >= limits.burst_capacity {
            debug!(client = client_id, "burst limit reached");
            return RateLimitDecision {
                allowed: false,
                scope: Some(LimitScope::Burst),
                retry_after: Some(state.burst_reset_at - now),
                limit: limits.burst_capacity,
                remaining: 0,
                reset_at: state.burst_reset_at,
            };
        }

        if state.window_count >= limits.max_window_requests {
            debug!(client = client_id, "window limit reached");
            return RateLimitDecision {
                allowed: false,
                scope: Some(LimitScope::Window),
                retry_after: Some(state.window_reset_at - now),
                limit: limits.max_window_requests,
                remaining: 0,
                reset_at: state.window_reset_at,
            };
        }

        state.burst_count += 1;
        state.window_count += 1;

        RateLimitDecision {
            allowed: true,
            scope: None,
            retry_after: None,
            limit: limits.max_window_requests,
            remaining: limits.max_window_requests - state.window_count,
            reset_at: state.window_reset_at,
        }
    }

    // == Cleanup ==
    /// Forgets clients whose windows have both elapsed.
    ///
    /// Returns the number of clients removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now();
        let before = self.clients.len();
        self.clients.retain(|_, state| !state.is_idle(now));
        before - self.clients.len()
    }

    /// Drops all state for one client.
    pub fn reset(&mut self, client_id: &str) -> bool {
        self.clients.remove(client_id).is_some()
    }

    #[cfg(test)]
    pub fn state(&self, client_id: &str) -> Option<&RateLimitState> {
        self.clients.get(client_id)
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    /// Current instant on the limiter's clock.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }
}
