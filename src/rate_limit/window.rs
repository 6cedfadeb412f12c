//! Per-client window state.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::clock::deadline;

// == Limit Scope ==
/// Which gate denied a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitScope {
    /// Short, low-capacity window
    Burst,
    /// Long window
    Window,
}

impl LimitScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitScope::Burst => "burst",
            LimitScope::Window => "window",
        }
    }
}

impl std::fmt::Display for LimitScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Rate Limit State ==
/// Fixed-window counters for one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitState {
    pub window_count: u32,
    pub window_reset_at: Instant,
    pub burst_count: u32,
    pub burst_reset_at: Instant,
}

impl RateLimitState {
    /// State for a client seen for the first time at `now`.
    ///
    /// Both windows are already due, so the first check opens them.
    pub fn new(now: Instant) -> Self {
        Self {
            window_count: 0,
            window_reset_at: now,
            burst_count: 0,
            burst_reset_at: now,
        }
    }

    /// Restarts any window whose reset instant has been reached.
    pub fn roll(&mut self, now: Instant, window: Duration, burst_window: Duration) {
        if now >= self.burst_reset_at {
            self.burst_count = 0;
            self.burst_reset_at = deadline(now, burst_window);
        }
        if now >= self.window_reset_at {
            self.window_count = 0;
            self.window_reset_at = deadline(now, window);
        }
    }

    /// True once both windows have elapsed.
    pub fn is_idle(&self, now: Instant) -> bool {
        now >= self.window_reset_at && now >= self.burst_reset_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_rolls_on_first_use() {
        let now = Instant::now();
        let mut state = RateLimitState::new(now);

        state.roll(now, Duration::from_secs(60), Duration::from_secs(10));

        assert_eq!(state.window_reset_at, now + Duration::from_secs(60));
        assert_eq!(state.burst_reset_at, now + Duration::from_secs(10));
    }

    #[test]
    fn test_roll_resets_only_elapsed_windows() {
        let now = Instant::now();
        let mut state = RateLimitState::new(now);
        state.roll(now, Duration::from_secs(60), Duration::from_secs(10));
        state.window_count = 7;
        state.burst_count = 3;

        let later = now + Duration::from_secs(10);
        state.roll(later, Duration::from_secs(60), Duration::from_secs(10));

        assert_eq!(state.burst_count, 0);
        assert_eq!(state.burst_reset_at, later + Duration::from_secs(10));
        assert_eq!(state.window_count, 7);
        assert_eq!(state.window_reset_at, now + Duration::from_secs(60));
    }

    #[test]
    fn test_roll_with_huge_windows_does_not_overflow() {
        let now = Instant::now();
        let mut state = RateLimitState::new(now);

        state.roll(now, Duration::MAX, Duration::MAX);

        assert!(state.window_reset_at > now);
        assert!(!state.is_idle(now + Duration::from_secs(3600)));
    }

    #[test]
    fn test_is_idle() {
        let now = Instant::now();
        let mut state = RateLimitState::new(now);
        state.roll(now, Duration::from_secs(60), Duration::from_secs(10));

        assert!(!state.is_idle(now + Duration::from_secs(30)));
        assert!(state.is_idle(now + Duration::from_secs(60)));
    }

    #[test]
    fn test_scope_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&LimitScope::Burst).unwrap(), "\"burst\"");
        assert_eq!(LimitScope::Window.to_string(), "window");
    }
}
