//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::rate_limit::RateLimits;

/// Rejected configuration value.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(pub String);

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Cache entry lifetime in seconds
    pub cache_ttl: u64,
    /// Cache sweep interval in seconds
    pub cleanup_interval: u64,
    /// Long rate-limit window in seconds
    pub rate_limit_window: u64,
    /// Requests admitted per long window
    pub rate_limit_max_requests: u32,
    /// Burst window in seconds
    pub rate_limit_burst_window: u64,
    /// Requests admitted per burst window
    pub rate_limit_burst_capacity: u32,
    /// Rate limiter sweep interval in seconds
    pub rate_limit_cleanup_interval: u64,
    /// Pause between queued backend fetches in milliseconds
    pub queue_tick_ms: u64,
    /// Simulated backing store latency in milliseconds
    pub backend_latency_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `CACHE_TTL` - Cache TTL in seconds (default: 60)
    /// - `CLEANUP_INTERVAL` - Cache sweep frequency in seconds (default: 30)
    /// - `RATE_LIMIT_WINDOW` - Long window in seconds (default: 60)
    /// - `RATE_LIMIT_MAX_REQUESTS` - Requests per long window (default: 100)
    /// - `RATE_LIMIT_BURST_WINDOW` - Burst window in seconds (default: 10)
    /// - `RATE_LIMIT_BURST_CAPACITY` - Requests per burst window (default: 20)
    /// - `RATE_LIMIT_CLEANUP_INTERVAL` - Limiter sweep frequency in seconds (default: 60)
    /// - `QUEUE_TICK_MS` - Pause between queued fetches (default: 100)
    /// - `BACKEND_LATENCY_MS` - Simulated store latency (default: 500)
    ///
    /// Values that fail to parse fall back to their default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            cache_ttl: env_or("CACHE_TTL", defaults.cache_ttl),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            rate_limit_window: env_or("RATE_LIMIT_WINDOW", defaults.rate_limit_window),
            rate_limit_max_requests: env_or(
                "RATE_LIMIT_MAX_REQUESTS",
                defaults.rate_limit_max_requests,
            ),
            rate_limit_burst_window: env_or(
                "RATE_LIMIT_BURST_WINDOW",
                defaults.rate_limit_burst_window,
            ),
            rate_limit_burst_capacity: env_or(
                "RATE_LIMIT_BURST_CAPACITY",
                defaults.rate_limit_burst_capacity,
            ),
            rate_limit_cleanup_interval: env_or(
                "RATE_LIMIT_CLEANUP_INTERVAL",
                defaults.rate_limit_cleanup_interval,
            ),
            queue_tick_ms: env_or("QUEUE_TICK_MS", defaults.queue_tick_ms),
            backend_latency_ms: env_or("BACKEND_LATENCY_MS", defaults.backend_latency_ms),
        }
    }

    /// Rejects settings the components cannot run with: zero capacities and
    /// zero-length windows or intervals.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            (self.max_entries == 0, "MAX_ENTRIES must be greater than zero"),
            (self.cache_ttl == 0, "CACHE_TTL must be greater than zero"),
            (self.cleanup_interval == 0, "CLEANUP_INTERVAL must be greater than zero"),
            (self.rate_limit_window == 0, "RATE_LIMIT_WINDOW must be greater than zero"),
            (
                self.rate_limit_max_requests == 0,
                "RATE_LIMIT_MAX_REQUESTS must be greater than zero",
            ),
            (
                self.rate_limit_burst_window == 0,
                "RATE_LIMIT_BURST_WINDOW must be greater than zero",
            ),
            (
                self.rate_limit_burst_capacity == 0,
                "RATE_LIMIT_BURST_CAPACITY must be greater than zero",
            ),
            (
                self.rate_limit_cleanup_interval == 0,
                "RATE_LIMIT_CLEANUP_INTERVAL must be greater than zero",
            ),
        ];

        match checks.iter().find(|(failed, _)| *failed) {
            Some((_, message)) => Err(ConfigError(message.to_string())),
            None => Ok(()),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval)
    }

    pub fn rate_limit_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cleanup_interval)
    }

    pub fn queue_tick(&self) -> Duration {
        Duration::from_millis(self.queue_tick_ms)
    }

    pub fn backend_latency(&self) -> Duration {
        Duration::from_millis(self.backend_latency_ms)
    }

    pub fn rate_limits(&self) -> RateLimits {
        RateLimits {
            window: Duration::from_secs(self.rate_limit_window),
            max_window_requests: self.rate_limit_max_requests,
            burst_window: Duration::from_secs(self.rate_limit_burst_window),
            burst_capacity: self.rate_limit_burst_capacity,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            max_entries: 1000,
            cache_ttl: 60,
            cleanup_interval: 30,
            rate_limit_window: 60,
            rate_limit_max_requests: 100,
            rate_limit_burst_window: 10,
            rate_limit_burst_capacity: 20,
            rate_limit_cleanup_interval: 60,
            queue_tick_ms: 100,
            backend_latency_ms: 500,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
