//! Response DTOs for the gateway API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheStats, EntryInfo};
use crate::coalescer::CoalescerStats;
use crate::models::User;
use crate::rate_limit::LimitScope;

/// Response body for GET /users/:id and POST /users
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub data: User,
    /// Whether the value was served from the cache
    pub cached: bool,
}

impl UserResponse {
    pub fn new(data: User, cached: bool) -> Self {
        Self { data, cached }
    }
}

/// Response body for DELETE /cache/:key
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub key: String,
    /// Whether an entry was actually removed
    pub deleted: bool,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>, deleted: bool) -> Self {
        let key = key.into();
        let message = if deleted {
            format!("Key '{}' evicted from cache", key)
        } else {
            format!("Key '{}' was not cached", key)
        };
        Self {
            message,
            key,
            deleted,
        }
    }
}

/// Response body for GET /cache/:key
#[derive(Debug, Clone, Serialize)]
pub struct EntryInfoResponse {
    pub key: String,
    pub age_ms: u64,
    pub access_count: u64,
    pub ttl_remaining_ms: u64,
}

impl EntryInfoResponse {
    pub fn new(key: impl Into<String>, info: EntryInfo) -> Self {
        Self {
            key: key.into(),
            age_ms: info.age.as_millis() as u64,
            access_count: info.access_count,
            ttl_remaining_ms: info.ttl_remaining.as_millis() as u64,
        }
    }
}

/// Response body for DELETE /rate-limit/:client_id
#[derive(Debug, Clone, Serialize)]
pub struct ClientResetResponse {
    pub client_id: String,
    /// Whether the client had any tracked state
    pub reset: bool,
}

/// Response body for DELETE /cache
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
}

impl ClearResponse {
    pub fn new() -> Self {
        Self {
            message: "Cache cleared".to_string(),
        }
    }
}

impl Default for ClearResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Rate limiter section of GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct RateLimiterStats {
    pub tracked_clients: usize,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub cache: CacheStatsBody,
    pub queue: CoalescerStats,
    pub rate_limiter: RateLimiterStats,
}

/// Cache statistics plus the derived hit rate
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsBody {
    #[serde(flatten)]
    pub stats: CacheStats,
    pub hit_rate: f64,
}

impl StatsResponse {
    pub fn new(cache: CacheStats, queue: CoalescerStats, tracked_clients: usize) -> Self {
        let hit_rate = cache.hit_rate();
        Self {
            cache: CacheStatsBody {
                stats: cache,
                hit_rate,
            },
            queue,
            rate_limiter: RateLimiterStats { tracked_clients },
        }
    }
}

/// Body of a 429 answer
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitedResponse {
    pub error: String,
    pub scope: LimitScope,
    /// Seconds until the denying window reopens
    pub retry_after: u64,
}

impl RateLimitedResponse {
    pub fn new(scope: LimitScope, retry_after: u64) -> Self {
        Self {
            error: format!("Too many requests ({} limit exceeded)", scope),
            scope,
            retry_after,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_serialize() {
        let resp = UserResponse::new(User::new(1, "Alice", "alice@example.com"), true);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["data"]["id"], 1);
        assert_eq!(json["cached"], true);
    }

    #[test]
    fn test_entry_info_response_in_millis() {
        let info = EntryInfo {
            age: std::time::Duration::from_millis(1500),
            access_count: 3,
            ttl_remaining: std::time::Duration::from_secs(58),
        };
        let json = serde_json::to_value(EntryInfoResponse::new("1", info)).unwrap();
        assert_eq!(json["key"], "1");
        assert_eq!(json["age_ms"], 1500);
        assert_eq!(json["access_count"], 3);
        assert_eq!(json["ttl_remaining_ms"], 58000);
    }

    #[test]
    fn test_delete_response_messages() {
        assert!(DeleteResponse::new("1", true).message.contains("evicted"));
        assert!(DeleteResponse::new("1", false).message.contains("not cached"));
    }

    #[test]
    fn test_stats_response_flattens_cache_stats() {
        let mut cache = CacheStats::new(10);
        cache.record_hit();
        cache.record_miss();

        let resp = StatsResponse::new(cache, CoalescerStats::default(), 3);
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["cache"]["hits"], 1);
        assert_eq!(json["cache"]["max_size"], 10);
        assert_eq!(json["cache"]["hit_rate"], 0.5);
        assert_eq!(json["queue"]["worker_busy"], false);
        assert_eq!(json["rate_limiter"]["tracked_clients"], 3);
    }

    #[test]
    fn test_rate_limited_response_serialize() {
        let resp = RateLimitedResponse::new(LimitScope::Burst, 4);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["scope"], "burst");
        assert_eq!(json["retry_after"], 4);
        assert!(json["error"].as_str().unwrap().contains("burst"));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
