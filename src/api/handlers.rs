//! API Handlers
//!
//! HTTP request handlers for each gateway endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tokio::sync::RwLock;
use tracing::info;

use crate::cache::{CacheStore, SharedCache};
use crate::clock::{system_clock, SharedClock};
use crate::coalescer::Coalescer;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::models::{
    ClearResponse, ClientResetResponse, CreateUserRequest, DeleteResponse, EntryInfoResponse,
    HealthResponse, StatsResponse, User, UserResponse,
};
use crate::rate_limit::{RateLimiter, SharedRateLimiter};
use crate::store::MemoryUserStore;
use crate::tasks::{spawn_cache_sweep_task, spawn_rate_limit_sweep_task, BackgroundTasks};

/// Application state shared across all handlers.
///
/// Every component is constructed once and handed out by reference-counted
/// handle; nothing lives in a global.
#[derive(Clone)]
pub struct AppState {
    pub cache: SharedCache<User>,
    pub limiter: SharedRateLimiter,
    pub coalescer: Coalescer<User>,
    pub store: Arc<MemoryUserStore>,
}

impl AppState {
    /// Builds the state from configuration and starts its background tasks.
    pub fn from_config(config: &Config) -> (Self, BackgroundTasks) {
        Self::with_clock(config, system_clock())
    }

    /// Same as [`AppState::from_config`] with an injected clock.
    pub fn with_clock(config: &Config, clock: SharedClock) -> (Self, BackgroundTasks) {
        let cache = Arc::new(RwLock::new(CacheStore::with_clock(
            config.max_entries,
            config.cache_ttl(),
            clock.clone(),
        )));
        let limiter = Arc::new(RwLock::new(RateLimiter::with_clock(
            config.rate_limits(),
            clock.clone(),
        )));
        let store = Arc::new(MemoryUserStore::seeded(config.backend_latency()));

        let (coalescer, fetch_worker) =
            Coalescer::spawn_with_clock(store.clone(), cache.clone(), config.queue_tick(), clock);

        let tasks = BackgroundTasks {
            fetch_worker,
            cache_sweep: spawn_cache_sweep_task(cache.clone(), config.cleanup_interval()),
            rate_limit_sweep: spawn_rate_limit_sweep_task(
                limiter.clone(),
                config.rate_limit_cleanup_interval(),
            ),
        };

        let state = Self {
            cache,
            limiter,
            coalescer,
            store,
        };
        (state, tasks)
    }
}

/// Handler for GET /users/:id
///
/// Serves from the cache when possible, otherwise joins the coalesced fetch
/// for the key.
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>> {
    let started = Instant::now();
    let key = parse_user_key(&id)?;

    // write lock: a hit updates recency and stats
    let cached = state.cache.write().await.get(&key);

    let outcome = match cached {
        Some(user) => Ok(UserResponse::new(user, true)),
        None => state
            .coalescer
            .fetch(key.clone())
            .await
            .map(|user| UserResponse::new(user, false))
            .map_err(ApiError::from),
    };

    state.cache.write().await.record_latency(started.elapsed());
    outcome.map(Json)
}

/// Handler for POST /users
///
/// Writes go straight to the backing store and then populate the cache.
pub async fn create_user_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let user = state.store.create(req.into_new_user()).await;
    state.cache.write().await.set(user.key(), user.clone());
    info!(id = user.id, "user created");

    Ok((StatusCode::CREATED, Json(UserResponse::new(user, false))))
}

/// Handler for GET /cache/:key
///
/// Read-only: does not count as a hit and does not refresh recency.
pub async fn entry_info_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<EntryInfoResponse>> {
    let info = state.cache.read().await.entry_info(&key);
    match info {
        Some(info) => Ok(Json(EntryInfoResponse::new(key, info))),
        None => Err(ApiError::NotFound(key)),
    }
}

/// Handler for DELETE /cache/:key
pub async fn delete_cache_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    let deleted = state.cache.write().await.delete(&key);
    Json(DeleteResponse::new(key, deleted))
}

/// Handler for DELETE /cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.cache.write().await.clear();
    info!("cache cleared");
    Json(ClearResponse::new())
}

/// Handler for DELETE /rate-limit/:client_id
pub async fn reset_client_handler(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> Json<ClientResetResponse> {
    let reset = state.limiter.write().await.reset(&client_id);
    if reset {
        info!(client = %client_id, "rate limit state reset");
    }
    Json(ClientResetResponse { client_id, reset })
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await.stats();
    let tracked_clients = state.limiter.read().await.tracked_clients();

    Json(StatsResponse::new(
        cache,
        state.coalescer.stats(),
        tracked_clients,
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// User ids are positive integers; anything else is rejected before it can
/// reach the cache or the queue.
fn parse_user_key(id: &str) -> Result<String> {
    match id.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n.to_string()),
        _ => Err(ApiError::InvalidRequest(format!(
            "User id must be a positive integer, got '{}'",
            id
        ))),
    }
}
