//! API Routes
//!
//! Configures the Axum router with all gateway endpoints.

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_cache_handler, create_user_handler, delete_cache_handler, entry_info_handler,
    get_user_handler, health_handler, reset_client_handler, stats_handler, AppState,
};
use super::middleware::rate_limit;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /users/:id` - Read a user through the cache (rate limited)
/// - `POST /users` - Create a user (rate limited)
/// - `GET /stats` - Cache, queue and rate limiter statistics
/// - `GET /cache/:key` - Metadata of one cache entry
/// - `DELETE /cache/:key` - Evict one cache entry
/// - `DELETE /rate-limit/:client_id` - Forget a client's rate limit state
/// - `DELETE /cache` - Clear the cache
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - Rate limiting on the user routes only
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let users = Router::new()
        .route("/users", post(create_user_handler))
        .route("/users/:id", get(get_user_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    Router::new()
        .merge(users)
        .route("/stats", get(stats_handler))
        .route("/cache", delete(clear_cache_handler))
        .route(
            "/cache/:key",
            get(entry_info_handler).delete(delete_cache_handler),
        )
        .route("/rate-limit/:client_id", delete(reset_client_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
