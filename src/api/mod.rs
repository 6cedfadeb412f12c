//! API Module
//!
//! HTTP handlers, rate-limit middleware and routing for the gateway.
//!
//! # Endpoints
//! - `GET /users/:id` - Read a user through the cache
//! - `POST /users` - Create a user
//! - `GET /stats` - Component statistics
//! - `GET /cache/:key` - Entry metadata
//! - `DELETE /cache/:key` - Evict one entry
//! - `DELETE /rate-limit/:client_id` - Reset a client's limits
//! - `DELETE /cache` - Clear the cache
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::*;
pub use middleware::{client_id, rate_limit};
pub use routes::create_router;
