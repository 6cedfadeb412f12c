//! Rate-limit middleware
//!
//! Admits or rejects each request to the user routes and annotates every
//! answer with the client's current budget.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use super::handlers::AppState;
use crate::models::RateLimitedResponse;
use crate::rate_limit::{LimitScope, RateLimitDecision};

pub const CLIENT_ID_HEADER: &str = "x-client-id";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

static LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
static REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
static RESET_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Client identity used when nothing better is available.
pub const ANONYMOUS_CLIENT: &str = "anonymous";

/// Checks the caller against the rate limiter before running the handler.
///
/// Denied requests never reach the handler and are answered with 429.
pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let client = client_id(&req);

    let (decision, now) = {
        let mut limiter = state.limiter.write().await;
        let decision = limiter.check(&client);
        (decision, limiter.now())
    };

    let mut response = if decision.allowed {
        next.run(req).await
    } else {
        let scope = decision.scope.unwrap_or(LimitScope::Window);
        let retry_after = decision.retry_after_secs().unwrap_or(0);
        warn!(client = %client, %scope, retry_after, "request rate limited");

        let mut denied = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(RateLimitedResponse::new(scope, retry_after)),
        )
            .into_response();
        denied
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
        denied
    };

    apply_rate_limit_headers(response.headers_mut(), &decision, now);
    response
}

/// Resolves the caller's identity.
///
/// Order: explicit client id header, first forwarded-for address, peer
/// address, then [`ANONYMOUS_CLIENT`].
pub fn client_id(req: &Request) -> String {
    let headers = req.headers();

    if let Some(id) = header_str(headers, CLIENT_ID_HEADER) {
        return id.to_string();
    }

    let forwarded = header_str(headers, FORWARDED_FOR_HEADER)
        .and_then(|list| list.split(',').map(str::trim).find(|s| !s.is_empty()));
    if let Some(addr) = forwarded {
        return addr.to_string();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| ANONYMOUS_CLIENT.to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision, now: Instant) {
    let reset_in = decision.reset_at.saturating_duration_since(now);
    let reset_in = chrono::Duration::from_std(reset_in).unwrap_or_else(|_| chrono::Duration::zero());
    let reset_unix = (chrono::Utc::now() + reset_in).timestamp().max(0) as u64;

    headers.insert(LIMIT_HEADER.clone(), HeaderValue::from(decision.limit));
    headers.insert(REMAINING_HEADER.clone(), HeaderValue::from(decision.remaining));
    headers.insert(RESET_HEADER.clone(), HeaderValue::from(reset_unix));
}
