//! Ingress rate limiting middleware
//!
//! Runs before any handler so a rejected request never reaches the
//! location service or an upstream provider.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::infrastructure::observability::record_rate_limit_rejection;
use crate::infrastructure::rate_limit::RateLimitResult;

const UNKNOWN_CLIENT: &str = "unknown";

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let trust_forwarded_for = state.rate_limiter.config().trust_forwarded_for;
    let client_id = client_id(&request, trust_forwarded_for);
    let result = state.rate_limiter.check_and_record(&client_id).await;

    if !result.allowed {
        return rejection(&client_id, &result);
    }

    let mut response = next.run(request).await;
    insert_limit_headers(response.headers_mut(), &result);
    response
}

/// The socket peer, else `"unknown"`. With `trust_forwarded_for` the first
/// `X-Forwarded-For` hop wins over the peer.
pub fn client_id(request: &Request<Body>, trust_forwarded_for: bool) -> String {
    trust_forwarded_for
        .then(|| forwarded_for(request.headers()))
        .flatten()
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

fn rejection(client_id: &str, result: &RateLimitResult) -> Response {
    let Some(limit_type) = result.limit_type else {
        return ApiError::rate_limited("Too many requests").into_response();
    };

    warn!(
        client = %client_id,
        limit = %limit_type,
        reset_in_ms = result.reset_in.as_millis() as u64,
        "Rate limit exceeded"
    );
    record_rate_limit_rejection(&limit_type.to_string());

    let message = format!(
        "Rate limit exceeded ({} limit of {} requests); retry in {} ms",
        limit_type,
        result.limit,
        result.reset_in.as_millis()
    );

    let mut response = ApiError::rate_limited(message)
        .with_code(limit_type.code())
        .into_response();

    let headers = response.headers_mut();
    headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs(result)));
    insert_limit_headers(headers, result);

    response
}

/// Whole seconds, rounded up, never zero
fn retry_after_secs(result: &RateLimitResult) -> u64 {
    (result.reset_in.as_millis() as u64).div_ceil(1000).max(1)
}

fn insert_limit_headers(headers: &mut HeaderMap, result: &RateLimitResult) {
    headers.insert("x-ratelimit-limit", HeaderValue::from(result.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(result.remaining));
}
