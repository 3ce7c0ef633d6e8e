//! Versioned location API

pub mod locations;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use super::middleware::rate_limit_middleware;
use super::state::AppState;

/// Create v1 API router; every route sits behind the rate limiter
pub fn create_v1_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/locations/search", get(locations::search_locations))
        .route("/locations/geocode", post(locations::geocode_address))
        .route_layer(middleware::from_fn_with_state(state, rate_limit_middleware))
}
