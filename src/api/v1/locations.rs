//! Location resolution endpoints

use axum::extract::State;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, GeocodeRequest, Json, Query, SearchParams, SearchResponse};
use crate::domain::GeocodeResult;

/// GET /v1/locations/search
pub async fn search_locations(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = params.into_query(state.location_service.default_limit())?;

    debug!(query = %query.query, limit = query.limit, "Location search");

    let suggestions = state.location_service.search(query).await?;

    Ok(Json(SearchResponse { suggestions }))
}

/// POST /v1/locations/geocode
///
/// Exhausting every provider still answers 200 with `success: false`.
pub async fn geocode_address(
    State(state): State<AppState>,
    Json(request): Json<GeocodeRequest>,
) -> Json<GeocodeResult> {
    Json(state.location_service.geocode_address(&request.address).await)
}
