//! Health check endpoints for orchestration probes

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::api::types::Json;
use serde::Serialize;

use super::state::AppState;

/// Detailed health response with component status
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Health check status
#[derive(Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual component health check
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Simple health check - returns 200 if the service is running
/// Used for basic liveness probes
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
        latency_ms: None,
    };

    (StatusCode::OK, Json(response))
}

/// Readiness check: the query cache must answer; a missing geocoder chain
/// only degrades the service since search still works
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();

    let checks = vec![
        check_cache(&state).await,
        check_rate_limiter(&state).await,
        check_providers(&state),
    ];

    let overall_status = overall(&checks);

    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(checks),
        latency_ms: Some(start.elapsed().as_millis() as u64),
    };

    let status_code = match overall_status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// Liveness check - simple check to verify the service is running
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

fn overall(checks: &[HealthCheck]) -> HealthStatus {
    if checks.iter().any(|c| c.status == HealthStatus::Unhealthy) {
        HealthStatus::Unhealthy
    } else if checks.iter().any(|c| c.status == HealthStatus::Degraded) {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

async fn check_cache(state: &AppState) -> HealthCheck {
    let start = Instant::now();

    let (status, message) = match state.cache.size().await {
        Ok(entries) => (HealthStatus::Healthy, Some(format!("{} entries", entries))),
        Err(e) => (HealthStatus::Unhealthy, Some(e.to_string())),
    };

    HealthCheck {
        name: "query_cache".to_string(),
        status,
        message,
        latency_ms: Some(start.elapsed().as_millis() as u64),
    }
}

async fn check_rate_limiter(state: &AppState) -> HealthCheck {
    let start = Instant::now();
    let clients = state.rate_limiter.tracked_clients().await;

    HealthCheck {
        name: "rate_limiter".to_string(),
        status: HealthStatus::Healthy,
        message: Some(format!("{} clients tracked", clients)),
        latency_ms: Some(start.elapsed().as_millis() as u64),
    }
}

fn check_providers(state: &AppState) -> HealthCheck {
    let providers = state.location_service.providers();

    let (status, message) = if providers.geocoders.is_empty() {
        (
            HealthStatus::Degraded,
            format!("autocomplete: {}; no geocoders configured", providers.autocomplete),
        )
    } else {
        (
            HealthStatus::Healthy,
            format!(
                "autocomplete: {}; geocode: {}",
                providers.autocomplete,
                providers.geocoders.join(" -> ")
            ),
        )
    };

    HealthCheck {
        name: "providers".to_string(),
        status,
        message: Some(message),
        latency_ms: None,
    }
}
