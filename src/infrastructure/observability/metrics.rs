//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use super::config::MetricsConfig;

const MAX_PATH_LABEL_LEN: usize = 50;

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
    path: String,
}

impl PrometheusMetrics {
    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("geo_gateway_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);

            tracing::info!("Prometheus metrics initialized at {}", config.path);

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
                path: config.path.clone(),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

/// Create the metrics router
pub fn create_metrics_router(metrics: PrometheusMetrics) -> Router {
    let path = metrics.path.clone();

    Router::new()
        .route(&path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record an HTTP request metric
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Record a query cache lookup for `operation` ("search" or "geocode")
pub fn record_cache_lookup(operation: &'static str, hit: bool) {
    let outcome = if hit { "hit" } else { "miss" };
    counter!("location_cache_lookups_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
}

/// Record one upstream provider call and its latency
pub fn record_provider_call(provider: &'static str, operation: &'static str, duration: Duration) {
    let labels = [("provider", provider), ("operation", operation)];

    counter!("location_provider_calls_total", &labels).increment(1);
    histogram!("location_provider_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Record an upstream failure that was absorbed by an adapter
pub fn record_provider_failure(provider: &'static str, operation: &'static str, kind: &'static str) {
    counter!(
        "location_provider_failures_total",
        "provider" => provider,
        "operation" => operation,
        "kind" => kind
    )
    .increment(1);
}

/// Record the final outcome of a geocode fallback chain
pub fn record_geocode_outcome(provider: Option<&'static str>) {
    let (outcome, provider) = match provider {
        Some(name) => ("success", name),
        None => ("exhausted", "none"),
    };

    counter!("location_geocode_total", "outcome" => outcome, "provider" => provider).increment(1);
}

/// Record a request rejected at ingress
pub fn record_rate_limit_rejection(limit_type: &str) {
    counter!("rate_limit_rejections_total", "limit" => limit_type.to_string()).increment(1);
}

/// Sanitize URL path for metric labels (replace ID-like segments, limit cardinality)
fn sanitize_path(path: &str) -> String {
    let sanitized = path
        .split('/')
        .map(|segment| if is_id_segment(segment) { "{id}" } else { segment })
        .collect::<Vec<_>>()
        .join("/");

    match sanitized.char_indices().nth(MAX_PATH_LABEL_LEN) {
        Some((idx, _)) => sanitized[..idx].to_string(),
        None => sanitized,
    }
}

fn is_id_segment(segment: &str) -> bool {
    if segment.is_empty() {
        return false;
    }

    let numeric = segment.chars().all(|c| c.is_ascii_digit());
    let uuid_like = segment.len() == 36
        && segment
            .chars()
            .all(|c| c.is_ascii_hexdigit() || c == '-')
        && segment.matches('-').count() == 4;

    numeric || uuid_like
}
