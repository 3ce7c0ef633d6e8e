//! Observability infrastructure - Prometheus metrics

mod config;
mod metrics;

pub use config::MetricsConfig;
pub use metrics::{
    create_metrics_router, init_metrics, record_cache_lookup, record_geocode_outcome,
    record_http_request, record_provider_call, record_provider_failure,
    record_rate_limit_rejection, PrometheusMetrics,
};
