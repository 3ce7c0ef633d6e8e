//! PMP Geo Gateway
//!
//! Location resolution for a hyperlocal marketplace:
//! - Autocomplete suggestions from an upstream provider, normalized and ranked
//! - Address geocoding through an ordered provider fallback chain
//! - TTL query cache in front of every upstream call
//! - Per-client and global rate limits at ingress

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::{Cache, SuggestionRanker};
use infrastructure::{
    cache::{InMemoryCache, InMemoryCacheConfig},
    geocoding::GeocodingProviderFactory,
    rate_limit::RateLimiter,
    services::{LocationService, LocationServiceConfig},
};

/// Create the application state with default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let (location_service, cache) = build_location_service(config)?;
    let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));

    Ok(AppState::new(location_service, rate_limiter, cache))
}

/// Wire cache, providers and ranker into a [`LocationService`]
pub fn build_location_service(
    config: &AppConfig,
) -> anyhow::Result<(Arc<LocationService>, Arc<dyn Cache>)> {
    let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::with_config(
        InMemoryCacheConfig::default()
            .with_max_capacity(config.cache.max_capacity)
            .with_default_ttl(config.cache.default_ttl()),
    ));

    let providers = GeocodingProviderFactory::create(&config.providers)?;

    let service_config = LocationServiceConfig::default()
        .with_cache_ttl(config.cache.default_ttl())
        .with_provider_timeout(config.providers.timeout())
        .with_limits(config.search.default_limit, config.search.max_limit);

    let service = LocationService::new(cache.clone(), providers.autocomplete, providers.geocoders)
        .with_ranker(SuggestionRanker::with_locality_types(
            config.ranking.locality_types.iter().cloned(),
        ))
        .with_config(service_config);

    Ok((Arc::new(service), cache))
}
