//! Location resolution service
//!
//! Sits between the HTTP layer and the provider adapters. Every resolution
//! is cached under a canonical key so repeated queries never reach a
//! quota-limited upstream twice within the TTL.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::domain::cache::{Cache, CacheExt, CacheKeyGenerator, CacheKeyParams, DefaultKeyGenerator};
use crate::domain::geo::filter_by_country;
use crate::domain::{
    DomainError, GeocodeProvider, GeocodeResult, ProviderError, SearchQuery, Suggestion,
    SuggestionProvider, SuggestionRanker,
};
use crate::infrastructure::observability::{
    record_cache_lookup, record_geocode_outcome, record_provider_call, record_provider_failure,
};

const SEARCH_NAMESPACE: &str = "search";
const GEOCODE_NAMESPACE: &str = "geocode";

/// Tunables for the location service
#[derive(Debug, Clone)]
pub struct LocationServiceConfig {
    /// Lifetime of cached resolutions
    pub cache_ttl: Duration,
    /// Upper bound for any single provider call
    pub provider_timeout: Duration,
    /// Limit used when the caller gives none
    pub default_limit: usize,
    /// Largest limit a caller may ask for
    pub max_limit: usize,
}

impl Default for LocationServiceConfig {
    fn default() -> Self {
        Self {
            cache_ttl: crate::domain::cache::DEFAULT_CACHE_TTL,
            provider_timeout: Duration::from_secs(5),
            default_limit: SearchQuery::DEFAULT_LIMIT,
            max_limit: 20,
        }
    }
}

impl LocationServiceConfig {
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn with_limits(mut self, default_limit: usize, max_limit: usize) -> Self {
        self.max_limit = max_limit.max(1);
        self.default_limit = default_limit.clamp(1, self.max_limit);
        self
    }
}

/// Trait for the location service (for dynamic dispatch in AppState)
#[async_trait]
pub trait LocationServiceTrait: Send + Sync + Debug {
    /// Ranked autocomplete suggestions for a free-text query
    async fn search(&self, query: SearchQuery) -> Result<Vec<Suggestion>, DomainError>;

    /// Resolves one address through the provider fallback chain
    async fn geocode_address(&self, address: &str) -> GeocodeResult;

    /// Limit applied when a search does not specify one
    fn default_limit(&self) -> usize;

    /// Names of the configured providers, geocoders in fallback order
    fn providers(&self) -> ProviderSummary;
}

/// Provider wiring as reported by readiness checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderSummary {
    pub autocomplete: &'static str,
    pub geocoders: Vec<&'static str>,
}

/// Cache-first orchestrator over the configured providers
#[derive(Debug)]
pub struct LocationService {
    cache: Arc<dyn Cache>,
    autocomplete: Arc<dyn SuggestionProvider>,
    geocoders: Vec<Arc<dyn GeocodeProvider>>,
    ranker: SuggestionRanker,
    key_generator: DefaultKeyGenerator,
    config: LocationServiceConfig,
}

impl LocationService {
    pub fn new(
        cache: Arc<dyn Cache>,
        autocomplete: Arc<dyn SuggestionProvider>,
        geocoders: Vec<Arc<dyn GeocodeProvider>>,
    ) -> Self {
        Self {
            cache,
            autocomplete,
            geocoders,
            ranker: SuggestionRanker::new(),
            key_generator: DefaultKeyGenerator::new(),
            config: LocationServiceConfig::default(),
        }
    }

    pub fn with_ranker(mut self, ranker: SuggestionRanker) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn with_config(mut self, config: LocationServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &LocationServiceConfig {
        &self.config
    }

    fn search_key(&self, query: &SearchQuery) -> String {
        self.key_generator
            .generate_with_namespace(SEARCH_NAMESPACE, &query.cache_params())
    }

    fn geocode_key(&self, address: &str) -> String {
        self.key_generator
            .generate_with_namespace(GEOCODE_NAMESPACE, &CacheKeyParams::new(address))
    }

    fn validate(&self, mut query: SearchQuery) -> Result<SearchQuery, DomainError> {
        if let Some(bias) = query.bias {
            if !bias.is_valid() {
                return Err(DomainError::validation(format!(
                    "bias point ({}, {}) is outside valid coordinates",
                    bias.lat, bias.lon
                )));
            }
        }

        query.query = query.query.trim().to_string();
        query.limit = query.limit.clamp(1, self.config.max_limit.max(1));
        query.language = query.language.filter(|l| !l.trim().is_empty());
        query.country_bias = query.country_bias.filter(|c| !c.trim().is_empty());

        Ok(query)
    }

    /// Cache read that degrades to a miss when the store misbehaves
    async fn cached<V>(&self, operation: &'static str, key: &str) -> Option<V>
    where
        V: serde::de::DeserializeOwned + Send,
    {
        let value: Option<V> = match self.cache.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                None
            }
        };

        record_cache_lookup(operation, value.is_some());
        value
    }

    async fn store<V>(&self, key: &str, value: &V)
    where
        V: serde::Serialize + Send + Sync,
    {
        if let Err(e) = self.cache.set(key, value, self.config.cache_ttl).await {
            warn!(error = %e, key = %key, "Cache write failed");
        }
    }

    async fn call_geocoder(&self, provider: &dyn GeocodeProvider, address: &str) -> GeocodeResult {
        let name = provider.provider_name();
        let started = Instant::now();

        let result =
            match tokio::time::timeout(self.config.provider_timeout, provider.geocode(address)).await {
                Ok(result) => result,
                Err(_) => {
                    let err = ProviderError::Timeout(self.config.provider_timeout);
                    warn!(provider = name, error = %err, "Geocode provider timed out");
                    record_provider_failure(name, "geocode", err.kind());
                    GeocodeResult::failure(err.to_string())
                }
            };

        record_provider_call(name, "geocode", started.elapsed());
        result
    }
}

#[async_trait]
impl LocationServiceTrait for LocationService {
    #[instrument(skip(self, query), fields(query = %query.query, limit = query.limit))]
    async fn search(&self, query: SearchQuery) -> Result<Vec<Suggestion>, DomainError> {
        let query = self.validate(query)?;

        if query.query.is_empty() {
            return Ok(Vec::new());
        }

        let key = self.search_key(&query);

        if let Some(suggestions) = self.cached::<Vec<Suggestion>>(SEARCH_NAMESPACE, &key).await {
            debug!(count = suggestions.len(), "Search cache hit");
            return Ok(suggestions);
        }

        let provider = self.autocomplete.provider_name();
        let started = Instant::now();
        let fetched =
            tokio::time::timeout(self.config.provider_timeout, self.autocomplete.suggest(&query)).await;
        record_provider_call(provider, "suggest", started.elapsed());

        let suggestions = match fetched {
            Ok(suggestions) => suggestions,
            Err(_) => {
                let err = ProviderError::Timeout(self.config.provider_timeout);
                warn!(provider, error = %err, "Autocomplete provider timed out");
                record_provider_failure(provider, "suggest", err.kind());
                return Ok(Vec::new());
            }
        };

        let filtered = filter_by_country(suggestions, query.country_bias.as_deref());
        let mut ranked = self.ranker.rank(filtered);
        ranked.truncate(query.limit);

        self.store(&key, &ranked).await;

        debug!(provider, count = ranked.len(), "Search resolved upstream");
        Ok(ranked)
    }

    #[instrument(skip(self))]
    async fn geocode_address(&self, address: &str) -> GeocodeResult {
        let address = address.trim();

        if address.is_empty() {
            return GeocodeResult::failure("address must not be empty");
        }

        let key = self.geocode_key(address);

        if let Some(result) = self.cached::<GeocodeResult>(GEOCODE_NAMESPACE, &key).await {
            debug!("Geocode cache hit");
            return result;
        }

        if self.geocoders.is_empty() {
            record_geocode_outcome(None);
            return GeocodeResult::failure("no geocoding providers configured");
        }

        let mut errors = Vec::with_capacity(self.geocoders.len());

        for provider in &self.geocoders {
            let name = provider.provider_name();

            match self.call_geocoder(provider.as_ref(), address).await {
                result @ GeocodeResult::Success(_) => {
                    info!(provider = name, "Address geocoded");
                    record_geocode_outcome(Some(name));
                    self.store(&key, &result).await;
                    return result;
                }
                GeocodeResult::Failure { error } => {
                    debug!(provider = name, error = %error, "Falling back to next geocoder");
                    errors.push(format!("{}: {}", name, error));
                }
            }
        }

        warn!(attempts = errors.len(), "All geocoding providers failed");
        record_geocode_outcome(None);

        GeocodeResult::failure(format!(
            "all geocoding providers failed ({})",
            errors.join("; ")
        ))
    }

    fn default_limit(&self) -> usize {
        self.config.default_limit
    }

    fn providers(&self) -> ProviderSummary {
        ProviderSummary {
            autocomplete: self.autocomplete.provider_name(),
            geocoders: self.geocoders.iter().map(|g| g.provider_name()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::mock::ManualClock;
    use crate::domain::geo::fixtures::suggestion;
    use crate::domain::geo::{MockGeocodeProvider, MockSuggestionProvider};
    use crate::domain::{GeoPoint, GeocodedAddress};
    use crate::infrastructure::cache::{InMemoryCache, InMemoryCacheConfig};

    fn resolved(provider: &str) -> GeocodeResult {
        GeocodeResult::Success(GeocodedAddress {
            latitude: 12.9716,
            longitude: 77.5946,
            formatted_address: "MG Road, Bengaluru, Karnataka, India".to_string(),
            city: "Bengaluru".to_string(),
            locality: "Shanthala Nagar".to_string(),
            country: "India".to_string(),
            provider: provider.to_string(),
        })
    }

    fn mixed_suggestions() -> Vec<Suggestion> {
        vec![
            suggestion("Koramangala Indoor Stadium, Bengaluru", "stadium", "India"),
            suggestion("Koramangala, Bengaluru, Karnataka", "suburb", "India"),
            suggestion("Koramangala", "neighbourhood", "India"),
            suggestion("Koramangala Road, Colombo", "residential", "Sri Lanka"),
        ]
    }

    fn chain<const N: usize>(providers: [&Arc<MockGeocodeProvider>; N]) -> Vec<Arc<dyn GeocodeProvider>> {
        providers
            .into_iter()
            .map(|p| p.clone() as Arc<dyn GeocodeProvider>)
            .collect()
    }

    struct Fixture {
        service: LocationService,
        autocomplete: Arc<MockSuggestionProvider>,
        clock: Arc<ManualClock>,
    }

    fn fixture(geocoders: Vec<Arc<dyn GeocodeProvider>>) -> Fixture {
        let clock = Arc::new(ManualClock::default());
        let cache = Arc::new(InMemoryCache::with_clock(
            InMemoryCacheConfig::default(),
            clock.clone(),
        ));
        let autocomplete =
            Arc::new(MockSuggestionProvider::new("photon").with_suggestions(mixed_suggestions()));

        let service = LocationService::new(cache, autocomplete.clone(), geocoders);

        Fixture {
            service,
            autocomplete,
            clock,
        }
    }

    #[tokio::test]
    async fn test_search_ranks_localities_first() {
        let f = fixture(vec![]);

        let results = f.service.search(SearchQuery::new("kora")).await.unwrap();

        let labels: Vec<_> = results.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Koramangala",
                "Koramangala Road, Colombo",
                "Koramangala, Bengaluru, Karnataka",
                "Koramangala Indoor Stadium, Bengaluru",
            ]
        );
    }

    #[tokio::test]
    async fn test_search_is_cached() {
        let f = fixture(vec![]);

        let first = f.service.search(SearchQuery::new("Kora")).await.unwrap();
        let second = f.service.search(SearchQuery::new("  kora ")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(f.autocomplete.calls(), 1);
    }

    #[tokio::test]
    async fn test_search_cache_expires_after_ttl() {
        let f = fixture(vec![]);

        f.service.search(SearchQuery::new("kora")).await.unwrap();

        f.clock.advance(Duration::from_secs(4 * 60 + 59));
        f.service.search(SearchQuery::new("kora")).await.unwrap();
        assert_eq!(f.autocomplete.calls(), 1);

        f.clock.advance(Duration::from_secs(2));
        f.service.search(SearchQuery::new("kora")).await.unwrap();
        assert_eq!(f.autocomplete.calls(), 2);
    }

    #[tokio::test]
    async fn test_search_timeout_returns_empty_and_is_not_cached() {
        let cache = Arc::new(InMemoryCache::new());
        let slow = Arc::new(
            MockSuggestionProvider::new("photon")
                .with_suggestions(mixed_suggestions())
                .with_delay(Duration::from_millis(500)),
        );
        let service = LocationService::new(cache.clone(), slow.clone(), vec![]).with_config(
            LocationServiceConfig::default().with_provider_timeout(Duration::from_millis(20)),
        );

        let first = service.search(SearchQuery::new("kora")).await.unwrap();
        let second = service.search(SearchQuery::new("kora")).await.unwrap();

        assert!(first.is_empty());
        assert!(second.is_empty());
        assert_eq!(slow.calls(), 2);
        assert_eq!(cache.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_applies_country_bias() {
        let f = fixture(vec![]);

        let results = f
            .service
            .search(SearchQuery::new("kora").with_country_bias("LK"))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].country, "Sri Lanka");
    }

    #[tokio::test]
    async fn test_search_truncates_and_clamps_limit() {
        let f = fixture(vec![]);
        let service = f
            .service
            .with_config(LocationServiceConfig::default().with_limits(5, 2));

        let results = service.search(SearchQuery::new("kora").with_limit(50)).await.unwrap();
        assert_eq!(results.len(), 2);

        let results = service.search(SearchQuery::new("kora").with_limit(0)).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_query_skips_provider() {
        let f = fixture(vec![]);

        let results = f.service.search(SearchQuery::new("   ")).await.unwrap();

        assert!(results.is_empty());
        assert_eq!(f.autocomplete.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_bias_is_rejected() {
        let f = fixture(vec![]);

        let err = f
            .service
            .search(SearchQuery::new("kora").with_bias(GeoPoint::new(120.0, 77.0)))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation { .. }));
        assert_eq!(f.autocomplete.calls(), 0);
    }

    #[tokio::test]
    async fn test_search_forwards_trimmed_query() {
        let f = fixture(vec![]);

        f.service
            .search(SearchQuery::new("  kora  ").with_language("en"))
            .await
            .unwrap();

        let sent = f.autocomplete.last_query().unwrap();
        assert_eq!(sent.query, "kora");
        assert_eq!(sent.language.as_deref(), Some("en"));
    }

    #[tokio::test]
    async fn test_geocode_falls_back_in_order() {
        let google = Arc::new(MockGeocodeProvider::failing("google", "ZERO_RESULTS"));
        let nominatim = Arc::new(MockGeocodeProvider::succeeding("nominatim", resolved("nominatim")));
        let f = fixture(chain([&google, &nominatim]));

        let result = f.service.geocode_address("MG Road, Bengaluru").await;

        assert_eq!(result, resolved("nominatim"));
        assert_eq!(google.calls(), 1);
        assert_eq!(nominatim.calls(), 1);
    }

    #[tokio::test]
    async fn test_geocode_stops_at_first_success() {
        let google = Arc::new(MockGeocodeProvider::succeeding("google", resolved("google")));
        let nominatim = Arc::new(MockGeocodeProvider::succeeding("nominatim", resolved("nominatim")));
        let f = fixture(chain([&google, &nominatim]));

        let result = f.service.geocode_address("MG Road").await;

        assert_eq!(result, resolved("google"));
        assert_eq!(nominatim.calls(), 0);
    }

    #[tokio::test]
    async fn test_geocode_success_is_cached() {
        let google = Arc::new(MockGeocodeProvider::succeeding("google", resolved("google")));
        let f = fixture(chain([&google]));

        f.service.geocode_address("MG Road, Bengaluru").await;
        let second = f.service.geocode_address(" mg road, bengaluru").await;

        assert!(second.is_success());
        assert_eq!(google.calls(), 1);
    }

    #[tokio::test]
    async fn test_geocode_all_failed_is_not_cached() {
        let google = Arc::new(MockGeocodeProvider::failing("google", "REQUEST_DENIED"));
        let nominatim = Arc::new(MockGeocodeProvider::failing("nominatim", "no results"));
        let f = fixture(chain([&google, &nominatim]));

        let result = f.service.geocode_address("nowhere").await;
        let error = result.error().unwrap();
        assert!(error.contains("google: REQUEST_DENIED"));
        assert!(error.contains("nominatim: no results"));

        f.service.geocode_address("nowhere").await;
        assert_eq!(google.calls(), 2);
        assert_eq!(nominatim.calls(), 2);
    }

    #[tokio::test]
    async fn test_geocode_timeout_counts_as_failure() {
        let slow = Arc::new(
            MockGeocodeProvider::succeeding("google", resolved("google"))
                .with_delay(Duration::from_millis(500)),
        );
        let nominatim = Arc::new(MockGeocodeProvider::succeeding("nominatim", resolved("nominatim")));
        let f = fixture(chain([&slow, &nominatim]));
        let service = f.service.with_config(
            LocationServiceConfig::default().with_provider_timeout(Duration::from_millis(20)),
        );

        let result = service.geocode_address("MG Road").await;

        assert_eq!(result, resolved("nominatim"));
        assert_eq!(slow.calls(), 1);
    }

    #[tokio::test]
    async fn test_geocode_empty_address() {
        let google = Arc::new(MockGeocodeProvider::succeeding("google", resolved("google")));
        let f = fixture(chain([&google]));

        let result = f.service.geocode_address("   ").await;

        assert!(!result.is_success());
        assert_eq!(google.calls(), 0);
    }

    #[tokio::test]
    async fn test_geocode_without_providers() {
        let f = fixture(vec![]);

        let result = f.service.geocode_address("MG Road").await;
        assert!(result.error().unwrap().contains("no geocoding providers"));
    }

    #[test]
    fn test_config_limits_are_clamped() {
        let config = LocationServiceConfig::default().with_limits(50, 10);
        assert_eq!(config.default_limit, 10);
        assert_eq!(config.max_limit, 10);

        let config = LocationServiceConfig::default().with_limits(0, 0);
        assert_eq!(config.default_limit, 1);
        assert_eq!(config.max_limit, 1);
    }
}
