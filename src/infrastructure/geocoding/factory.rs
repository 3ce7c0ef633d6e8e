use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use super::http_client::HttpClient;
use super::{GoogleGeocodeProvider, NominatimProvider, PhotonProvider};
use crate::domain::{DomainError, GeocodeProvider, SuggestionProvider};

/// Upstream geocoding sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Photon,
    Nominatim,
    Google,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Photon => write!(f, "photon"),
            Self::Nominatim => write!(f, "nominatim"),
            Self::Google => write!(f, "google"),
        }
    }
}

/// Endpoint override for a keyless provider
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub base_url: Option<String>,
}

/// Google Geocoding settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub region: Option<String>,
}

/// Provider selection and credentials
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Upper bound for one upstream call
    pub timeout_ms: u64,
    pub user_agent: String,
    /// Country assumed when an upstream record has none
    pub default_country: String,
    pub autocomplete: ProviderKind,
    /// Geocoding fallback chain, highest priority first
    pub geocode_priority: Vec<ProviderKind>,
    pub photon: EndpointConfig,
    pub nominatim: EndpointConfig,
    pub google: GoogleConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            user_agent: concat!("pmp-geo-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
            default_country: "India".to_string(),
            autocomplete: ProviderKind::Photon,
            geocode_priority: vec![ProviderKind::Google, ProviderKind::Nominatim],
            photon: EndpointConfig::default(),
            nominatim: EndpointConfig::default(),
            google: GoogleConfig::default(),
        }
    }
}

impl ProvidersConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Providers wired for the location service
#[derive(Debug, Clone)]
pub struct GeocodingProviders {
    pub autocomplete: Arc<dyn SuggestionProvider>,
    pub geocoders: Vec<Arc<dyn GeocodeProvider>>,
}

/// Factory for creating geocoding providers
#[derive(Debug)]
pub struct GeocodingProviderFactory;

impl GeocodingProviderFactory {
    /// Create every configured provider sharing one HTTP client
    pub fn create(config: &ProvidersConfig) -> Result<GeocodingProviders, DomainError> {
        let http_client = HttpClient::with_timeout(config.timeout(), &config.user_agent)?;

        let autocomplete = Self::create_suggestion_provider(config.autocomplete, config, &http_client)?;

        let mut geocoders = Vec::with_capacity(config.geocode_priority.len());
        for kind in &config.geocode_priority {
            if let Some(provider) = Self::create_geocode_provider(*kind, config, &http_client)? {
                geocoders.push(provider);
            }
        }

        if geocoders.is_empty() {
            return Err(DomainError::configuration(
                "No geocoding provider available; check providers.geocode_priority",
            ));
        }

        info!(
            autocomplete = %config.autocomplete,
            geocoders = ?geocoders.iter().map(|g| g.provider_name()).collect::<Vec<_>>(),
            "Geocoding providers configured"
        );

        Ok(GeocodingProviders {
            autocomplete,
            geocoders,
        })
    }

    fn create_suggestion_provider(
        kind: ProviderKind,
        config: &ProvidersConfig,
        client: &HttpClient,
    ) -> Result<Arc<dyn SuggestionProvider>, DomainError> {
        let country = config.default_country.as_str();

        let provider: Arc<dyn SuggestionProvider> = match kind {
            ProviderKind::Photon => match config.photon.base_url {
                Some(ref url) => Arc::new(PhotonProvider::with_base_url(client.clone(), url, country)),
                None => Arc::new(PhotonProvider::new(client.clone(), country)),
            },
            ProviderKind::Nominatim => Self::create_nominatim(config, client),
            ProviderKind::Google => {
                return Err(DomainError::configuration(
                    "google does not support autocomplete; use photon or nominatim",
                ));
            }
        };

        Ok(provider)
    }

    fn create_geocode_provider(
        kind: ProviderKind,
        config: &ProvidersConfig,
        client: &HttpClient,
    ) -> Result<Option<Arc<dyn GeocodeProvider>>, DomainError> {
        match kind {
            ProviderKind::Nominatim => {
                let provider: Arc<dyn GeocodeProvider> = Self::create_nominatim(config, client);
                Ok(Some(provider))
            }
            ProviderKind::Google => {
                let Some(api_key) = config.google.api_key.as_deref().filter(|k| !k.trim().is_empty())
                else {
                    warn!("Google geocoding skipped: no API key configured");
                    return Ok(None);
                };

                let mut provider = match config.google.base_url {
                    Some(ref url) => GoogleGeocodeProvider::with_base_url(
                        client.clone(),
                        api_key,
                        url,
                        &config.default_country,
                    ),
                    None => GoogleGeocodeProvider::new(client.clone(), api_key, &config.default_country),
                };

                if let Some(ref region) = config.google.region {
                    provider = provider.with_region(region);
                }

                let provider: Arc<dyn GeocodeProvider> = Arc::new(provider);
                Ok(Some(provider))
            }
            ProviderKind::Photon => Err(DomainError::configuration(
                "photon does not support address geocoding; use google or nominatim",
            )),
        }
    }

    fn create_nominatim(config: &ProvidersConfig, client: &HttpClient) -> Arc<NominatimProvider<HttpClient>> {
        let country = config.default_country.as_str();

        Arc::new(match config.nominatim.base_url {
            Some(ref url) => NominatimProvider::with_base_url(client.clone(), url, country),
            None => NominatimProvider::new(client.clone(), country),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProvidersConfig::default();

        assert_eq!(config.autocomplete, ProviderKind::Photon);
        assert_eq!(
            config.geocode_priority,
            vec![ProviderKind::Google, ProviderKind::Nominatim]
        );
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.default_country, "India");
    }

    #[test]
    fn test_google_without_key_is_skipped() {
        let providers = GeocodingProviderFactory::create(&ProvidersConfig::default()).unwrap();

        let names: Vec<_> = providers.geocoders.iter().map(|g| g.provider_name()).collect();
        assert_eq!(names, vec!["nominatim"]);
        assert_eq!(providers.autocomplete.provider_name(), "photon");
    }

    #[test]
    fn test_priority_order_is_preserved() {
        let mut config = ProvidersConfig::default();
        config.geocode_priority = vec![ProviderKind::Nominatim, ProviderKind::Google];
        config.google.api_key = Some("key".to_string());

        let providers = GeocodingProviderFactory::create(&config).unwrap();

        let names: Vec<_> = providers.geocoders.iter().map(|g| g.provider_name()).collect();
        assert_eq!(names, vec!["nominatim", "google"]);
    }

    #[test]
    fn test_google_autocomplete_is_rejected() {
        let mut config = ProvidersConfig::default();
        config.autocomplete = ProviderKind::Google;

        let err = GeocodingProviderFactory::create(&config).unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));
    }

    #[test]
    fn test_empty_chain_is_rejected() {
        let mut config = ProvidersConfig::default();
        config.geocode_priority = vec![ProviderKind::Google];

        assert!(GeocodingProviderFactory::create(&config).is_err());
    }

    #[test]
    fn test_provider_kind_deserializes_lowercase() {
        let kinds: Vec<ProviderKind> = serde_json::from_str(r#"["photon","nominatim","google"]"#).unwrap();
        assert_eq!(kinds.len(), 3);
        assert_eq!(kinds[2].to_string(), "google");
    }

    #[tokio::test]
    async fn test_configured_chain_against_live_endpoints() {
        use crate::domain::{GeocodeResult, SearchQuery};
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [77.6408, 12.9784] },
                    "properties": { "name": "Indiranagar", "type": "district", "city": "Bengaluru", "country": "India" }
                }]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "lat": "12.9352",
                "lon": "77.6245",
                "type": "suburb",
                "name": "Koramangala",
                "display_name": "Koramangala, Bengaluru, Karnataka, India",
                "address": { "suburb": "Koramangala", "city": "Bengaluru", "country": "India" }
            }])))
            .mount(&server)
            .await;

        let mut config = ProvidersConfig::default();
        config.photon.base_url = Some(server.uri());
        config.nominatim.base_url = Some(server.uri());

        let providers = GeocodingProviderFactory::create(&config).unwrap();

        let suggestions = providers.autocomplete.suggest(&SearchQuery::new("indira")).await;
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].provider, "photon");
        assert!(suggestions[0].label.starts_with("Indiranagar"));

        match providers.geocoders[0].geocode("Koramangala, Bengaluru").await {
            GeocodeResult::Success(address) => {
                assert_eq!(address.provider, "nominatim");
                assert!((address.latitude - 12.9352).abs() < 1e-9);
            }
            GeocodeResult::Failure { error } => panic!("geocode failed: {}", error),
        }
    }
}
