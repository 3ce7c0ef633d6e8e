use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use super::http_client::HttpClientTrait;
use crate::domain::{GeocodeProvider, GeocodeResult, GeocodedAddress, ProviderError};
use crate::infrastructure::observability::record_provider_failure;

const DEFAULT_GOOGLE_BASE_URL: &str = "https://maps.googleapis.com";
const PROVIDER_NAME: &str = "google";

/// Google Geocoding API provider
#[derive(Debug)]
pub struct GoogleGeocodeProvider<C: HttpClientTrait> {
    client: C,
    api_key: String,
    base_url: String,
    default_country: String,
    region: Option<String>,
}

impl<C: HttpClientTrait> GoogleGeocodeProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>, default_country: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_GOOGLE_BASE_URL, default_country)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        default_country: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            default_country: default_country.into(),
            region: None,
        }
    }

    /// Region code biasing ambiguous addresses (ccTLD, e.g. "in")
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    fn geocode_url(&self) -> String {
        format!("{}/maps/api/geocode/json", self.base_url)
    }

    fn build_query(&self, address: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("address", address.trim().to_string()),
            ("key", self.api_key.clone()),
        ];

        if let Some(ref region) = self.region {
            params.push(("region", region.clone()));
        }

        params
    }

    async fn lookup_address(&self, address: &str) -> Result<GeocodedAddress, ProviderError> {
        let json = self
            .client
            .get_json(&self.geocode_url(), &self.build_query(address), &[])
            .await?;

        self.parse_response(json)
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<GeocodedAddress, ProviderError> {
        let response: GoogleResponse =
            serde_json::from_value(json).map_err(ProviderError::parse)?;

        if response.status != "OK" {
            let message = match response.error_message {
                Some(detail) => format!("{}: {}", response.status, detail),
                None => response.status,
            };
            return Err(ProviderError::Rejected(message));
        }

        let result = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Rejected("OK status without results".to_string()))?;

        let location = result
            .geometry
            .and_then(|g| g.location)
            .ok_or_else(|| ProviderError::Parse("result has no geometry".to_string()))?;

        let components = &result.address_components;

        Ok(GeocodedAddress {
            latitude: location.lat,
            longitude: location.lng,
            formatted_address: result.formatted_address.clone().unwrap_or_default(),
            city: component(components, &["locality", "postal_town", "administrative_area_level_2"])
                .unwrap_or_default(),
            locality: component(
                components,
                &["sublocality_level_1", "sublocality", "neighborhood"],
            )
            .unwrap_or_default(),
            country: component(components, &["country"])
                .unwrap_or_else(|| self.default_country.clone()),
            provider: PROVIDER_NAME.to_string(),
        })
    }
}

/// First component carrying any of `types`, in preference order
fn component(components: &[GoogleAddressComponent], types: &[&str]) -> Option<String> {
    types.iter().find_map(|wanted| {
        components
            .iter()
            .find(|c| c.types.iter().any(|t| t == wanted))
            .map(|c| c.long_name.trim().to_string())
            .filter(|name| !name.is_empty())
    })
}

#[async_trait]
impl<C: HttpClientTrait> GeocodeProvider for GoogleGeocodeProvider<C> {
    async fn geocode(&self, address: &str) -> GeocodeResult {
        match self.lookup_address(address).await {
            Ok(resolved) => GeocodeResult::Success(resolved),
            Err(e) => {
                warn!(provider = PROVIDER_NAME, error = %e, "Geocode request failed");
                record_provider_failure(PROVIDER_NAME, "geocode", e.kind());
                GeocodeResult::failure(e.to_string())
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

// Google Geocoding API types

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GoogleResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GoogleResult {
    formatted_address: Option<String>,
    geometry: Option<GoogleGeometry>,
    address_components: Vec<GoogleAddressComponent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GoogleGeometry {
    location: Option<GoogleLocation>,
}

#[derive(Debug, Deserialize)]
struct GoogleLocation {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GoogleAddressComponent {
    long_name: String,
    types: Vec<String>,
}
