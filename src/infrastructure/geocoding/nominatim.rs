use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::http_client::HttpClientTrait;
use super::{coordinate, first_present};
use crate::domain::geo::{build_suggestion, RawPlace};
use crate::domain::{
    GeocodeProvider, GeocodeResult, GeocodedAddress, ProviderError, SearchQuery, Suggestion,
    SuggestionProvider,
};
use crate::infrastructure::observability::record_provider_failure;

const DEFAULT_NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";
const PROVIDER_NAME: &str = "nominatim";

/// Half-width in degrees of the viewbox placed around a bias point
const BIAS_VIEWBOX_DEGREES: f64 = 0.25;

/// OpenStreetMap Nominatim provider, used for autocomplete and as the
/// open-data geocoding fallback
#[derive(Debug)]
pub struct NominatimProvider<C: HttpClientTrait> {
    client: C,
    base_url: String,
    default_country: String,
}

impl<C: HttpClientTrait> NominatimProvider<C> {
    pub fn new(client: C, default_country: impl Into<String>) -> Self {
        Self::with_base_url(client, DEFAULT_NOMINATIM_BASE_URL, default_country)
    }

    pub fn with_base_url(
        client: C,
        base_url: impl Into<String>,
        default_country: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            default_country: default_country.into(),
        }
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }

    fn base_params(text: &str, limit: usize) -> Vec<(&'static str, String)> {
        vec![
            ("q", text.trim().to_string()),
            ("format", "jsonv2".to_string()),
            ("addressdetails", "1".to_string()),
            ("limit", limit.to_string()),
        ]
    }

    fn build_query(&self, query: &SearchQuery) -> Vec<(&'static str, String)> {
        let mut params = Self::base_params(&query.query, query.limit);

        if let Some(ref lang) = query.language {
            params.push(("accept-language", lang.clone()));
        }

        if let Some(bias) = query.bias {
            // Unbounded viewbox: preferred area, not a filter
            params.push((
                "viewbox",
                format!(
                    "{},{},{},{}",
                    bias.lon - BIAS_VIEWBOX_DEGREES,
                    bias.lat + BIAS_VIEWBOX_DEGREES,
                    bias.lon + BIAS_VIEWBOX_DEGREES,
                    bias.lat - BIAS_VIEWBOX_DEGREES,
                ),
            ));
        }

        params
    }

    async fn fetch_places(
        &self,
        params: Vec<(&'static str, String)>,
    ) -> Result<Vec<NominatimPlace>, ProviderError> {
        let json = self
            .client
            .get_json(&self.search_url(), &params, &[])
            .await?;

        let records: Vec<serde_json::Value> =
            serde_json::from_value(json).map_err(ProviderError::parse)?;

        let places = records
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<NominatimPlace>(value) {
                Ok(place) => Some(place),
                Err(e) => {
                    debug!(provider = PROVIDER_NAME, error = %e, "Skipping malformed record");
                    None
                }
            })
            .collect();

        Ok(places)
    }

    async fn lookup_address(&self, address: &str) -> Result<GeocodedAddress, ProviderError> {
        let places = self.fetch_places(Self::base_params(address, 1)).await?;

        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Rejected("no results".to_string()))?;

        let (Some(latitude), Some(longitude)) = (
            place.lat.as_ref().and_then(coordinate),
            place.lon.as_ref().and_then(coordinate),
        ) else {
            return Err(ProviderError::Parse("result has no coordinates".to_string()));
        };

        let addr = &place.address;

        Ok(GeocodedAddress {
            latitude,
            longitude,
            formatted_address: place.display_name.clone().unwrap_or_default(),
            city: addr.city_name().unwrap_or_default(),
            locality: addr.locality_name().unwrap_or_default(),
            country: first_present([&addr.country])
                .unwrap_or_else(|| self.default_country.clone()),
            provider: PROVIDER_NAME.to_string(),
        })
    }
}

#[async_trait]
impl<C: HttpClientTrait> SuggestionProvider for NominatimProvider<C> {
    async fn suggest(&self, query: &SearchQuery) -> Vec<Suggestion> {
        match self.fetch_places(self.build_query(query)).await {
            Ok(places) => places
                .into_iter()
                .map(|place| {
                    build_suggestion(PROVIDER_NAME, place.into_raw(), &self.default_country)
                })
                .collect(),
            Err(e) => {
                warn!(provider = PROVIDER_NAME, error = %e, "Autocomplete request failed");
                record_provider_failure(PROVIDER_NAME, "suggest", e.kind());
                Vec::new()
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

#[async_trait]
impl<C: HttpClientTrait> GeocodeProvider for NominatimProvider<C> {
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

// Nominatim API types (format=jsonv2)

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NominatimPlace {
    lat: Option<serde_json::Value>,
    lon: Option<serde_json::Value>,
    display_name: Option<String>,
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    addresstype: Option<String>,
    osm_id: Option<i64>,
    osm_type: Option<String>,
    address: NominatimAddress,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NominatimAddress {
    road: Option<String>,
    house_number: Option<String>,
    suburb: Option<String>,
    neighbourhood: Option<String>,
    quarter: Option<String>,
    city_district: Option<String>,
    village: Option<String>,
    hamlet: Option<String>,
    town: Option<String>,
    city: Option<String>,
    county: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
}

impl NominatimAddress {
    fn city_name(&self) -> Option<String> {
        first_present([&self.city, &self.town, &self.village, &self.county])
    }

    fn locality_name(&self) -> Option<String> {
        first_present([
            &self.suburb,
            &self.neighbourhood,
            &self.quarter,
            &self.city_district,
        ])
    }
}

impl NominatimPlace {
    fn into_raw(self) -> RawPlace {
        let addr = &self.address;

        RawPlace {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            street: addr.road.clone(),
            house_number: addr.house_number.clone(),
            explicit_locality: addr.locality_name(),
            sub_locality: first_present([
                &addr.suburb,
                &addr.neighbourhood,
                &addr.village,
                &addr.hamlet,
            ]),
            city: addr.city_name(),
            state: addr.state.clone(),
            postal_code: addr.postcode.clone(),
            country: addr.country.clone(),
            place_type: first_present([&self.kind, &self.addresstype]),
            latitude: self.lat.as_ref().and_then(coordinate),
            longitude: self.lon.as_ref().and_then(coordinate),
            osm_id: self.osm_id,
            osm_type: self.osm_type.clone(),
        }
    }
}
