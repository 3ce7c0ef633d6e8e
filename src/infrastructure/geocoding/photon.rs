use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::http_client::HttpClientTrait;
use super::{coordinate, first_present};
use crate::domain::geo::{build_suggestion, RawPlace};
use crate::domain::{ProviderError, SearchQuery, Suggestion, SuggestionProvider};
use crate::infrastructure::observability::record_provider_failure;

const DEFAULT_PHOTON_BASE_URL: &str = "https://photon.komoot.io";
const PROVIDER_NAME: &str = "photon";

/// Photon (komoot) autocomplete provider
#[derive(Debug)]
pub struct PhotonProvider<C: HttpClientTrait> {
    client: C,
    base_url: String,
    default_country: String,
}

impl<C: HttpClientTrait> PhotonProvider<C> {
    pub fn new(client: C, default_country: impl Into<String>) -> Self {
        Self::with_base_url(client, DEFAULT_PHOTON_BASE_URL, default_country)
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
        format!("{}/api/", self.base_url)
    }

    fn build_query(&self, query: &SearchQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", query.query.trim().to_string()),
            ("limit", query.limit.to_string()),
        ];

        if let Some(ref lang) = query.language {
            params.push(("lang", lang.clone()));
        }

        if let Some(bias) = query.bias {
            params.push(("lat", bias.lat.to_string()));
            params.push(("lon", bias.lon.to_string()));
        }

        params
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<Suggestion>, ProviderError> {
        let params = self.build_query(query);
        let json = self
            .client
            .get_json(&self.search_url(), &params, &[])
            .await?;

        self.parse_response(json)
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<Vec<Suggestion>, ProviderError> {
        let collection: PhotonFeatureCollection =
            serde_json::from_value(json).map_err(ProviderError::parse)?;

        let suggestions = collection
            .features
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<PhotonFeature>(value) {
                Ok(feature) => Some(feature),
                Err(e) => {
                    debug!(provider = PROVIDER_NAME, error = %e, "Skipping malformed feature");
                    None
                }
            })
            .map(|feature| build_suggestion(PROVIDER_NAME, feature.into_raw(), &self.default_country))
            .collect();

        Ok(suggestions)
    }
}

#[async_trait]
impl<C: HttpClientTrait> SuggestionProvider for PhotonProvider<C> {
    async fn suggest(&self, query: &SearchQuery) -> Vec<Suggestion> {
        match self.fetch(query).await {
            Ok(suggestions) => suggestions,
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

// Photon API types

#[derive(Debug, Deserialize)]
struct PhotonFeatureCollection {
    features: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PhotonFeature {
    geometry: PhotonGeometry,
    properties: PhotonProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PhotonGeometry {
    coordinates: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PhotonProperties {
    name: Option<String>,
    street: Option<String>,
    housenumber: Option<String>,
    postcode: Option<String>,
    district: Option<String>,
    locality: Option<String>,
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    osm_value: Option<String>,
    osm_id: Option<i64>,
    osm_type: Option<String>,
}

impl PhotonFeature {
    fn into_raw(self) -> RawPlace {
        let props = self.properties;

        // GeoJSON order is [lon, lat]
        let longitude = self.geometry.coordinates.first().and_then(coordinate);
        let latitude = self.geometry.coordinates.get(1).and_then(coordinate);

        RawPlace {
            explicit_locality: first_present([&props.district, &props.locality]),
            sub_locality: first_present([&props.locality, &props.district]),
            place_type: first_present([&props.osm_value, &props.kind]),
            name: props.name,
            display_name: None,
            street: props.street,
            house_number: props.housenumber,
            city: props.city,
            state: props.state,
            postal_code: props.postcode,
            country: props.country,
            latitude,
            longitude,
            osm_id: props.osm_id,
            osm_type: props.osm_type,
        }
    }
}
