//! Request and response bodies for the location endpoints

use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::domain::{GeoPoint, SearchQuery, Suggestion};

/// Query string of `GET /v1/locations/search`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(default, alias = "q")]
    pub query: String,
    pub limit: Option<usize>,
    pub language: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub country_bias: Option<String>,
}

impl SearchParams {
    /// Builds the search; `lat` and `lon` must come together
    pub fn into_query(self, default_limit: usize) -> Result<SearchQuery, ApiError> {
        let bias = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ApiError::bad_request("lon is required when lat is given").with_param("lon"));
            }
            (None, Some(_)) => {
                return Err(ApiError::bad_request("lat is required when lon is given").with_param("lat"));
            }
        };

        let mut query = SearchQuery::new(self.query).with_limit(self.limit.unwrap_or(default_limit));
        query.language = self.language;
        query.bias = bias;
        query.country_bias = self.country_bias;

        Ok(query)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub suggestions: Vec<Suggestion>,
}

/// Body of `POST /v1/locations/geocode`
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeRequest {
    pub address: String,
}
