//! Autocomplete search query

use crate::domain::cache::CacheKeyParams;

use super::GeoPoint;

/// Parameters of one autocomplete search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub limit: usize,
    pub language: Option<String>,
    pub bias: Option<GeoPoint>,
    pub country_bias: Option<String>,
}

impl SearchQuery {
    pub const DEFAULT_LIMIT: usize = 5;

    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: Self::DEFAULT_LIMIT,
            language: None,
            bias: None,
            country_bias: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_bias(mut self, bias: GeoPoint) -> Self {
        self.bias = Some(bias);
        self
    }

    pub fn with_country_bias(mut self, country: impl Into<String>) -> Self {
        self.country_bias = Some(country.into());
        self
    }

    /// Key parameters; coordinates are fixed to 6 decimals so float noise
    /// below ~10cm never splits the cache
    pub fn cache_params(&self) -> CacheKeyParams {
        CacheKeyParams::new(&self.query)
            .with_component("limit", self.limit.to_string())
            .with_optional_component("lang", self.language.as_deref().map(normalize_tag))
            .with_optional_component("lat", self.bias.map(|p| format!("{:.6}", p.lat)))
            .with_optional_component("lon", self.bias.map(|p| format!("{:.6}", p.lon)))
            .with_optional_component("country", self.country_bias.as_deref().map(normalize_tag))
    }
}

fn normalize_tag(value: &str) -> String {
    value.trim().to_lowercase()
}
