//! Address geocoding result

use serde::{Deserialize, Serialize};

/// A successfully resolved address
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: String,
    pub city: String,
    pub locality: String,
    pub country: String,
    pub provider: String,
}

/// Outcome of resolving one address
///
/// Serialized flat as `{ "success": true, ... }` or
/// `{ "success": false, "error": "..." }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "GeocodeResultWire", try_from = "GeocodeResultWire")]
pub enum GeocodeResult {
    Success(GeocodedAddress),
    Failure { error: String },
}

impl GeocodeResult {
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure { error } => Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeocodeResultWire {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    formatted_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    locality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<GeocodeResult> for GeocodeResultWire {
    fn from(result: GeocodeResult) -> Self {
        match result {
            GeocodeResult::Success(address) => Self {
                success: true,
                latitude: Some(address.latitude),
                longitude: Some(address.longitude),
                formatted_address: Some(address.formatted_address),
                city: Some(address.city),
                locality: Some(address.locality),
                country: Some(address.country),
                provider: Some(address.provider),
                error: None,
            },
            GeocodeResult::Failure { error } => Self {
                success: false,
                latitude: None,
                longitude: None,
                formatted_address: None,
                city: None,
                locality: None,
                country: None,
                provider: None,
                error: Some(error),
            },
        }
    }
}

impl TryFrom<GeocodeResultWire> for GeocodeResult {
    type Error = String;

    fn try_from(wire: GeocodeResultWire) -> Result<Self, Self::Error> {
        if !wire.success {
            return Ok(Self::failure(wire.error.unwrap_or_default()));
        }

        let (Some(latitude), Some(longitude)) = (wire.latitude, wire.longitude) else {
            return Err("successful geocode result without coordinates".to_string());
        };

        Ok(Self::Success(GeocodedAddress {
            latitude,
            longitude,
            formatted_address: wire.formatted_address.unwrap_or_default(),
            city: wire.city.unwrap_or_default(),
            locality: wire.locality.unwrap_or_default(),
            country: wire.country.unwrap_or_default(),
            provider: wire.provider.unwrap_or_default(),
        }))
    }
}
