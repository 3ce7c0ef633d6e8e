//! Upstream geocoding providers
//!
//! Each adapter translates one external API into [`Suggestion`](crate::domain::Suggestion)
//! or [`GeocodeResult`](crate::domain::GeocodeResult) values. Adapters never
//! return errors to callers; failures degrade to an empty list or a failed result.

mod factory;
mod google;
pub mod http_client;
mod nominatim;
mod photon;

pub use factory::{
    EndpointConfig, GeocodingProviderFactory, GeocodingProviders, GoogleConfig, ProviderKind,
    ProvidersConfig,
};
pub use google::GoogleGeocodeProvider;
pub use http_client::{HttpClient, HttpClientTrait};
pub use nominatim::NominatimProvider;
pub use photon::PhotonProvider;

/// Reads a coordinate sent either as a JSON number or a numeric string
pub(crate) fn coordinate(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|v: &f64| v.is_finite())
}

/// First value that is present and not blank, trimmed
pub(crate) fn first_present<const N: usize>(values: [&Option<String>; N]) -> Option<String> {
    values
        .into_iter()
        .flatten()
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .map(str::to_string)
}
