//! Location resolution domain - suggestions, geocoding results and provider contracts

mod geocode;
pub mod normalize;
mod provider;
mod query;
mod ranking;
mod suggestion;

pub use geocode::{GeocodeResult, GeocodedAddress};
pub use normalize::{build_suggestion, filter_by_country, RawPlace};
pub use provider::{GeocodeProvider, ProviderError, SuggestionProvider};
pub use query::SearchQuery;
pub use ranking::{SuggestionRanker, DEFAULT_LOCALITY_TYPES};
pub use suggestion::{GeoPoint, Suggestion};

#[cfg(test)]
pub use provider::mock::{MockGeocodeProvider, MockSuggestionProvider};
#[cfg(test)]
pub(crate) use suggestion::fixtures;
