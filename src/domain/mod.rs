//! Domain layer - Core location resolution types and traits

pub mod cache;
pub mod clock;
pub mod error;
pub mod geo;
pub mod rate_limit;

pub use cache::{Cache, CacheExt, CacheKeyGenerator, CacheKeyParams, DefaultKeyGenerator};
pub use clock::{Clock, SystemClock};
pub use error::DomainError;
pub use geo::{
    GeoPoint, GeocodeProvider, GeocodeResult, GeocodedAddress, ProviderError, SearchQuery,
    Suggestion, SuggestionProvider, SuggestionRanker,
};
pub use rate_limit::{RateLimitConfig, RateWindow};
