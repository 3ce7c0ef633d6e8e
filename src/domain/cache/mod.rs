//! Cache domain - query cache abstraction

mod key;
mod repository;

pub use key::{canonicalize_text, CacheKeyGenerator, CacheKeyParams, DefaultKeyGenerator};
pub use repository::{Cache, CacheExt};

/// Default lifetime of a cached resolution
pub const DEFAULT_CACHE_TTL: std::time::Duration = std::time::Duration::from_secs(5 * 60);
