//! Application state for shared services

use std::sync::Arc;

use crate::domain::Cache;
use crate::infrastructure::rate_limit::RateLimiter;
use crate::infrastructure::services::LocationServiceTrait;

/// Application state containing shared services using dynamic dispatch
#[derive(Debug, Clone)]
pub struct AppState {
    pub location_service: Arc<dyn LocationServiceTrait>,
    pub rate_limiter: Arc<RateLimiter>,
    pub cache: Arc<dyn Cache>,
}

impl AppState {
    pub fn new(
        location_service: Arc<dyn LocationServiceTrait>,
        rate_limiter: Arc<RateLimiter>,
        cache: Arc<dyn Cache>,
    ) -> Self {
        Self {
            location_service,
            rate_limiter,
            cache,
        }
    }
}
