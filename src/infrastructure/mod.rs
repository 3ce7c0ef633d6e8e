//! Infrastructure layer - External service implementations

pub mod cache;
pub mod geocoding;
pub mod logging;
pub mod observability;
pub mod rate_limit;
pub mod services;
