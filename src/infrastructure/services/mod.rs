//! Infrastructure services

mod location_service;

pub use location_service::{
    LocationService, LocationServiceConfig, LocationServiceTrait, ProviderSummary,
};
