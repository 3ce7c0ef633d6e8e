//! API request, response and error types

pub mod error;
pub mod extract;
pub mod location;

pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use extract::{Json, Query};
pub use location::{GeocodeRequest, SearchParams, SearchResponse};
