//! Provider adapter contracts
//!
//! Adapters are fail-open: they never return an error. A broken upstream
//! yields an empty suggestion list or a failed geocode result, so one
//! outage cannot abort a search.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::{GeocodeResult, SearchQuery, Suggestion};

/// Failure of a single upstream call, handled inside the adapter
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream rejected request: {0}")]
    Rejected(String),
}

impl ProviderError {
    pub fn parse(err: impl std::fmt::Display) -> Self {
        Self::Parse(err.to_string())
    }

    /// Short label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Status { .. } => "status",
            Self::Parse(_) => "parse",
            Self::Timeout(_) => "timeout",
            Self::Rejected(_) => "rejected",
        }
    }
}

/// Autocomplete source
#[async_trait]
pub trait SuggestionProvider: Send + Sync + Debug {
    /// Returns normalized, unranked suggestions; empty on any failure
    async fn suggest(&self, query: &SearchQuery) -> Vec<Suggestion>;

    fn provider_name(&self) -> &'static str;
}

/// Single-address geocoding source
#[async_trait]
pub trait GeocodeProvider: Send + Sync + Debug {
    /// Resolves an address; failures are reported as `GeocodeResult::Failure`
    async fn geocode(&self, address: &str) -> GeocodeResult;

    fn provider_name(&self) -> &'static str;
}
