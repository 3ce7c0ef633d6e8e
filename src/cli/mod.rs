//! CLI module for the geo gateway
//!
//! - `serve`: HTTP API server
//! - `search`: one autocomplete lookup, printed as JSON
//! - `geocode`: one address lookup, printed as JSON

pub mod lookup;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// PMP Geo Gateway - cached, rate-limited location resolution
#[derive(Parser)]
#[command(name = "pmp-geo-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve(serve::ServeArgs),

    /// Resolve a free-text query into ranked suggestions
    Search(lookup::SearchArgs),

    /// Geocode a single address through the provider fallback chain
    Geocode(lookup::GeocodeArgs),
}

/// Loads `.env` and configuration, then installs logging
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    Ok(config)
}
