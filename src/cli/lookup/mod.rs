//! One-shot lookup commands
//!
//! Run a single search or geocode through the same service the API uses and
//! print the result as JSON. Handy for checking provider configuration.

use clap::Args;

use crate::domain::{GeoPoint, SearchQuery};
use crate::infrastructure::services::LocationServiceTrait;

/// Arguments for the search command
#[derive(Args, Clone, Debug)]
pub struct SearchArgs {
    /// Free-text query
    pub query: String,

    /// Maximum number of suggestions
    #[arg(long)]
    pub limit: Option<usize>,

    /// Preferred result language (e.g. "en")
    #[arg(long)]
    pub lang: Option<String>,

    /// Latitude to bias results towards (requires --lon)
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude to bias results towards (requires --lat)
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Keep only suggestions whose country matches
    #[arg(long)]
    pub country: Option<String>,
}

/// Arguments for the geocode command
#[derive(Args, Clone, Debug)]
pub struct GeocodeArgs {
    /// Address to resolve
    pub address: String,
}

impl SearchArgs {
    fn into_query(self, default_limit: usize) -> SearchQuery {
        let mut query = SearchQuery::new(self.query).with_limit(self.limit.unwrap_or(default_limit));

        if let Some(lang) = self.lang {
            query = query.with_language(lang);
        }
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            query = query.with_bias(GeoPoint::new(lat, lon));
        }
        if let Some(country) = self.country {
            query = query.with_country_bias(country);
        }

        query
    }
}

/// Run the search command
pub async fn search(args: SearchArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let (service, _) = crate::build_location_service(&config)?;

    let query = args.into_query(service.default_limit());
    let suggestions = service.search(query).await?;

    println!("{}", serde_json::to_string_pretty(&suggestions)?);

    Ok(())
}

/// Run the geocode command
pub async fn geocode(args: GeocodeArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let (service, _) = crate::build_location_service(&config)?;

    let result = service.geocode_address(&args.address).await;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.is_success() {
        anyhow::bail!("geocoding failed for {:?}", args.address);
    }

    Ok(())
}
