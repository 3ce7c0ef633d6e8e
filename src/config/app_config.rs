use std::time::Duration;

use serde::Deserialize;

use crate::domain::geo::DEFAULT_LOCALITY_TYPES;
use crate::domain::RateLimitConfig;
use crate::infrastructure::geocoding::ProvidersConfig;
use crate::infrastructure::observability::MetricsConfig;

/// Environment variable consulted when no Google key is configured
const GOOGLE_API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
    pub cache: CacheSettings,
    pub rate_limit: RateLimitConfig,
    pub search: SearchConfig,
    pub ranking: RankingConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Query cache sizing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub default_ttl_ms: u64,
    pub max_capacity: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: usize,
    pub max_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Place types ranked ahead of points of interest
    pub locality_types: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            default_ttl_ms: 5 * 60 * 1000,
            max_capacity: 10_000,
        }
    }
}

impl CacheSettings {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            max_limit: 20,
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            locality_types: DEFAULT_LOCALITY_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl AppConfig {
    /// Loads `config/default`, `config/local`, then `APP__*` environment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("providers.geocode_priority")
                    .with_list_parse_key("ranking.locality_types"),
            )
            .build()?;

        let mut app_config: Self = config.try_deserialize()?;
        app_config.apply_env_credentials();
        app_config.validate()?;

        Ok(app_config)
    }

    fn apply_env_credentials(&mut self) {
        if self.providers.google.api_key.is_none() {
            self.providers.google.api_key = std::env::var(GOOGLE_API_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty());
        }
    }

    /// Rejects settings the limiter or search path cannot work with
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let rl = &self.rate_limit;

        if rl.window_ms == 0 {
            return Err(invalid("rate_limit.window_ms must be greater than 0"));
        }

        if rl.per_client_max == 0 || rl.global_max == 0 {
            return Err(invalid("rate_limit maxima must be at least 1"));
        }

        if self.search.max_limit == 0 {
            return Err(invalid("search.max_limit must be at least 1"));
        }

        if self.cache.default_ttl_ms == 0 {
            return Err(invalid("cache.default_ttl_ms must be greater than 0"));
        }

        if self.providers.geocode_priority.is_empty() {
            return Err(invalid("providers.geocode_priority must name at least one provider"));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> config::ConfigError {
    config::ConfigError::Message(message.to_string())
}
