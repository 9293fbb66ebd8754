use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Environment variable that overrides the config file location
pub const CONFIG_PATH_ENV: &str = "SKYCAST_CONFIG";

/// Environment variable that overrides the Weatherbit API key
pub const API_KEY_ENV: &str = "WEATHERBIT_API_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a single-line message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Weatherbit provider settings
    #[serde(default)]
    pub weather: WeatherProviderConfig,

    /// Nominatim geocoding settings
    #[serde(default)]
    pub geocoding: GeocodingConfig,

    /// Cache partition lifetimes
    #[serde(default)]
    pub cache: CacheConfig,

    /// Forecast history database
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the API listens on
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherProviderConfig {
    /// Weatherbit API root, e.g. https://api.weatherbit.io/v2.0
    pub base_url: String,

    /// Weatherbit API key (can be set via WEATHERBIT_API_KEY)
    #[serde(default)]
    pub api_key: String,

    /// Outbound request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transient upstream failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

impl Default for WeatherProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.weatherbit.io/v2.0".to_string(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Nominatim API root
    pub base_url: String,

    /// User agent sent to Nominatim (required by its usage policy)
    pub user_agent: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "SkyCast/0.1.0".to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Time-to-live per cache partition, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub current_weather_ttl_secs: u64,
    pub daily_forecast_ttl_secs: u64,
    pub hourly_forecast_ttl_secs: u64,
    pub location_geocode_ttl_secs: u64,
    /// Used for any partition without its own entry
    pub default_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            current_weather_ttl_secs: 900,
            daily_forecast_ttl_secs: 3600,
            hourly_forecast_ttl_secs: 1800,
            location_geocode_ttl_secs: 86400,
            default_ttl_secs: 1800,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// SQLite database holding historical forecast records
    pub database_path: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        let database_path = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skycast")
            .join("forecasts.db");
        Self { database_path }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist.
    ///
    /// The location can be overridden with `SKYCAST_CONFIG`.
    pub fn load() -> Result<Self> {
        let config_path = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => PathBuf::from(path),
            Err(_) => Self::config_path()?,
        };
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, writing defaults there if it is missing.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut config = if config_path.exists() {
            let contents =
                std::fs::read_to_string(config_path).context("Failed to read config file")?;
            toml::from_str::<Config>(&contents)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?
        } else {
            tracing::info!("No config at {}, writing defaults", config_path.display());
            let config = Self::default();
            config.save_to(config_path)?;
            config
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            config.weather.api_key = key;
        }

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged. Returns an error if validation finds critical errors.
    pub fn load_validated() -> Result<Self> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(config)
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(&self.weather.base_url, "weather.base_url", &mut result);
        validate_url(&self.geocoding.base_url, "geocoding.base_url", &mut result);

        if self.server.bind_addr.parse::<std::net::SocketAddr>().is_err() {
            result.add_error(
                "server.bind_addr",
                format!("Not a socket address: {}", self.server.bind_addr),
            );
        }

        if self.weather.timeout_secs == 0 {
            result.add_error("weather.timeout_secs", "Timeout must be greater than 0");
        } else if self.weather.timeout_secs > 120 {
            result.add_warning("weather.timeout_secs", "Timeout is unusually long (>120s)");
        }
        if self.geocoding.timeout_secs == 0 {
            result.add_error("geocoding.timeout_secs", "Timeout must be greater than 0");
        }

        if self.weather.api_key.trim().is_empty() {
            result.add_warning(
                "weather.api_key",
                format!("No API key configured (set {})", API_KEY_ENV),
            );
        }

        let ttls = [
            ("cache.current_weather_ttl_secs", self.cache.current_weather_ttl_secs),
            ("cache.daily_forecast_ttl_secs", self.cache.daily_forecast_ttl_secs),
            ("cache.hourly_forecast_ttl_secs", self.cache.hourly_forecast_ttl_secs),
            ("cache.location_geocode_ttl_secs", self.cache.location_geocode_ttl_secs),
            ("cache.default_ttl_secs", self.cache.default_ttl_secs),
        ];
        for (field, ttl) in ttls {
            if ttl == 0 {
                result.add_error(field, "TTL must be greater than 0");
            }
        }

        result
    }

    /// Save configuration to the given file, creating parent directories.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("skycast");

        Ok(config_dir.join("config.toml"))
    }
}

fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}
