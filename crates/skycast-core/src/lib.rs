pub mod config;
pub mod error;

pub use config::{
    CacheConfig, Config, GeocodingConfig, HistoryConfig, ServerConfig, ValidationResult,
    WeatherProviderConfig,
};
pub use error::{AppError, ConfigError, UpstreamFailure};

use anyhow::Result;

/// Initialize logging. `RUST_LOG` overrides the default `info` filter.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::info!("SkyCast core initialized");
    Ok(())
}
