use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use skycast_api::AppState;
use skycast_core::{CacheConfig, Config};
use skycast_history::ForecastStore;
use skycast_weather::retry::{DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_DELAY_MS};
use skycast_weather::{
    CacheLayer, CachePolicy, LocationService, MemoryStore, NominatimClient, Partition,
    RetryConfig, WeatherService, WeatherbitClient,
};

fn cache_policy(config: &CacheConfig) -> CachePolicy {
    let secs = Duration::from_secs;
    CachePolicy::new(secs(config.default_ttl_secs))
        .with_ttl(Partition::CurrentWeather.name(), secs(config.current_weather_ttl_secs))
        .with_ttl(Partition::DailyForecast.name(), secs(config.daily_forecast_ttl_secs))
        .with_ttl(Partition::HourlyForecast.name(), secs(config.hourly_forecast_ttl_secs))
        .with_ttl(Partition::LocationGeocode.name(), secs(config.location_geocode_ttl_secs))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    skycast_core::init()?;
    let config = Config::load_validated()?;

    let cache = Arc::new(CacheLayer::new(
        Arc::new(MemoryStore::new()),
        cache_policy(&config.cache),
    ));

    let weatherbit = WeatherbitClient::new(
        &config.weather.base_url,
        &config.weather.api_key,
        Duration::from_secs(config.weather.timeout_secs),
    )
    .context("Failed to build weather client")?
    .with_retry(RetryConfig::new(
        config.weather.max_retries,
        DEFAULT_INITIAL_DELAY_MS,
        DEFAULT_MAX_DELAY_MS,
    ));

    let nominatim = NominatimClient::new(
        &config.geocoding.base_url,
        &config.geocoding.user_agent,
        Duration::from_secs(config.geocoding.timeout_secs),
    )
    .context("Failed to build geocoding client")?;

    let history = ForecastStore::new(&config.history.database_path).with_context(|| {
        format!(
            "Failed to open forecast history at {}",
            config.history.database_path.display()
        )
    })?;

    let state = AppState {
        weather: WeatherService::new(Arc::new(weatherbit), cache.clone()),
        location: LocationService::new(Arc::new(nominatim), cache.clone()),
        cache,
        history: Arc::new(history),
    };

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;
    tracing::info!("SkyCast listening on {}", config.server.bind_addr);

    axum::serve(listener, skycast_api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("SkyCast stopped");
    Ok(())
}
