//! Cache-aware weather aggregation.

use std::future::Future;
use std::sync::Arc;

use crate::cache::{coordinate_key, forecast_key, CacheLayer, Partition};
use crate::error::{UpstreamError, WeatherError};
use crate::provider::WeatherProvider;
use crate::types::WeatherSnapshot;

/// Forecast length used by [`WeatherService::all_weather_data`], in days.
pub const ALL_DATA_DAYS: u32 = 16;
/// Forecast length used by [`WeatherService::all_weather_data`], in hours.
pub const ALL_DATA_HOURS: u32 = 120;

/// Read-through cache in front of a [`WeatherProvider`].
#[derive(Clone)]
pub struct WeatherService {
    provider: Arc<dyn WeatherProvider>,
    cache: Arc<CacheLayer>,
}

impl WeatherService {
    pub fn new(provider: Arc<dyn WeatherProvider>, cache: Arc<CacheLayer>) -> Self {
        Self { provider, cache }
    }

    pub async fn current_weather(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, WeatherError> {
        tracing::info!("Fetching current weather for lat: {}, lon: {}", lat, lon);
        let key = coordinate_key(lat, lon);
        self.read_through(Partition::CurrentWeather, &key, || {
            self.provider.current(lat, lon)
        })
        .await
    }

    pub async fn daily_forecast(
        &self,
        lat: f64,
        lon: f64,
        days: u32,
    ) -> Result<WeatherSnapshot, WeatherError> {
        tracing::info!(
            "Fetching daily forecast for lat: {}, lon: {}, days: {}",
            lat,
            lon,
            days
        );
        let key = forecast_key(lat, lon, days);
        self.read_through(Partition::DailyForecast, &key, || {
            self.provider.daily(lat, lon, days)
        })
        .await
    }

    pub async fn hourly_forecast(
        &self,
        lat: f64,
        lon: f64,
        hours: u32,
    ) -> Result<WeatherSnapshot, WeatherError> {
        tracing::info!(
            "Fetching hourly forecast for lat: {}, lon: {}, hours: {}",
            lat,
            lon,
            hours
        );
        let key = forecast_key(lat, lon, hours);
        self.read_through(Partition::HourlyForecast, &key, || {
            self.provider.hourly(lat, lon, hours)
        })
        .await
    }

    /// Current conditions plus 16-day and 120-hour forecasts in one snapshot.
    ///
    /// Not cached itself: each part goes through its own partition. A part
    /// that fails or comes back empty is left as `None`; the call as a whole
    /// never fails.
    pub async fn all_weather_data(&self, lat: f64, lon: f64) -> WeatherSnapshot {
        tracing::info!("Fetching all weather data for lat: {}, lon: {}", lat, lon);

        let (current, daily, hourly) = tokio::join!(
            self.current_weather(lat, lon),
            self.daily_forecast(lat, lon, ALL_DATA_DAYS),
            self.hourly_forecast(lat, lon, ALL_DATA_HOURS),
        );

        let mut merged = WeatherSnapshot::at(lat, lon);

        match current {
            Ok(snapshot) => merged.current = snapshot.current,
            Err(e) => tracing::warn!("Omitting current weather for {}_{}: {}", lat, lon, e),
        }
        match daily {
            Ok(snapshot) => merged.daily = snapshot.daily.filter(|days| !days.is_empty()),
            Err(e) => tracing::warn!("Omitting daily forecast for {}_{}: {}", lat, lon, e),
        }
        match hourly {
            Ok(snapshot) => merged.hourly = snapshot.hourly.filter(|hours| !hours.is_empty()),
            Err(e) => tracing::warn!("Omitting hourly forecast for {}_{}: {}", lat, lon, e),
        }

        merged
    }

    async fn read_through<F, Fut>(
        &self,
        partition: Partition,
        key: &str,
        fetch: F,
    ) -> Result<WeatherSnapshot, WeatherError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<WeatherSnapshot, UpstreamError>>,
    {
        if let Some(hit) = self.cache.get(partition.name(), key).await? {
            return Ok(hit);
        }

        let snapshot = fetch().await.map_err(|e| {
            tracing::error!("Upstream fetch for {}/{} failed: {}", partition.name(), key, e);
            e
        })?;

        self.cache.put(partition.name(), key, &snapshot).await?;
        Ok(snapshot)
    }
}
