//! Upstream weather provider.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::error::UpstreamError;
use crate::retry::{with_retry, RetryConfig};
use crate::types::WeatherSnapshot;

/// Source of raw weather snapshots.
///
/// Each call returns a snapshot with exactly the requested kind populated,
/// or fails. It never hands back a partial object on failure.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, UpstreamError>;

    async fn daily(&self, lat: f64, lon: f64, days: u32) -> Result<WeatherSnapshot, UpstreamError>;

    async fn hourly(&self, lat: f64, lon: f64, hours: u32)
        -> Result<WeatherSnapshot, UpstreamError>;
}

/// Weatherbit REST client.
#[derive(Debug, Clone)]
pub struct WeatherbitClient {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
    retry: RetryConfig,
}

impl WeatherbitClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            retry: RetryConfig::default(),
        })
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch(
        &self,
        path: &str,
        params: &[(&str, String)],
        what: &str,
    ) -> Result<WeatherSnapshot, UpstreamError> {
        let url = format!("{}/{}", self.base_url, path);

        let response = with_retry(&self.retry, || {
            self.client
                .get(&url)
                .query(params)
                .query(&[("key", self.api_key.as_str())])
                .send()
        })
        .await
        .map_err(|e| {
            let e = UpstreamError::from(e);
            tracing::error!("Network error fetching {}: {}", what, e);
            e
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Error fetching {}: status {}", what, status);
            return Err(UpstreamError::Provider(format!(
                "{} returned {}: {}",
                what, status, body
            )));
        }

        response.json::<WeatherSnapshot>().await.map_err(|e| {
            let e = e.without_url();
            tracing::error!("Error decoding {}: {}", what, e);
            UpstreamError::Provider(format!("Malformed {} response: {}", what, e))
        })
    }
}

#[async_trait]
impl WeatherProvider for WeatherbitClient {
    #[instrument(skip(self), level = "debug")]
    async fn current(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, UpstreamError> {
        let params = [("lat", lat.to_string()), ("lon", lon.to_string())];
        self.fetch("current", &params, "current weather").await
    }

    #[instrument(skip(self), level = "debug")]
    async fn daily(&self, lat: f64, lon: f64, days: u32) -> Result<WeatherSnapshot, UpstreamError> {
        let params = [
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("days", days.to_string()),
        ];
        self.fetch("forecast/daily", &params, "daily forecast").await
    }

    #[instrument(skip(self), level = "debug")]
    async fn hourly(
        &self,
        lat: f64,
        lon: f64,
        hours: u32,
    ) -> Result<WeatherSnapshot, UpstreamError> {
        let params = [
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("hours", hours.to_string()),
        ];
        self.fetch("forecast/hourly", &params, "hourly forecast").await
    }
}
