//! Router harness with stubbed providers.
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use skycast_api::{router, AppState};
use skycast_history::ForecastStore;
use skycast_weather::{
    CacheError, CacheLayer, CachePolicy, CacheStore, CurrentConditions, DailyForecast,
    GeocodingProvider, HourlyForecast, LocationService, Place, UpstreamError, WeatherProvider,
    WeatherService, WeatherSnapshot,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

#[derive(Default)]
pub struct StubProvider {
    pub fail_current: AtomicBool,
    pub current_calls: AtomicUsize,
    pub horizons: Mutex<Vec<String>>,
}

#[async_trait]
impl WeatherProvider for StubProvider {
    async fn current(&self, _lat: f64, _lon: f64) -> Result<WeatherSnapshot, UpstreamError> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_current.load(Ordering::SeqCst) {
            return Err(UpstreamError::Network("connection refused".into()));
        }
        Ok(WeatherSnapshot {
            city_name: Some("Bengaluru".into()),
            current: Some(CurrentConditions {
                temp: Some(22.0),
                ..CurrentConditions::default()
            }),
            ..WeatherSnapshot::default()
        })
    }

    async fn daily(&self, _lat: f64, _lon: f64, days: u32) -> Result<WeatherSnapshot, UpstreamError> {
        self.horizons.lock().unwrap().push(format!("days={}", days));
        Ok(WeatherSnapshot {
            daily: Some(vec![DailyForecast {
                valid_date: Some("2024-01-01".into()),
                max_temp: Some(25.0),
                min_temp: Some(15.0),
                ..DailyForecast::default()
            }]),
            ..WeatherSnapshot::default()
        })
    }

    async fn hourly(
        &self,
        _lat: f64,
        _lon: f64,
        hours: u32,
    ) -> Result<WeatherSnapshot, UpstreamError> {
        self.horizons.lock().unwrap().push(format!("hours={}", hours));
        Ok(WeatherSnapshot {
            hourly: Some(vec![HourlyForecast {
                timestamp_local: Some("2024-01-01T06:00:00".into()),
                temp: Some(19.0),
                ..HourlyForecast::default()
            }]),
            ..WeatherSnapshot::default()
        })
    }
}

/// Knows only Paris.
pub struct StubGeocoder;

fn paris() -> Place {
    Place {
        latitude: Some(48.8566),
        longitude: Some(2.3522),
        city: Some("Paris".into()),
        state: Some("Île-de-France".into()),
        country: Some("France".into()),
    }
}

#[async_trait]
impl GeocodingProvider for StubGeocoder {
    async fn search(&self, query: &str) -> Result<Vec<Place>, UpstreamError> {
        if query.eq_ignore_ascii_case("paris") {
            Ok(vec![paris()])
        } else {
            Ok(Vec::new())
        }
    }

    async fn reverse(&self, lat: f64, _lon: f64) -> Result<Option<Place>, UpstreamError> {
        Ok((lat > 0.0).then(paris))
    }
}

pub struct UnreachableStore;

#[async_trait]
impl CacheStore for UnreachableStore {
    fn name(&self) -> &'static str {
        "unreachable"
    }

    async fn get(&self, _: &str, _: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn put(&self, _: &str, _: &str, _: String, _: Duration) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn delete_partition(&self, _: &str) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn delete_all(&self) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn list_partitions(&self) -> Result<Vec<String>, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }
}

pub struct Harness {
    pub router: Router,
    pub provider: Arc<StubProvider>,
    pub history: Arc<ForecastStore>,
    _dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_cache(Arc::new(CacheLayer::in_memory()))
    }

    pub fn with_cache(cache: Arc<CacheLayer>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let history = Arc::new(ForecastStore::new(dir.path().join("forecasts.db")).unwrap());
        let provider = Arc::new(StubProvider::default());

        let state = AppState {
            weather: WeatherService::new(provider.clone(), cache.clone()),
            location: LocationService::new(Arc::new(StubGeocoder), cache.clone()),
            cache,
            history: history.clone(),
        };

        Self {
            router: router(state),
            provider,
            history,
            _dir: dir,
        }
    }

    pub fn unreachable_cache() -> Self {
        Self::with_cache(Arc::new(CacheLayer::new(
            Arc::new(UnreachableStore),
            CachePolicy::default(),
        )))
    }

    /// Send one request; returns the status and the body (JSON when it parses,
    /// otherwise the raw text as a JSON string).
    pub async fn send(&self, method: Method, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri).await
    }
}
