//! Stub providers and stores shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use skycast_weather::{
    CacheError, CacheStore, CurrentConditions, DailyForecast, GeocodingProvider, HourlyForecast,
    Place, UpstreamError, WeatherDescription, WeatherProvider, WeatherSnapshot,
};
use std::time::Duration;

/// What a stubbed provider call should do.
#[derive(Debug, Clone)]
pub enum Reply {
    Snapshot(WeatherSnapshot),
    Network,
    Provider,
}

impl Reply {
    fn resolve(&self) -> Result<WeatherSnapshot, UpstreamError> {
        match self {
            Reply::Snapshot(s) => Ok(s.clone()),
            Reply::Network => Err(UpstreamError::Network("connection refused".into())),
            Reply::Provider => Err(UpstreamError::Provider("503 Service Unavailable".into())),
        }
    }
}

pub fn clear_sky() -> WeatherDescription {
    WeatherDescription {
        description: Some("Clear".into()),
        icon: Some("c01d".into()),
        code: Some("800".into()),
    }
}

pub fn current_snapshot() -> WeatherSnapshot {
    WeatherSnapshot {
        city_name: Some("Bengaluru".into()),
        current: Some(CurrentConditions {
            datetime: Some("2024-01-01:06".into()),
            temp: Some(22.0),
            feels_like: Some(23.1),
            humidity: Some(60.0),
            wind_speed: Some(3.2),
            weather: Some(clear_sky()),
        }),
        ..WeatherSnapshot::default()
    }
}

pub fn daily_snapshot() -> WeatherSnapshot {
    WeatherSnapshot {
        daily: Some(vec![DailyForecast {
            valid_date: Some("2024-01-01".into()),
            temp: Some(20.5),
            max_temp: Some(25.0),
            min_temp: Some(15.0),
            pop: Some(10.0),
            weather: Some(clear_sky()),
        }]),
        ..WeatherSnapshot::default()
    }
}

pub fn hourly_snapshot() -> WeatherSnapshot {
    WeatherSnapshot {
        hourly: Some(vec![HourlyForecast {
            timestamp_local: Some("2024-01-01T06:00:00".into()),
            temp: Some(19.0),
            pop: Some(0.0),
            weather: Some(clear_sky()),
        }]),
        ..WeatherSnapshot::default()
    }
}

/// Weather provider that records every call.
pub struct StubProvider {
    current: Mutex<Reply>,
    daily: Mutex<Reply>,
    hourly: Mutex<Reply>,
    calls: Mutex<Vec<String>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(Reply::Snapshot(current_snapshot())),
            daily: Mutex::new(Reply::Snapshot(daily_snapshot())),
            hourly: Mutex::new(Reply::Snapshot(hourly_snapshot())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_current(&self, reply: Reply) {
        *self.current.lock() = reply;
    }

    pub fn set_daily(&self, reply: Reply) {
        *self.daily.lock() = reply;
    }

    pub fn set_hourly(&self, reply: Reply) {
        *self.hourly.lock() = reply;
    }

    /// Number of calls whose log line starts with `kind`.
    pub fn calls(&self, kind: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.starts_with(kind)).count()
    }

    pub fn call_log(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl WeatherProvider for StubProvider {
    async fn current(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, UpstreamError> {
        self.calls.lock().push(format!("current {} {}", lat, lon));
        let reply = self.current.lock().clone();
        reply.resolve()
    }

    async fn daily(&self, lat: f64, lon: f64, days: u32) -> Result<WeatherSnapshot, UpstreamError> {
        self.calls.lock().push(format!("daily {} {} {}", lat, lon, days));
        let reply = self.daily.lock().clone();
        reply.resolve()
    }

    async fn hourly(
        &self,
        lat: f64,
        lon: f64,
        hours: u32,
    ) -> Result<WeatherSnapshot, UpstreamError> {
        self.calls.lock().push(format!("hourly {} {} {}", lat, lon, hours));
        let reply = self.hourly.lock().clone();
        reply.resolve()
    }
}

/// Geocoder with canned answers and call counters.
pub struct StubGeocoder {
    pub search_results: Mutex<Vec<Place>>,
    pub reverse_result: Mutex<Option<Place>>,
    pub fail: Mutex<bool>,
    pub search_calls: Mutex<usize>,
    pub reverse_calls: Mutex<usize>,
}

impl StubGeocoder {
    pub fn new() -> Self {
        Self {
            search_results: Mutex::new(Vec::new()),
            reverse_result: Mutex::new(None),
            fail: Mutex::new(false),
            search_calls: Mutex::new(0),
            reverse_calls: Mutex::new(0),
        }
    }

    pub fn search_calls(&self) -> usize {
        *self.search_calls.lock()
    }

    pub fn reverse_calls(&self) -> usize {
        *self.reverse_calls.lock()
    }
}

#[async_trait]
impl GeocodingProvider for StubGeocoder {
    async fn search(&self, _query: &str) -> Result<Vec<Place>, UpstreamError> {
        *self.search_calls.lock() += 1;
        if *self.fail.lock() {
            return Err(UpstreamError::Network("timed out".into()));
        }
        Ok(self.search_results.lock().clone())
    }

    async fn reverse(&self, _lat: f64, _lon: f64) -> Result<Option<Place>, UpstreamError> {
        *self.reverse_calls.lock() += 1;
        if *self.fail.lock() {
            return Err(UpstreamError::Provider("500 Internal Server Error".into()));
        }
        Ok(self.reverse_result.lock().clone())
    }
}

/// Store that cannot be reached.
pub struct UnreachableStore;

#[async_trait]
impl CacheStore for UnreachableStore {
    fn name(&self) -> &'static str {
        "unreachable"
    }

    async fn get(&self, _partition: &str, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn put(
        &self,
        _partition: &str,
        _key: &str,
        _value: String,
        _ttl: Duration,
    ) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn delete_partition(&self, _partition: &str) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn delete_all(&self) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn list_partitions(&self) -> Result<Vec<String>, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }
}
