//! Weather and geocoding error types.
//!
//! "Nothing found" is never an error here: lookups return `Ok(None)`.

use thiserror::Error;

/// Failure talking to a third-party provider.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The provider could not be reached (connect, timeout, broken transfer).
    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered, but with an error status or an unreadable body.
    #[error("Provider error: {0}")]
    Provider(String),
}

impl UpstreamError {
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<reqwest::Error> for UpstreamError {
    /// The request URL is dropped: it carries the provider API key.
    fn from(e: reqwest::Error) -> Self {
        let e = e.without_url();
        if e.is_status() || e.is_decode() {
            Self::Provider(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    /// The backing store could not be used. Fatal to the request that hit it.
    #[error("Cache store unavailable: {0}")]
    Unavailable(String),

    #[error("Cache partition not found: {0}")]
    PartitionNotFound(String),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the weather aggregation service.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Weather upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] UpstreamError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Errors from the location service.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Geocoding upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] UpstreamError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}
