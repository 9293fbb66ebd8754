//! Geocoding: city names to coordinates and back.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

use crate::error::UpstreamError;

/// A place as reported by the geocoding provider. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Place {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Forward lookup. An empty list means the provider knows no such place.
    async fn search(&self, query: &str) -> Result<Vec<Place>, UpstreamError>;

    /// Reverse lookup. `None` when the provider has nothing at that point.
    async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<Place>, UpstreamError>;
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: Option<String>,
    lon: Option<String>,
    address: Option<NominatimAddress>,
    /// Set instead of a place when reverse lookup finds nothing
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl From<NominatimPlace> for Place {
    fn from(raw: NominatimPlace) -> Self {
        let (city, state, country) = match raw.address {
            Some(addr) => {
                // Prefer city > town > village > municipality > county
                let city = addr
                    .city
                    .or(addr.town)
                    .or(addr.village)
                    .or(addr.municipality)
                    .or(addr.county);
                (city, addr.state, addr.country)
            }
            None => (None, None, None),
        };

        Self {
            latitude: raw.lat.and_then(|s| s.parse().ok()),
            longitude: raw.lon.and_then(|s| s.parse().ok()),
            city,
            state,
            country,
        }
    }
}

/// Nominatim client.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: Client,
    base_url: String,
}

impl NominatimClient {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, UpstreamError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                let e = UpstreamError::from(e);
                tracing::debug!("Geocode request failed: {}", e);
                e
            })?;

        if !response.status().is_success() {
            tracing::debug!("Geocode returned status {}", response.status());
            return Err(UpstreamError::Provider(format!(
                "Geocoding provider returned {}",
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| {
                UpstreamError::Provider(format!("Malformed geocoding response: {}", e.without_url()))
            })
    }
}

#[async_trait]
impl GeocodingProvider for NominatimClient {
    #[instrument(skip(self), level = "debug")]
    async fn search(&self, query: &str) -> Result<Vec<Place>, UpstreamError> {
        // Form encoding sends spaces as '+'
        let params = [
            ("q", query.to_string()),
            ("format", "json".to_string()),
            ("limit", "1".to_string()),
            ("addressdetails", "1".to_string()),
        ];
        let hits: Vec<NominatimPlace> = self.get_json("search", &params).await?;
        Ok(hits.into_iter().map(Place::from).collect())
    }

    #[instrument(skip(self), level = "debug")]
    async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<Place>, UpstreamError> {
        let params = [
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("format", "json".to_string()),
            ("addressdetails", "1".to_string()),
            ("zoom", "10".to_string()),
        ];
        let raw: NominatimPlace = self.get_json("reverse", &params).await?;

        if let Some(reason) = &raw.error {
            if raw.address.is_none() {
                tracing::debug!("Reverse geocode found nothing: {}", reason);
                return Ok(None);
            }
        }
        Ok(Some(Place::from(raw)))
    }
}
