//! Cache-aware forward and reverse geocoding.

use std::sync::Arc;

use crate::cache::{coordinate_key, CacheLayer, Partition};
use crate::error::LocationError;
use crate::geocode::GeocodingProvider;
use crate::types::LocationRecord;

#[derive(Clone)]
pub struct LocationService {
    geocoder: Arc<dyn GeocodingProvider>,
    cache: Arc<CacheLayer>,
}

impl LocationService {
    pub fn new(geocoder: Arc<dyn GeocodingProvider>, cache: Arc<CacheLayer>) -> Self {
        Self { geocoder, cache }
    }

    /// Resolve a city name. `Ok(None)` when the provider has no match; misses
    /// are not cached, so the next call asks the provider again.
    pub async fn geocode_location(&self, city: &str) -> Result<Option<LocationRecord>, LocationError> {
        tracing::info!("Geocoding location for city: {}", city);
        let partition = Partition::LocationGeocode.name();

        if let Some(hit) = self.cache.get(partition, city).await? {
            return Ok(Some(hit));
        }

        let places = self.geocoder.search(city).await.map_err(|e| {
            tracing::error!("Error geocoding location: {}", e);
            e
        })?;

        let Some(place) = places.into_iter().next() else {
            tracing::warn!("No geocoding results found for city: {}", city);
            return Ok(None);
        };

        // The record is keyed by what the caller asked for, not the provider's spelling
        let record = LocationRecord {
            city: Some(city.to_string()),
            country: place.country,
            state: place.state,
            latitude: place.latitude,
            longitude: place.longitude,
            timezone: None,
        };

        self.cache.put(partition, city, &record).await?;
        Ok(Some(record))
    }

    /// Resolve coordinates to a place. Same not-found policy as forward lookup.
    pub async fn reverse_geocode(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<Option<LocationRecord>, LocationError> {
        tracing::info!("Reverse geocoding for lat: {}, lon: {}", lat, lon);
        let partition = Partition::LocationGeocode.name();
        let key = coordinate_key(lat, lon);

        if let Some(hit) = self.cache.get(partition, &key).await? {
            return Ok(Some(hit));
        }

        let place = self.geocoder.reverse(lat, lon).await.map_err(|e| {
            tracing::error!("Error reverse geocoding: {}", e);
            e
        })?;

        let Some(place) = place else {
            tracing::warn!("No reverse geocoding results found for lat: {}, lon: {}", lat, lon);
            return Ok(None);
        };

        let record = LocationRecord {
            city: place.city,
            country: place.country,
            state: place.state,
            latitude: Some(lat),
            longitude: Some(lon),
            timezone: None,
        };

        self.cache.put(partition, &key, &record).await?;
        Ok(Some(record))
    }
}
