//! Weather and geocoding aggregation for SkyCast
//!
//! Fetches Weatherbit data and Nominatim places, normalizes them, and keeps
//! them in a partitioned TTL cache so repeated lookups stay off the network.

pub mod cache;
pub mod error;
pub mod geocode;
pub mod location;
pub mod provider;
pub mod retry;
pub mod service;
pub mod types;

pub use cache::{CacheLayer, CachePolicy, CacheStore, MemoryStore, Partition, PartitionStatus};
pub use error::{CacheError, LocationError, UpstreamError, WeatherError};
pub use geocode::{GeocodingProvider, NominatimClient, Place};
pub use location::LocationService;
pub use provider::{WeatherProvider, WeatherbitClient};
pub use retry::RetryConfig;
pub use service::WeatherService;
pub use types::*;
