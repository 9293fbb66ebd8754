use std::sync::Arc;

use skycast_history::ForecastStore;
use skycast_weather::{CacheLayer, LocationService, WeatherService};

/// Shared handles every request handler needs.
#[derive(Clone)]
pub struct AppState {
    pub weather: WeatherService,
    pub location: LocationService,
    pub cache: Arc<CacheLayer>,
    pub history: Arc<ForecastStore>,
}
