//! Route table and handlers.

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use skycast_history::ForecastSummary;
use skycast_weather::{LocationRecord, PartitionStatus, WeatherSnapshot};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_DAYS: u32 = 16;
const DEFAULT_HOURS: u32 = 120;

#[derive(Debug, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub lat: f64,
    pub lon: f64,
    #[serde(default = "default_days")]
    pub days: u32,
}

#[derive(Debug, Deserialize)]
pub struct HourlyQuery {
    pub lat: f64,
    pub lon: f64,
    #[serde(default = "default_hours")]
    pub hours: u32,
}

#[derive(Debug, Deserialize)]
pub struct CityQuery {
    pub city: String,
}

fn default_days() -> u32 {
    DEFAULT_DAYS
}

fn default_hours() -> u32 {
    DEFAULT_HOURS
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/weather/current", get(current_weather))
        .route("/weather/daily", get(daily_forecast))
        .route("/weather/hourly", get(hourly_forecast))
        .route("/weather/all", get(all_weather_data))
        .route("/location/geocode", get(geocode_location))
        .route("/location/reverse", get(reverse_geocode))
        .route("/cache/stats", get(cache_stats))
        .route("/cache/clear", delete(clear_all_caches))
        .route("/cache/clear/{cache_name}", delete(clear_cache))
        .route("/api/forecast", get(forecasts_by_city))
        .route("/health", get(health))
        .fallback(handle_404)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn current_weather(
    State(state): State<AppState>,
    Query(q): Query<Coordinates>,
) -> Result<Json<WeatherSnapshot>, ApiError> {
    Ok(Json(state.weather.current_weather(q.lat, q.lon).await?))
}

async fn daily_forecast(
    State(state): State<AppState>,
    Query(q): Query<DailyQuery>,
) -> Result<Json<WeatherSnapshot>, ApiError> {
    Ok(Json(state.weather.daily_forecast(q.lat, q.lon, q.days).await?))
}

async fn hourly_forecast(
    State(state): State<AppState>,
    Query(q): Query<HourlyQuery>,
) -> Result<Json<WeatherSnapshot>, ApiError> {
    Ok(Json(state.weather.hourly_forecast(q.lat, q.lon, q.hours).await?))
}

/// Always 200: missing parts are simply absent from the body.
async fn all_weather_data(
    State(state): State<AppState>,
    Query(q): Query<Coordinates>,
) -> Json<WeatherSnapshot> {
    Json(state.weather.all_weather_data(q.lat, q.lon).await)
}

async fn geocode_location(
    State(state): State<AppState>,
    Query(q): Query<CityQuery>,
) -> Result<Json<LocationRecord>, ApiError> {
    state
        .location
        .geocode_location(&q.city)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No location found for city: {}", q.city)))
}

async fn reverse_geocode(
    State(state): State<AppState>,
    Query(q): Query<Coordinates>,
) -> Result<Json<LocationRecord>, ApiError> {
    state
        .location
        .reverse_geocode(q.lat, q.lon)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::not_found(format!("No location found at lat: {}, lon: {}", q.lat, q.lon))
        })
}

async fn cache_stats(State(state): State<AppState>) -> Result<Json<Vec<PartitionStatus>>, ApiError> {
    Ok(Json(state.cache.list_partitions().await?))
}

async fn clear_all_caches(State(state): State<AppState>) -> Result<String, ApiError> {
    state.cache.clear_all().await?;
    Ok("All caches cleared successfully".to_string())
}

async fn clear_cache(
    State(state): State<AppState>,
    Path(cache_name): Path<String>,
) -> Result<String, ApiError> {
    state.cache.clear(&cache_name).await?;
    Ok(format!("Cache '{}' cleared successfully", cache_name))
}

async fn forecasts_by_city(
    State(state): State<AppState>,
    Query(q): Query<CityQuery>,
) -> Result<Json<Vec<ForecastSummary>>, ApiError> {
    let history = state.history.clone();
    // rusqlite is blocking
    let forecasts =
        tokio::task::spawn_blocking(move || history.forecasts_by_city(&q.city)).await??;
    Ok(Json(ForecastSummary::from_forecasts(&forecasts)))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn handle_404(uri: axum::http::Uri, method: axum::http::Method) -> ApiError {
    ApiError::not_found(format!("Route not found: {} {}", method, uri.path()))
}
