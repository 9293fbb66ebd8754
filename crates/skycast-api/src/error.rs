//! Mapping of domain failures onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use skycast_core::{AppError, UpstreamFailure};
use skycast_history::HistoryError;
use skycast_weather::{CacheError, LocationError, UpstreamError, WeatherError};

/// Handler error. Wraps [`AppError`] so it can become a response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self(AppError::NotFound(what.into()))
    }

    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::CacheUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self(e)
    }
}

fn upstream(e: UpstreamError) -> AppError {
    match e {
        UpstreamError::Network(msg) => AppError::Upstream(UpstreamFailure::Network(msg)),
        UpstreamError::Provider(msg) => AppError::Upstream(UpstreamFailure::Provider(msg)),
    }
}

impl From<CacheError> for ApiError {
    fn from(e: CacheError) -> Self {
        match e {
            CacheError::PartitionNotFound(name) => {
                Self::not_found(format!("Cache '{}' does not exist", name))
            }
            other => Self(AppError::CacheUnavailable(other.to_string())),
        }
    }
}

impl From<WeatherError> for ApiError {
    fn from(e: WeatherError) -> Self {
        match e {
            WeatherError::UpstreamUnavailable(e) => Self(upstream(e)),
            WeatherError::Cache(e) => e.into(),
        }
    }
}

impl From<LocationError> for ApiError {
    fn from(e: LocationError) -> Self {
        match e {
            LocationError::UpstreamUnavailable(e) => Self(upstream(e)),
            LocationError::Cache(e) => e.into(),
        }
    }
}

impl From<HistoryError> for ApiError {
    fn from(e: HistoryError) -> Self {
        Self(AppError::Storage(e.to_string()))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self(AppError::Storage(format!("Storage task failed: {}", e)))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self.0 {
            AppError::NotFound(what) => {
                tracing::warn!("{}", what);
                what.clone()
            }
            other => {
                tracing::error!("Request failed: {}", other);
                other.user_message().to_string()
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
