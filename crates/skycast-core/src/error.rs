//! Centralized error types for SkyCast.
//!
//! Each domain crate keeps its own precise error enum; the API layer folds
//! them into [`AppError`], which decides the user-facing message.

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a message that is safe to return to clients.
#[derive(Debug, Error)]
pub enum AppError {
    /// No such location, partition or record. Not a failure of the system.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A third-party provider could not be reached or returned garbage.
    #[error("Upstream unavailable: {0}")]
    Upstream(#[from] UpstreamFailure),

    /// The cache store itself could not be used.
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// Returns a client-friendly message.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "The requested resource was not found.",
            AppError::Upstream(e) => e.user_message(),
            AppError::CacheUnavailable(_) => {
                "The cache is unavailable. Please try again later."
            }
            AppError::Storage(_) => "A data operation failed. Please try again.",
        }
    }
}

/// Outbound provider failures, split by where they happened.
#[derive(Debug, Error)]
pub enum UpstreamFailure {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

impl UpstreamFailure {
    pub fn user_message(&self) -> &'static str {
        match self {
            UpstreamFailure::Network(_) => {
                "Unable to reach an upstream provider. Please try again."
            }
            UpstreamFailure::Provider(_) => {
                "An upstream provider returned an error. Please try again later."
            }
        }
    }
}

/// Configuration errors. These stop startup and never reach a client.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}
