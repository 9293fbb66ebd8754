//! Forecast history error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    /// A forecast referenced a location id that is not stored.
    #[error("Location not found: {0}")]
    LocationNotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HistoryResult<T> = Result<T, HistoryError>;
