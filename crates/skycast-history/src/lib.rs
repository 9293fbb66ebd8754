//! Stored forecast history for SkyCast.
//!
//! Forecast rows are kept in SQLite and rendered per city as display-ready
//! summaries.

pub mod error;
pub mod store;
pub mod summary;

pub use error::{HistoryError, HistoryResult};
pub use store::{Forecast, ForecastStore, Location, NewForecast, NewLocation};
pub use summary::ForecastSummary;
