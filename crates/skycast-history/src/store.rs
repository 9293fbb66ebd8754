//! SQLite-backed forecast history.
//!
//! Two tables: `locations` (one row per place) and `forecasts` (one row per
//! day and place). Lookups by city ignore ASCII case.

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{HistoryError, HistoryResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A place forecasts are recorded for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub city: String,
    pub country: Option<String>,
    pub state: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewLocation {
    pub city: String,
    pub country: Option<String>,
    pub state: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// One stored day of forecast for a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub id: i64,
    pub location_id: i64,
    pub forecast_date: Option<NaiveDate>,
    pub min_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub weather_condition: Option<String>,
    pub description: Option<String>,
    pub high_temperature: Option<f64>,
    pub low_temperature: Option<f64>,
    /// Relative humidity, whole percent
    pub humidity: Option<i64>,
    /// km/h
    pub wind_speed: Option<f64>,
    pub condition: Option<String>,
    pub real_feel: Option<f64>,
    pub uv_index: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewForecast {
    pub location_id: i64,
    pub forecast_date: Option<NaiveDate>,
    pub min_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub weather_condition: Option<String>,
    pub description: Option<String>,
    pub high_temperature: Option<f64>,
    pub low_temperature: Option<f64>,
    pub humidity: Option<i64>,
    pub wind_speed: Option<f64>,
    pub condition: Option<String>,
    pub real_feel: Option<f64>,
    pub uv_index: Option<String>,
}

/// SQLite forecast store.
///
/// The connection sits behind a mutex so the store can be shared between
/// request handlers.
pub struct ForecastStore {
    conn: Mutex<Connection>,
}

impl ForecastStore {
    /// Open (or create) the database at `path`, creating parent directories
    /// and the schema as needed.
    pub fn new<P: AsRef<Path>>(path: P) -> HistoryResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        tracing::info!("Forecast history opened at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    #[cfg(test)]
    pub fn in_memory() -> HistoryResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> HistoryResult<()> {
        self.conn.lock().execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS locations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city TEXT NOT NULL,
                country TEXT,
                state TEXT,
                latitude REAL,
                longitude REAL
            );

            CREATE TABLE IF NOT EXISTS forecasts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                location_id INTEGER NOT NULL REFERENCES locations(id) ON DELETE CASCADE,
                forecast_date TEXT,
                min_temperature REAL,
                max_temperature REAL,
                weather_condition TEXT,
                description TEXT,
                high_temperature REAL,
                low_temperature REAL,
                humidity INTEGER,
                wind_speed REAL,
                condition TEXT,
                real_feel REAL,
                uv_index TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_locations_city ON locations(city COLLATE NOCASE);
            CREATE INDEX IF NOT EXISTS idx_forecasts_location ON forecasts(location_id, forecast_date);
            "#,
        )?;
        Ok(())
    }

    pub fn insert_location(&self, new: &NewLocation) -> HistoryResult<Location> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO locations (city, country, state, latitude, longitude)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![new.city, new.country, new.state, new.latitude, new.longitude],
        )?;

        let id = conn.last_insert_rowid();
        tracing::debug!("Stored location {} ({})", id, new.city);
        Ok(Location {
            id,
            city: new.city.clone(),
            country: new.country.clone(),
            state: new.state.clone(),
            latitude: new.latitude,
            longitude: new.longitude,
        })
    }

    /// Look a location up by id. `None` when it is not stored.
    pub fn location(&self, id: i64) -> HistoryResult<Option<Location>> {
        let conn = self.conn.lock();
        let location = conn
            .query_row(
                "SELECT id, city, country, state, latitude, longitude
                 FROM locations WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Location {
                        id: row.get(0)?,
                        city: row.get(1)?,
                        country: row.get(2)?,
                        state: row.get(3)?,
                        latitude: row.get(4)?,
                        longitude: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(location)
    }

    /// Record a forecast for an existing location.
    pub fn insert_forecast(&self, new: &NewForecast) -> HistoryResult<Forecast> {
        if self.location(new.location_id)?.is_none() {
            return Err(HistoryError::LocationNotFound(new.location_id));
        }

        let created_at = Utc::now();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO forecasts (location_id, forecast_date, min_temperature, max_temperature,
                weather_condition, description, high_temperature, low_temperature, humidity,
                wind_speed, condition, real_feel, uv_index, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                new.location_id,
                new.forecast_date.map(|d| d.format(DATE_FORMAT).to_string()),
                new.min_temperature,
                new.max_temperature,
                new.weather_condition,
                new.description,
                new.high_temperature,
                new.low_temperature,
                new.humidity,
                new.wind_speed,
                new.condition,
                new.real_feel,
                new.uv_index,
                created_at.to_rfc3339(),
            ],
        )?;

        Ok(Forecast {
            id: conn.last_insert_rowid(),
            location_id: new.location_id,
            forecast_date: new.forecast_date,
            min_temperature: new.min_temperature,
            max_temperature: new.max_temperature,
            weather_condition: new.weather_condition.clone(),
            description: new.description.clone(),
            high_temperature: new.high_temperature,
            low_temperature: new.low_temperature,
            humidity: new.humidity,
            wind_speed: new.wind_speed,
            condition: new.condition.clone(),
            real_feel: new.real_feel,
            uv_index: new.uv_index.clone(),
            created_at,
        })
    }

    /// Every forecast stored for locations named `city`, ignoring case,
    /// oldest forecast date first.
    pub fn forecasts_by_city(&self, city: &str) -> HistoryResult<Vec<Forecast>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT f.id, f.location_id, f.forecast_date, f.min_temperature, f.max_temperature,
                    f.weather_condition, f.description, f.high_temperature, f.low_temperature,
                    f.humidity, f.wind_speed, f.condition, f.real_feel, f.uv_index, f.created_at
             FROM forecasts f
             JOIN locations l ON l.id = f.location_id
             WHERE l.city = ?1 COLLATE NOCASE
             ORDER BY f.forecast_date, f.id",
        )?;

        let rows = stmt.query_map(params![city], Self::row_to_forecast)?;
        let forecasts = rows.collect::<Result<Vec<_>, _>>()?;
        tracing::debug!("Found {} stored forecasts for {}", forecasts.len(), city);
        Ok(forecasts)
    }

    pub fn count(&self) -> HistoryResult<usize> {
        let count: i64 =
            self.conn.lock().query_row("SELECT COUNT(*) FROM forecasts", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn row_to_forecast(row: &rusqlite::Row) -> rusqlite::Result<Forecast> {
        let date_str: Option<String> = row.get(2)?;
        let created_at_str: String = row.get(14)?;

        let forecast_date =
            date_str.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok());
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Forecast {
            id: row.get(0)?,
            location_id: row.get(1)?,
            forecast_date,
            min_temperature: row.get(3)?,
            max_temperature: row.get(4)?,
            weather_condition: row.get(5)?,
            description: row.get(6)?,
            high_temperature: row.get(7)?,
            low_temperature: row.get(8)?,
            humidity: row.get(9)?,
            wind_speed: row.get(10)?,
            condition: row.get(11)?,
            real_feel: row.get(12)?,
            uv_index: row.get(13)?,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use tempfile::tempdir;

    fn seattle() -> NewLocation {
        NewLocation {
            city: "Seattle".into(),
            country: Some("United States".into()),
            state: Some("Washington".into()),
            latitude: Some(47.6062),
            longitude: Some(-122.3321),
        }
    }

    fn forecast_for(location_id: i64, day: u32) -> NewForecast {
        NewForecast {
            location_id,
            forecast_date: NaiveDate::from_ymd_opt(2024, 1, day),
            high_temperature: Some(12.5),
            low_temperature: Some(4.0),
            humidity: Some(80),
            wind_speed: Some(14.0),
            condition: Some("Rain".into()),
            ..NewForecast::default()
        }
    }

    #[test]
    fn test_insert_and_get_location() {
        let store = ForecastStore::in_memory().unwrap();
        let location = store.insert_location(&seattle()).unwrap();

        let fetched = store.location(location.id).unwrap().unwrap();
        assert_eq!(fetched, location);
        assert!(store.location(location.id + 1).unwrap().is_none());
    }

    #[test]
    fn test_forecasts_by_city_ignores_case() {
        let store = ForecastStore::in_memory().unwrap();
        let location = store.insert_location(&seattle()).unwrap();
        store.insert_forecast(&forecast_for(location.id, 2)).unwrap();
        store.insert_forecast(&forecast_for(location.id, 1)).unwrap();

        let forecasts = store.forecasts_by_city("sEaTtLe").unwrap();
        assert_eq!(forecasts.len(), 2);
        // Oldest date first
        assert_eq!(forecasts[0].forecast_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(forecasts[1].forecast_date, NaiveDate::from_ymd_opt(2024, 1, 2));
        assert_eq!(forecasts[0].humidity, Some(80));
        assert_eq!(forecasts[0].condition.as_deref(), Some("Rain"));
    }

    #[test]
    fn test_forecasts_by_unknown_city_is_empty() {
        let store = ForecastStore::in_memory().unwrap();
        let location = store.insert_location(&seattle()).unwrap();
        store.insert_forecast(&forecast_for(location.id, 1)).unwrap();

        assert!(store.forecasts_by_city("Portland").unwrap().is_empty());
    }

    #[test]
    fn test_forecasts_span_locations_with_same_city() {
        let store = ForecastStore::in_memory().unwrap();
        let a = store.insert_location(&seattle()).unwrap();
        let b = store
            .insert_location(&NewLocation {
                city: "SEATTLE".into(),
                ..NewLocation::default()
            })
            .unwrap();
        store.insert_forecast(&forecast_for(a.id, 1)).unwrap();
        store.insert_forecast(&forecast_for(b.id, 1)).unwrap();

        assert_eq!(store.forecasts_by_city("seattle").unwrap().len(), 2);
    }

    #[test]
    fn test_insert_forecast_requires_location() {
        let store = ForecastStore::in_memory().unwrap();
        let err = store.insert_forecast(&forecast_for(99, 1)).unwrap_err();
        assert!(matches!(err, HistoryError::LocationNotFound(99)));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_store_persists_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("forecasts.db");

        {
            let store = ForecastStore::new(&path).unwrap();
            let location = store.insert_location(&seattle()).unwrap();
            store.insert_forecast(&forecast_for(location.id, 1)).unwrap();
        }

        let reopened = ForecastStore::new(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
        assert_eq!(reopened.forecasts_by_city("Seattle").unwrap().len(), 1);
    }
}
