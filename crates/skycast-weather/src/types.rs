use serde::{Deserialize, Deserializer, Serialize};

/// Normalized weather data for one coordinate and one kind of request.
///
/// A direct provider fetch fills exactly one of `current`, `daily` or
/// `hourly`. Only the merged "all data" view carries more than one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub city_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub current: Option<CurrentConditions>,
    pub daily: Option<Vec<DailyForecast>>,
    pub hourly: Option<Vec<HourlyForecast>>,
}

impl WeatherSnapshot {
    /// Empty snapshot stamped with its coordinates.
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            ..Self::default()
        }
    }
}

/// Current conditions as reported by the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub datetime: Option<String>,
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub weather: Option<WeatherDescription>,
}

/// One day of a daily forecast
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub valid_date: Option<String>,
    pub temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub min_temp: Option<f64>,
    /// Probability of precipitation, percent
    pub pop: Option<f64>,
    pub weather: Option<WeatherDescription>,
}

/// One hour of an hourly forecast
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub timestamp_local: Option<String>,
    pub temp: Option<f64>,
    pub pop: Option<f64>,
    pub weather: Option<WeatherDescription>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherDescription {
    pub description: Option<String>,
    pub icon: Option<String>,
    /// Weatherbit sends this as a number; older payloads use a string.
    #[serde(default, deserialize_with = "string_or_number")]
    pub code: Option<String>,
}

/// Geographic location resolved by the geocoding provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub city: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(Option::<Code>::deserialize(deserializer)?.map(|code| match code {
        Code::Text(s) => s,
        Code::Int(n) => n.to_string(),
        Code::Float(n) => n.to_string(),
    }))
}
