//! Display-ready rendering of stored forecasts.

use serde::{Deserialize, Serialize};

use crate::store::Forecast;

/// One forecast as shown to clients, with units baked into the values.
///
/// Absent measurements stay `null`; a missing UV index reads `N/A`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    /// Section header, always empty
    #[serde(rename = "Weather Details")]
    pub weather_details: String,
    #[serde(rename = "High Temperature")]
    pub high_temperature: Option<String>,
    #[serde(rename = "Low Temperature")]
    pub low_temperature: Option<String>,
    #[serde(rename = "Humidity")]
    pub humidity: Option<String>,
    #[serde(rename = "Wind Speed")]
    pub wind_speed: Option<String>,
    #[serde(rename = "Condition")]
    pub condition: Option<String>,
    #[serde(rename = "RealFeel")]
    pub real_feel: Option<String>,
    #[serde(rename = "UV Index")]
    pub uv_index: String,
}

/// `25.0` renders as `25.0°C`, not `25°C`.
fn celsius(value: Option<f64>) -> Option<String> {
    value.map(|v| format!("{:?}°C", v))
}

impl From<&Forecast> for ForecastSummary {
    fn from(forecast: &Forecast) -> Self {
        Self {
            weather_details: String::new(),
            high_temperature: celsius(forecast.high_temperature),
            low_temperature: celsius(forecast.low_temperature),
            humidity: forecast.humidity.map(|h| format!("{}%", h)),
            wind_speed: forecast.wind_speed.map(|w| format!("{:?} km/h", w)),
            condition: forecast.condition.clone(),
            real_feel: celsius(forecast.real_feel),
            uv_index: forecast
                .uv_index
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
        }
    }
}

impl ForecastSummary {
    pub fn from_forecasts(forecasts: &[Forecast]) -> Vec<Self> {
        forecasts.iter().map(Self::from).collect()
    }
}
