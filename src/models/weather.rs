//! Normalized weather observations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::units::UnitMode;

/// Icon code and description of a weather condition
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Condition {
    /// Upstream icon code, e.g. `"10d"`
    pub icon: String,
    /// Lowercase description, e.g. `"light rain"`
    pub description: String,
}

/// Snapshot of the current weather at one location.
///
/// Temperature and wind speed are in the unit of the mode the data was fetched under.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub feels_like: f64,
    pub condition: Condition,
    pub wind_speed: f64,
    /// Always meters, whatever the unit mode
    pub visibility_meters: f64,
    pub humidity_pct: f64,
    pub pressure_hpa: f64,
    pub clouds_pct: f64,
    /// Not provided by the current-conditions feed
    pub uv_index: Option<f64>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub sunrise: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub sunset: DateTime<Utc>,
    /// ISO 3166-1 alpha-2 country code, empty when unknown
    pub country_code: String,
    /// Place name reported by the weather service
    pub place_name: String,
}

/// One entry of the forecast series
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HourlySample {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub dt: DateTime<Utc>,
    pub temperature: f64,
    pub wind_speed: f64,
    pub visibility_meters: f64,
    pub humidity_pct: f64,
    pub pressure_hpa: f64,
    pub clouds_pct: f64,
    pub condition: Condition,
}

/// Result of one weather fetch, tagged with the unit mode it was requested in
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherReport {
    pub current: CurrentConditions,
    pub hourly: Vec<HourlySample>,
    pub unit_mode: UnitMode,
    pub fetched_at: DateTime<Utc>,
}

/// Numeric quantities that alerts and charts can read
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Temperature,
    Wind,
    Visibility,
    Humidity,
    Pressure,
    Uv,
    Clouds,
}

impl Metric {
    /// Read this metric from current conditions, `None` when the feed lacks it
    #[must_use]
    pub fn read_current(self, current: &CurrentConditions) -> Option<f64> {
        match self {
            Metric::Temperature => Some(current.temperature),
            Metric::Wind => Some(current.wind_speed),
            Metric::Visibility => Some(current.visibility_meters),
            Metric::Humidity => Some(current.humidity_pct),
            Metric::Pressure => Some(current.pressure_hpa),
            Metric::Uv => current.uv_index,
            Metric::Clouds => Some(current.clouds_pct),
        }
    }

    /// Read this metric from a forecast sample
    #[must_use]
    pub fn read_sample(self, sample: &HourlySample) -> Option<f64> {
        match self {
            Metric::Temperature => Some(sample.temperature),
            Metric::Wind => Some(sample.wind_speed),
            Metric::Visibility => Some(sample.visibility_meters),
            Metric::Humidity => Some(sample.humidity_pct),
            Metric::Pressure => Some(sample.pressure_hpa),
            Metric::Uv => None,
            Metric::Clouds => Some(sample.clouds_pct),
        }
    }

    /// Unit of the raw values alert thresholds compare against.
    ///
    /// Visibility is always meters here, whatever its display unit.
    #[must_use]
    pub fn unit_label(self, mode: UnitMode) -> &'static str {
        match self {
            Metric::Temperature => mode.temperature_unit(),
            Metric::Wind => mode.wind_speed_unit(),
            Metric::Visibility => "m",
            Metric::Humidity | Metric::Clouds => "%",
            Metric::Pressure => "hPa",
            Metric::Uv => "",
        }
    }
}

impl std::str::FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "temperature" => Ok(Metric::Temperature),
            "wind" => Ok(Metric::Wind),
            "visibility" => Ok(Metric::Visibility),
            "humidity" => Ok(Metric::Humidity),
            "pressure" => Ok(Metric::Pressure),
            "uv" => Ok(Metric::Uv),
            "clouds" => Ok(Metric::Clouds),
            other => Err(format!("unknown metric '{other}'")),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_reads_current_fields() {
        let current = fixtures::current(21.5, "clear sky");
        assert_eq!(Metric::Temperature.read_current(&current), Some(21.5));
        assert_eq!(Metric::Visibility.read_current(&current), Some(10_000.0));
        assert_eq!(Metric::Uv.read_current(&current), None);
    }

    #[test]
    fn test_metric_unit_labels() {
        assert_eq!(Metric::Temperature.unit_label(UnitMode::Imperial), "°F");
        assert_eq!(Metric::Wind.unit_label(UnitMode::Metric), "m/s");
        assert_eq!(Metric::Clouds.unit_label(UnitMode::Metric), "%");
        assert_eq!(Metric::Uv.unit_label(UnitMode::Metric), "");
        assert_eq!(Metric::Visibility.unit_label(UnitMode::Metric), "m");
        assert_eq!(Metric::Visibility.unit_label(UnitMode::Imperial), "m");
    }

    #[test]
    fn test_current_conditions_serializes_epoch_seconds() {
        let current = fixtures::current(10.0, "mist");
        let value = serde_json::to_value(&current).unwrap();
        assert_eq!(value["sunrise"], 1_700_000_000);
    }
}
