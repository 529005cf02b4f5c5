//! Unit system
//!
//! Temperature and wind speed are converted by the upstream API according to the
//! requested unit mode. Visibility always arrives in meters and is only converted here,
//! at formatting time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const METERS_PER_KILOMETER: f64 = 1000.0;
const METERS_PER_MILE: f64 = 1609.0;

/// Metric or imperial selection governing requested and displayed units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitMode {
    #[default]
    Metric,
    Imperial,
}

impl UnitMode {
    /// Value of the `units` query parameter sent to the weather API
    #[must_use]
    pub const fn api_param(self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }

    #[must_use]
    pub const fn temperature_unit(self) -> &'static str {
        match self {
            Self::Metric => "°C",
            Self::Imperial => "°F",
        }
    }

    #[must_use]
    pub const fn wind_speed_unit(self) -> &'static str {
        match self {
            Self::Metric => "m/s",
            Self::Imperial => "mph",
        }
    }

    #[must_use]
    pub const fn visibility_unit(self) -> &'static str {
        match self {
            Self::Metric => "km",
            Self::Imperial => "mi",
        }
    }

    /// Convert a visibility reading in meters to this mode's display unit
    #[must_use]
    pub fn visibility_from_meters(self, meters: f64) -> f64 {
        match self {
            Self::Metric => meters / METERS_PER_KILOMETER,
            Self::Imperial => meters / METERS_PER_MILE,
        }
    }

    /// Labels handed to the rendering layer alongside a report
    #[must_use]
    pub const fn labels(self) -> UnitLabels {
        UnitLabels {
            temperature: self.temperature_unit(),
            wind_speed: self.wind_speed_unit(),
            visibility: self.visibility_unit(),
            pressure: "hPa",
            percentage: "%",
        }
    }

    /// Temperature rounded to the nearest integer with its unit, e.g. `"21°C"`
    #[must_use]
    pub fn format_temperature(self, value: f64) -> String {
        format!("{}{}", value.round(), self.temperature_unit())
    }

    #[must_use]
    pub fn format_wind_speed(self, value: f64) -> String {
        format!("{value:.1} {}", self.wind_speed_unit())
    }

    #[must_use]
    pub fn format_visibility(self, meters: f64) -> String {
        format!(
            "{:.1} {}",
            self.visibility_from_meters(meters),
            self.visibility_unit()
        )
    }
}

impl fmt::Display for UnitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_param())
    }
}

impl FromStr for UnitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metric" => Ok(Self::Metric),
            "imperial" => Ok(Self::Imperial),
            other => Err(format!("unknown unit mode '{other}', expected metric or imperial")),
        }
    }
}

/// Display unit labels for one unit mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnitLabels {
    pub temperature: &'static str,
    pub wind_speed: &'static str,
    pub visibility: &'static str,
    pub pressure: &'static str,
    pub percentage: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(UnitMode::Metric, "°C", "m/s", "km")]
    #[case(UnitMode::Imperial, "°F", "mph", "mi")]
    fn test_labels(
        #[case] mode: UnitMode,
        #[case] temperature: &str,
        #[case] wind: &str,
        #[case] visibility: &str,
    ) {
        let labels = mode.labels();
        assert_eq!(labels.temperature, temperature);
        assert_eq!(labels.wind_speed, wind);
        assert_eq!(labels.visibility, visibility);
        assert_eq!(labels.pressure, "hPa");
    }

    #[test]
    fn test_visibility_is_converted_once_from_meters() {
        assert_eq!(UnitMode::Metric.visibility_from_meters(10_000.0), 10.0);
        assert_eq!(UnitMode::Imperial.visibility_from_meters(16_090.0), 10.0);
        assert_eq!(UnitMode::Metric.format_visibility(8_500.0), "8.5 km");
    }

    #[test]
    fn test_format_temperature_rounds_at_display_time() {
        assert_eq!(UnitMode::Metric.format_temperature(20.6), "21°C");
        assert_eq!(UnitMode::Imperial.format_temperature(70.5), "71°F");
    }

    #[test]
    fn test_parse_unit_mode() {
        assert_eq!("Imperial".parse::<UnitMode>(), Ok(UnitMode::Imperial));
        assert_eq!(" metric ".parse::<UnitMode>(), Ok(UnitMode::Metric));
        assert!("kelvin".parse::<UnitMode>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&UnitMode::Imperial).unwrap();
        assert_eq!(json, "\"imperial\"");
    }
}
