//! Location model for geographic coordinates and display names

use serde::{Deserialize, Serialize};

use crate::WildWeatherError;

/// Label used when a sensed coordinate cannot be reverse geocoded
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting values outside the valid ranges
    pub fn new(lat: f64, lon: f64) -> crate::Result<Self> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(WildWeatherError::validation(format!(
                "Latitude must be between -90 and 90, got: {lat}"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(WildWeatherError::validation(format!(
                "Longitude must be between -180 and 180, got: {lon}"
            )));
        }
        Ok(Self { lat, lon })
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// The coordinate/name pair driving the pipeline
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub coordinate: Coordinate,
    pub display_name: String,
}

impl ResolvedLocation {
    #[must_use]
    pub fn new(coordinate: Coordinate, display_name: impl Into<String>) -> Self {
        Self {
            coordinate,
            display_name: display_name.into(),
        }
    }

    /// Label for a point that could not be named, e.g. `"Lat: 48.8566, Lon: 2.3522"`
    #[must_use]
    pub fn unnamed_point(coordinate: Coordinate) -> Self {
        let label = format!("Lat: {:.4}, Lon: {:.4}", coordinate.lat, coordinate.lon);
        Self::new(coordinate, label)
    }
}

/// Keep the first two comma-separated segments of a place string.
///
/// `"10 Downing Street, Westminster, London, UK"` becomes `"10 Downing Street, Westminster"`.
#[must_use]
pub fn condense_place_name(place: &str) -> String {
    place
        .split(',')
        .take(2)
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A user-saved location, keyed by name.
///
/// Older documents may carry only a name; those are looked up by name.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SavedLocation {
    pub name: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl SavedLocation {
    #[must_use]
    pub fn new(name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            name: name.into(),
            lat: Some(coordinate.lat),
            lon: Some(coordinate.lon),
        }
    }

    #[must_use]
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinate { lat, lon }),
            _ => None,
        }
    }
}
