//! Location services
//!
//! Traits for the collaborators the location resolver and search depend on, plus
//! HTTP implementations of each.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::DevicePosition;
use crate::models::{Coordinate, ResolvedLocation};
use crate::weather::ApiError;

pub mod ipapi;
pub mod nominatim;
pub mod owm_geocoding;

pub use ipapi::IpApiClient;
pub use nominatim::NominatimClient;
pub use owm_geocoding::OpenWeatherGeocoder;

/// Device position could not be read
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable")]
    Unavailable,
}

/// Geocoding and IP lookup failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeocodeError {
    #[error("No place found")]
    NotFound,

    #[error("Network error: {0}")]
    Network(String),
}

impl From<ApiError> for GeocodeError {
    fn from(err: ApiError) -> Self {
        GeocodeError::Network(err.to_string())
    }
}

/// Location estimated from the client's IP address
#[derive(Debug, Clone, PartialEq)]
pub struct IpLocation {
    pub coordinate: Coordinate,
    pub city: String,
    /// Country code, e.g. `"FR"`
    pub country: String,
}

/// One forward geocoding match
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub name: String,
    pub country: String,
    pub state: Option<String>,
    pub coordinate: Coordinate,
}

impl SearchResult {
    /// Label shown in result lists, e.g. `"Springfield, Illinois, US"`
    #[must_use]
    pub fn label(&self) -> String {
        match &self.state {
            Some(state) => format!("{}, {}, {}", self.name, state, self.country),
            None => format!("{}, {}", self.name, self.country),
        }
    }

    /// Selecting a result names the location after the result; the weather
    /// fetch supplies the country.
    #[must_use]
    pub fn to_resolved(&self) -> ResolvedLocation {
        ResolvedLocation::new(self.coordinate, self.name.clone())
    }
}

#[async_trait]
pub trait GeolocationSensor: Send + Sync {
    async fn current_position(&self) -> Result<Coordinate, SensorError>;
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Full place string for a coordinate
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<String, GeocodeError>;
}

#[async_trait]
pub trait ForwardGeocoder: Send + Sync {
    /// Places matching `query`; empty when nothing matches
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchResult>, GeocodeError>;
}

#[async_trait]
pub trait IpGeolocationService: Send + Sync {
    async fn locate(&self) -> Result<IpLocation, GeocodeError>;
}

/// Sensor reporting a position fixed in configuration.
///
/// Without a configured position it behaves like a device with no location
/// hardware.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredSensor {
    position: Option<DevicePosition>,
}

impl ConfiguredSensor {
    #[must_use]
    pub fn new(position: Option<DevicePosition>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl GeolocationSensor for ConfiguredSensor {
    async fn current_position(&self) -> Result<Coordinate, SensorError> {
        let position = self.position.ok_or(SensorError::Unavailable)?;
        Coordinate::new(position.lat, position.lon).map_err(|_| SensorError::Unavailable)
    }
}
