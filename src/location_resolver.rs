//! Location Resolution Module
//!
//! Resolves the starting location through an ordered chain of strategies:
//! device sensor with reverse geocoding, then IP geolocation, then a fixed default.
//! Each strategy is tried once and the default always succeeds.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::geo::{GeolocationSensor, IpGeolocationService, ReverseGeocoder};
use crate::models::{Coordinate, ResolvedLocation, UNKNOWN_LOCATION, condense_place_name};

/// One step of the resolution chain
#[async_trait]
pub trait ResolveStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Resolve a location, or `None` to hand over to the next strategy
    async fn attempt(&self) -> Option<ResolvedLocation>;
}

/// Device position, named by reverse geocoding
pub struct SensorStrategy {
    sensor: Arc<dyn GeolocationSensor>,
    reverse: Arc<dyn ReverseGeocoder>,
}

impl SensorStrategy {
    #[must_use]
    pub fn new(sensor: Arc<dyn GeolocationSensor>, reverse: Arc<dyn ReverseGeocoder>) -> Self {
        Self { sensor, reverse }
    }
}

#[async_trait]
impl ResolveStrategy for SensorStrategy {
    fn name(&self) -> &'static str {
        "sensor"
    }

    async fn attempt(&self) -> Option<ResolvedLocation> {
        let coordinate = match self.sensor.current_position().await {
            Ok(coordinate) => coordinate,
            Err(e) => {
                debug!("Device location not available: {}", e);
                return None;
            }
        };

        // The sensed coordinate stands even when it cannot be named
        let label = match self.reverse.reverse_geocode(coordinate).await {
            Ok(place) => condense_place_name(&place),
            Err(e) => {
                debug!("Reverse geocoding failed: {}", e);
                UNKNOWN_LOCATION.to_string()
            }
        };
        Some(ResolvedLocation::new(coordinate, label))
    }
}

/// Approximate position from the client's IP address
pub struct IpStrategy {
    service: Arc<dyn IpGeolocationService>,
}

impl IpStrategy {
    #[must_use]
    pub fn new(service: Arc<dyn IpGeolocationService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ResolveStrategy for IpStrategy {
    fn name(&self) -> &'static str {
        "ip"
    }

    async fn attempt(&self) -> Option<ResolvedLocation> {
        match self.service.locate().await {
            Ok(found) => Some(ResolvedLocation::new(
                found.coordinate,
                format!("{}, {}", found.city, found.country),
            )),
            Err(e) => {
                debug!("IP geolocation failed: {}", e);
                None
            }
        }
    }
}

/// Service for resolving the active location
pub struct LocationResolver {
    strategies: Vec<Box<dyn ResolveStrategy>>,
    fallback: ResolvedLocation,
    reverse: Arc<dyn ReverseGeocoder>,
}

impl LocationResolver {
    /// Standard chain: sensor, then IP lookup, then `fallback`
    pub fn new(
        sensor: Arc<dyn GeolocationSensor>,
        reverse: Arc<dyn ReverseGeocoder>,
        ip: Arc<dyn IpGeolocationService>,
        fallback: ResolvedLocation,
    ) -> Self {
        let strategies: Vec<Box<dyn ResolveStrategy>> = vec![
            Box::new(SensorStrategy::new(sensor, reverse.clone())),
            Box::new(IpStrategy::new(ip)),
        ];
        Self {
            strategies,
            fallback,
            reverse,
        }
    }

    /// Walk the chain and return the first resolved location. Never fails.
    pub async fn resolve(&self) -> ResolvedLocation {
        for strategy in &self.strategies {
            if let Some(location) = strategy.attempt().await {
                info!(
                    "Resolved location via {}: {} at ({})",
                    strategy.name(),
                    location.display_name,
                    location.coordinate.format_coordinates()
                );
                return location;
            }
        }

        info!("Using default location: {}", self.fallback.display_name);
        self.fallback.clone()
    }

    /// Name a point picked directly by the user, e.g. a map click.
    ///
    /// Keeps the full place string; falls back to the formatted coordinates.
    pub async fn resolve_point(&self, coordinate: Coordinate) -> ResolvedLocation {
        match self.reverse.reverse_geocode(coordinate).await {
            Ok(place) => ResolvedLocation::new(coordinate, place),
            Err(e) => {
                debug!("Reverse geocoding of picked point failed: {}", e);
                ResolvedLocation::unnamed_point(coordinate)
            }
        }
    }
}
