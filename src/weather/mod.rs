//! Weather retrieval
//!
//! [`WeatherApi`] is the upstream contract; [`WeatherFetcher`] combines its two
//! requests into one [`WeatherReport`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::Result;
use crate::models::{Coordinate, CurrentConditions, HourlySample, WeatherReport};
use crate::units::UnitMode;

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Failures reported by the weather service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Invalid API key")]
    InvalidKey,

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Current conditions found by place name, with the coordinate the service matched
#[derive(Debug, Clone, PartialEq)]
pub struct NamedConditions {
    pub coordinate: Coordinate,
    pub current: CurrentConditions,
}

/// Upstream weather service
#[async_trait]
pub trait WeatherApi: Send + Sync {
    async fn current_conditions(
        &self,
        coordinate: Coordinate,
        unit_mode: UnitMode,
    ) -> std::result::Result<CurrentConditions, ApiError>;

    async fn forecast(
        &self,
        coordinate: Coordinate,
        unit_mode: UnitMode,
    ) -> std::result::Result<Vec<HourlySample>, ApiError>;

    async fn current_conditions_by_name(
        &self,
        name: &str,
        unit_mode: UnitMode,
    ) -> std::result::Result<NamedConditions, ApiError>;
}

/// Fetches current conditions and the forecast series together
#[derive(Clone)]
pub struct WeatherFetcher {
    api: Arc<dyn WeatherApi>,
}

impl WeatherFetcher {
    #[must_use]
    pub fn new(api: Arc<dyn WeatherApi>) -> Self {
        Self { api }
    }

    /// Fetch both series for `coordinate`.
    ///
    /// The two requests run concurrently. Either failing fails the whole fetch.
    #[instrument(skip(self), fields(lat = coordinate.lat, lon = coordinate.lon))]
    pub async fn fetch(&self, coordinate: Coordinate, unit_mode: UnitMode) -> Result<WeatherReport> {
        let (current, hourly) = tokio::try_join!(
            self.api.current_conditions(coordinate, unit_mode),
            self.api.forecast(coordinate, unit_mode),
        )
        .inspect_err(|e| warn!("Weather fetch failed: {}", e))?;

        debug!(
            "Fetched weather for {}: {} forecast samples",
            current.place_name,
            hourly.len()
        );

        Ok(WeatherReport {
            current,
            hourly,
            unit_mode,
            fetched_at: Utc::now(),
        })
    }

    /// Current conditions for a single location
    pub async fn current(
        &self,
        coordinate: Coordinate,
        unit_mode: UnitMode,
    ) -> std::result::Result<CurrentConditions, ApiError> {
        self.api.current_conditions(coordinate, unit_mode).await
    }

    /// Current conditions looked up by place name
    pub async fn current_by_name(
        &self,
        name: &str,
        unit_mode: UnitMode,
    ) -> std::result::Result<NamedConditions, ApiError> {
        self.api.current_conditions_by_name(name, unit_mode).await
    }
}

/// Monotonic token source where only the most recently issued token is current
#[derive(Debug, Default)]
pub struct FetchSequence {
    latest: AtomicU64,
}

impl FetchSequence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new token, superseding all earlier ones
    pub fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    #[must_use]
    pub fn is_current(&self, token: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == token
    }
}
