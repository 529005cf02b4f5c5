//! Data models for the Wild Weather pipeline
//!
//! This module contains the core domain models organized by concern:
//! - Location: coordinates, resolved and saved locations
//! - Weather: normalized current conditions and forecast samples
//! - Forecast: daily buckets derived from the forecast series

pub mod forecast;
pub mod location;
pub mod weather;

// Re-export all public types for convenient access
pub use forecast::DailyBucket;
pub use location::{
    Coordinate, ResolvedLocation, SavedLocation, UNKNOWN_LOCATION, condense_place_name,
};
pub use weather::{Condition, CurrentConditions, HourlySample, Metric, WeatherReport};
