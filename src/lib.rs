//! Wild Weather - location-aware weather aggregation
//!
//! This library resolves the user's location through a fallback chain, fetches
//! current conditions and the forecast series for it, and derives daily buckets,
//! activity suggestions and threshold alerts. Saved locations carry live
//! temperature lookups.

pub mod alerts;
pub mod app;
pub mod config;
pub mod error;
pub mod forecast;
pub mod geo;
pub mod http;
pub mod location_resolver;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod preferences;
pub mod saved_locations;
pub mod store;
pub mod suggestion;
pub mod units;
pub mod weather;

// Re-export core types for public API
pub use alerts::{AlertBook, AlertRule, Comparison, NewAlert};
pub use config::AppConfig;
pub use error::WildWeatherError;
pub use location_resolver::LocationResolver;
pub use models::{Coordinate, CurrentConditions, DailyBucket, HourlySample, ResolvedLocation};
pub use pipeline::{PipelineState, WeatherPipeline, WeatherView};
pub use saved_locations::{LiveTemperature, SavedLocationStore};
pub use store::{FjallStore, KeyValueStore, MemoryStore};
pub use units::UnitMode;
pub use weather::{ApiError, WeatherApi, WeatherFetcher};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WildWeatherError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
