//! Configuration management for Wild Weather
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::WildWeatherError;
use crate::http::DEFAULT_USER_AGENT;
use crate::models::Coordinate;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the Wild Weather application
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Weather API configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Location services configuration
    #[serde(default)]
    pub geolocation: GeolocationConfig,
    /// Fallback location and search settings
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// Forecast presentation settings
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Persistent storage settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key
    pub api_key: Option<String>,
    /// Base URL for weather and geocoding requests
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Retries for transient failures
    #[serde(default = "default_weather_max_retries")]
    pub max_retries: u32,
}

/// Device position reported by the configured sensor
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DevicePosition {
    pub lat: f64,
    pub lon: f64,
}

/// Location services configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationConfig {
    /// Nominatim-compatible reverse geocoding endpoint
    #[serde(default = "default_reverse_geocode_url")]
    pub reverse_geocode_url: String,
    /// ipapi-compatible IP lookup endpoint
    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,
    /// User agent sent to the location services
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Position reported as the device location; unset means no sensor
    #[serde(default)]
    pub device_position: Option<DevicePosition>,
}

/// Fallback location and search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Label of the fallback location
    #[serde(default = "default_location_name")]
    pub location_name: String,
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    /// Maximum number of search results
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
}

/// Forecast presentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Spacing of the forecast series in hours
    #[serde(default = "default_cadence_hours")]
    pub cadence_hours: u32,
    /// Span of the hourly window in hours
    #[serde(default = "default_hourly_window_hours")]
    pub hourly_window_hours: u32,
}

/// Persistent storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory of the settings database
    #[serde(default = "default_storage_path")]
    pub path: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_weather_base_url() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_weather_max_retries() -> u32 {
    2
}

fn default_reverse_geocode_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_ip_lookup_url() -> String {
    "https://ipapi.co".to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_location_name() -> String {
    "London".to_string()
}

fn default_latitude() -> f64 {
    51.5074
}

fn default_longitude() -> f64 {
    -0.1278
}

fn default_search_limit() -> u32 {
    5
}

fn default_cadence_hours() -> u32 {
    3
}

fn default_hourly_window_hours() -> u32 {
    24
}

fn default_storage_path() -> String {
    dirs::data_dir()
        .map(|dir| dir.join("wildweather").to_string_lossy().into_owned())
        .unwrap_or_else(|| ".wildweather".to_string())
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            timeout_seconds: default_timeout(),
            max_retries: default_weather_max_retries(),
        }
    }
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            reverse_geocode_url: default_reverse_geocode_url(),
            ip_lookup_url: default_ip_lookup_url(),
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout(),
            device_position: None,
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            location_name: default_location_name(),
            latitude: default_latitude(),
            longitude: default_longitude(),
            search_limit: default_search_limit(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            cadence_hours: default_cadence_hours(),
            hourly_window_hours: default_hourly_window_hours(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl DefaultsConfig {
    /// Fallback coordinate, validated
    pub fn coordinate(&self) -> crate::Result<Coordinate> {
        Coordinate::new(self.latitude, self.longitude)
    }
}

impl AppConfig {
    /// Load configuration from a TOML file (default location when `None`) and environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // WILDWEATHER_WEATHER__API_KEY sets weather.api_key
        builder = builder.add_source(
            Environment::with_prefix("WILDWEATHER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AppConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("wildweather").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_timeout();
        }
        if self.geolocation.reverse_geocode_url.is_empty() {
            self.geolocation.reverse_geocode_url = default_reverse_geocode_url();
        }
        if self.geolocation.ip_lookup_url.is_empty() {
            self.geolocation.ip_lookup_url = default_ip_lookup_url();
        }
        if self.geolocation.user_agent.is_empty() {
            self.geolocation.user_agent = default_user_agent();
        }
        if self.geolocation.timeout_seconds == 0 {
            self.geolocation.timeout_seconds = default_timeout();
        }
        if self.defaults.location_name.is_empty() {
            self.defaults.location_name = default_location_name();
        }
        if self.defaults.search_limit == 0 {
            self.defaults.search_limit = default_search_limit();
        }
        if self.forecast.cadence_hours == 0 {
            self.forecast.cadence_hours = default_cadence_hours();
        }
        if self.forecast.hourly_window_hours == 0 {
            self.forecast.hourly_window_hours = default_hourly_window_hours();
        }
        if self.storage.path.is_empty() {
            self.storage.path = default_storage_path();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        // A missing key is allowed so offline commands still work
        if let Some(api_key) = &self.weather.api_key {
            if api_key.is_empty() {
                return Err(WildWeatherError::config(
                    "Weather API key cannot be empty if provided. Either remove it or provide a valid key."
                ).into());
            }

            if api_key.len() < 8 {
                return Err(WildWeatherError::config(
                    "Weather API key appears to be invalid (too short). Please check your API key."
                ).into());
            }

            if api_key.len() > 100 {
                return Err(WildWeatherError::config(
                    "Weather API key appears to be invalid (too long). Please check your API key."
                ).into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds > 300 || self.geolocation.timeout_seconds > 300 {
            return Err(WildWeatherError::config(
                "Request timeout cannot exceed 300 seconds"
            ).into());
        }

        if self.weather.max_retries > 10 {
            return Err(WildWeatherError::config(
                "Weather API max retries cannot exceed 10"
            ).into());
        }

        if self.defaults.search_limit > 50 {
            return Err(WildWeatherError::config(
                "Search limit cannot exceed 50"
            ).into());
        }

        if self.forecast.cadence_hours > 24 {
            return Err(WildWeatherError::config(
                "Forecast cadence cannot exceed 24 hours"
            ).into());
        }

        self.defaults
            .coordinate()
            .map_err(|e| WildWeatherError::config(format!("Invalid default location: {e}")))?;

        if let Some(position) = self.geolocation.device_position {
            Coordinate::new(position.lat, position.lon)
                .map_err(|e| WildWeatherError::config(format!("Invalid device position: {e}")))?;
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WildWeatherError::config(
                format!("Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_log_levels.join(", ")
                )
            ).into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WildWeatherError::config(
                format!("Invalid log format '{}'. Must be one of: {}",
                    self.logging.format,
                    valid_log_formats.join(", ")
                )
            ).into());
        }

        for (name, url) in [
            ("Weather API base URL", &self.weather.base_url),
            ("Reverse geocoding URL", &self.geolocation.reverse_geocode_url),
            ("IP lookup URL", &self.geolocation.ip_lookup_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(WildWeatherError::config(
                    format!("{name} must be a valid HTTP or HTTPS URL")
                ).into());
            }
        }

        Ok(())
    }
}
