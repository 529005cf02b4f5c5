//! Error types and handling for the Wild Weather pipeline

use thiserror::Error;

use crate::weather::ApiError;

/// Message shown when the active location's weather cannot be fetched.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch weather data. Please try again.";

/// Main error type for the Wild Weather application
#[derive(Error, Debug)]
pub enum WildWeatherError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Current conditions or forecast could not be retrieved
    #[error("Weather fetch failed: {source}")]
    FetchFailed {
        #[from]
        source: ApiError,
    },

    /// Key-value store errors
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl WildWeatherError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            WildWeatherError::Config { .. } => {
                "Configuration error. Please check your config file and API key.".to_string()
            }
            WildWeatherError::FetchFailed { .. } => FETCH_FAILED_MESSAGE.to_string(),
            WildWeatherError::Storage { .. } => {
                "Could not read or write saved settings.".to_string()
            }
            WildWeatherError::Validation { message } => format!("Invalid input: {message}"),
            WildWeatherError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
