//! Reverse geocoding through a Nominatim server

use std::time::Duration;

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{GeocodeError, ReverseGeocoder};
use crate::config::GeolocationConfig;
use crate::http;
use crate::models::Coordinate;

pub struct NominatimClient {
    client: ClientWithMiddleware,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

impl NominatimClient {
    pub fn new(config: &GeolocationConfig) -> Result<Self, GeocodeError> {
        // Nominatim rejects requests without an identifying user agent
        let client = http::build_client(
            Duration::from_secs(config.timeout_seconds),
            &config.user_agent,
            0,
        )
        .map_err(|e| GeocodeError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.reverse_geocode_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimClient {
    #[instrument(skip(self), fields(lat = coordinate.lat, lon = coordinate.lon))]
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<String, GeocodeError> {
        let url = format!(
            "{}/reverse?lat={}&lon={}&format=json",
            self.base_url, coordinate.lat, coordinate.lon
        );
        let response: ReverseResponse = http::get_json(&self.client, &url).await?;

        if let Some(error) = response.error {
            debug!("Reverse geocoding returned no place: {}", error);
            return Err(GeocodeError::NotFound);
        }
        response
            .display_name
            .filter(|name| !name.trim().is_empty())
            .ok_or(GeocodeError::NotFound)
    }
}
