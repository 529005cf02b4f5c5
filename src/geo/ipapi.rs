//! IP geolocation through ipapi.co

use std::time::Duration;

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::{GeocodeError, IpGeolocationService, IpLocation};
use crate::config::GeolocationConfig;
use crate::http;
use crate::models::Coordinate;

pub struct IpApiClient {
    client: ClientWithMiddleware,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    city: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

impl IpApiClient {
    pub fn new(config: &GeolocationConfig) -> Result<Self, GeocodeError> {
        let client = http::build_client(
            Duration::from_secs(config.timeout_seconds),
            &config.user_agent,
            0,
        )
        .map_err(|e| GeocodeError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.ip_lookup_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl IpGeolocationService for IpApiClient {
    #[instrument(skip(self))]
    async fn locate(&self) -> Result<IpLocation, GeocodeError> {
        let url = format!("{}/json/", self.base_url);
        let response: IpApiResponse = http::get_json(&self.client, &url).await?;

        if response.error {
            let reason = response.reason.unwrap_or_default();
            warn!("IP lookup refused: {}", reason);
            return Err(GeocodeError::Network(reason));
        }

        let (Some(lat), Some(lon)) = (response.latitude, response.longitude) else {
            return Err(GeocodeError::NotFound);
        };
        let coordinate = Coordinate::new(lat, lon).map_err(|_| GeocodeError::NotFound)?;

        info!("IP lookup placed client in {}, {}", response.city, response.country);
        Ok(IpLocation {
            coordinate,
            city: response.city,
            country: response.country,
        })
    }
}
