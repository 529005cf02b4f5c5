//! Forward geocoding through the OpenWeatherMap geocoding API

use std::time::Duration;

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{ForwardGeocoder, GeocodeError, SearchResult};
use crate::config::WeatherConfig;
use crate::http;
use crate::models::Coordinate;

pub struct OpenWeatherGeocoder {
    client: ClientWithMiddleware,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct DirectResult {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: String,
    state: Option<String>,
}

impl OpenWeatherGeocoder {
    pub fn new(config: &WeatherConfig, user_agent: &str) -> Result<Self, GeocodeError> {
        let client = http::build_client(Duration::from_secs(config.timeout_seconds), user_agent, 0)
            .map_err(|e| GeocodeError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone().unwrap_or_default(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ForwardGeocoder for OpenWeatherGeocoder {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchResult>, GeocodeError> {
        let url = format!(
            "{}/geo/1.0/direct?q={}&limit={}&appid={}",
            self.base_url,
            urlencoding::encode(query),
            limit,
            urlencoding::encode(&self.api_key)
        );
        let results: Vec<DirectResult> = http::get_json(&self.client, &url).await?;
        debug!("Geocoding '{}' returned {} results", query, results.len());

        Ok(results
            .into_iter()
            .filter_map(|r| {
                Coordinate::new(r.lat, r.lon).ok().map(|coordinate| SearchResult {
                    name: r.name,
                    country: r.country,
                    state: r.state,
                    coordinate,
                })
            })
            .collect())
    }
}
