//! OpenWeatherMap client
//!
//! Uses the `/data/2.5/weather` and `/data/2.5/forecast` endpoints. Temperature and
//! wind speed come back in the requested unit system; visibility is always meters.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::{ApiError, NamedConditions, WeatherApi};
use crate::config::WeatherConfig;
use crate::http;
use crate::models::{Condition, Coordinate, CurrentConditions, HourlySample};
use crate::units::UnitMode;

/// Visibility assumed when the feed omits it
pub const DEFAULT_VISIBILITY_METERS: f64 = 10_000.0;

const SLOW_RESPONSE: Duration = Duration::from_secs(5);

/// Client for the OpenWeatherMap REST API
pub struct OpenWeatherClient {
    client: ClientWithMiddleware,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    coord: CoordPayload,
    #[serde(default)]
    weather: Vec<WeatherPayload>,
    main: MainPayload,
    visibility: Option<f64>,
    wind: WindPayload,
    #[serde(default)]
    clouds: CloudsPayload,
    sys: SysPayload,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct CoordPayload {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct WeatherPayload {
    #[serde(default)]
    icon: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct MainPayload {
    temp: f64,
    #[serde(default)]
    feels_like: Option<f64>,
    pressure: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct WindPayload {
    speed: f64,
}

#[derive(Debug, Deserialize, Default)]
struct CloudsPayload {
    #[serde(default)]
    all: f64,
}

#[derive(Debug, Deserialize)]
struct SysPayload {
    country: Option<String>,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    dt: i64,
    main: MainPayload,
    #[serde(default)]
    weather: Vec<WeatherPayload>,
    #[serde(default)]
    clouds: CloudsPayload,
    wind: WindPayload,
    visibility: Option<f64>,
}

fn condition_from(weather: Vec<WeatherPayload>) -> Condition {
    weather
        .into_iter()
        .next()
        .map(|w| Condition {
            icon: w.icon,
            description: w.description,
        })
        .unwrap_or_default()
}

fn timestamp(seconds: i64) -> Result<DateTime<Utc>, ApiError> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| ApiError::Parse(format!("invalid timestamp {seconds}")))
}

impl CurrentResponse {
    fn coordinate(&self) -> Coordinate {
        Coordinate {
            lat: self.coord.lat,
            lon: self.coord.lon,
        }
    }

    fn normalize(self) -> Result<CurrentConditions, ApiError> {
        Ok(CurrentConditions {
            temperature: self.main.temp,
            feels_like: self.main.feels_like.unwrap_or(self.main.temp),
            condition: condition_from(self.weather),
            wind_speed: self.wind.speed,
            visibility_meters: self.visibility.unwrap_or(DEFAULT_VISIBILITY_METERS),
            humidity_pct: self.main.humidity,
            pressure_hpa: self.main.pressure,
            clouds_pct: self.clouds.all,
            uv_index: None,
            sunrise: timestamp(self.sys.sunrise)?,
            sunset: timestamp(self.sys.sunset)?,
            country_code: self.sys.country.unwrap_or_default(),
            place_name: self.name,
        })
    }
}

impl ForecastEntry {
    fn normalize(self) -> Result<HourlySample, ApiError> {
        Ok(HourlySample {
            dt: timestamp(self.dt)?,
            temperature: self.main.temp,
            wind_speed: self.wind.speed,
            visibility_meters: self.visibility.unwrap_or(DEFAULT_VISIBILITY_METERS),
            humidity_pct: self.main.humidity,
            pressure_hpa: self.main.pressure,
            clouds_pct: self.clouds.all,
            condition: condition_from(self.weather),
        })
    }
}

impl OpenWeatherClient {
    /// Create a client from the weather configuration section
    pub fn new(config: &WeatherConfig, user_agent: &str) -> Result<Self, ApiError> {
        let client = http::build_client(
            Duration::from_secs(config.timeout_seconds),
            user_agent,
            config.max_retries,
        )
        .map_err(|e| ApiError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone().unwrap_or_default(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn coordinate_url(&self, endpoint: &str, coordinate: Coordinate, unit_mode: UnitMode) -> String {
        format!(
            "{}/data/2.5/{}?lat={}&lon={}&appid={}&units={}",
            self.base_url,
            endpoint,
            coordinate.lat,
            coordinate.lon,
            urlencoding::encode(&self.api_key),
            unit_mode.api_param()
        )
    }

    async fn timed_get<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        what: &str,
    ) -> Result<T, ApiError> {
        let start_time = Instant::now();
        let result = http::get_json(&self.client, url).await;
        let elapsed = start_time.elapsed();

        if elapsed > SLOW_RESPONSE {
            warn!("Slow {} response: {:.3}s", what, elapsed.as_secs_f64());
        }
        match &result {
            Ok(_) => debug!("{} response in {:.3}s", what, elapsed.as_secs_f64()),
            Err(e) => warn!("{} request failed after {:.3}s: {}", what, elapsed.as_secs_f64(), e),
        }
        result
    }
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    #[instrument(skip(self), fields(lat = coordinate.lat, lon = coordinate.lon))]
    async fn current_conditions(
        &self,
        coordinate: Coordinate,
        unit_mode: UnitMode,
    ) -> Result<CurrentConditions, ApiError> {
        info!(
            "Getting current weather for coordinates: {}",
            coordinate.format_coordinates()
        );
        let url = self.coordinate_url("weather", coordinate, unit_mode);
        let response: CurrentResponse = self.timed_get(&url, "current weather").await?;
        response.normalize()
    }

    #[instrument(skip(self), fields(lat = coordinate.lat, lon = coordinate.lon))]
    async fn forecast(
        &self,
        coordinate: Coordinate,
        unit_mode: UnitMode,
    ) -> Result<Vec<HourlySample>, ApiError> {
        info!(
            "Getting forecast for coordinates: {}",
            coordinate.format_coordinates()
        );
        let url = self.coordinate_url("forecast", coordinate, unit_mode);
        let response: ForecastResponse = self.timed_get(&url, "forecast").await?;

        let samples = response
            .list
            .into_iter()
            .map(ForecastEntry::normalize)
            .collect::<Result<Vec<_>, _>>()?;
        info!("Retrieved {} forecast samples", samples.len());
        Ok(samples)
    }

    #[instrument(skip(self))]
    async fn current_conditions_by_name(
        &self,
        name: &str,
        unit_mode: UnitMode,
    ) -> Result<NamedConditions, ApiError> {
        let url = format!(
            "{}/data/2.5/weather?q={}&appid={}&units={}",
            self.base_url,
            urlencoding::encode(name),
            urlencoding::encode(&self.api_key),
            unit_mode.api_param()
        );
        let response: CurrentResponse = self.timed_get(&url, "current weather by name").await?;
        let coordinate = response.coordinate();
        Ok(NamedConditions {
            coordinate,
            current: response.normalize()?,
        })
    }
}
