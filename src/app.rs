//! Assembly of the pipeline from configuration

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::alerts::AlertBook;
use crate::config::AppConfig;
use crate::geo::{ConfiguredSensor, IpApiClient, NominatimClient, OpenWeatherGeocoder};
use crate::location_resolver::LocationResolver;
use crate::models::ResolvedLocation;
use crate::pipeline::{PipelineParts, PipelineSettings, WeatherPipeline};
use crate::preferences::PreferenceStore;
use crate::saved_locations::SavedLocationStore;
use crate::store::{FjallStore, KeyValueStore};
use crate::weather::{OpenWeatherClient, WeatherFetcher};

impl PipelineSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            search_limit: config.defaults.search_limit,
            cadence_hours: config.forecast.cadence_hours,
            hourly_window_hours: config.forecast.hourly_window_hours,
        }
    }
}

/// Open the on-disk settings store named in the configuration
pub fn open_store(config: &AppConfig) -> Result<Arc<dyn KeyValueStore>> {
    let store = FjallStore::open(&config.storage.path)
        .with_context(|| format!("Failed to open settings store at {}", config.storage.path))?;
    Ok(Arc::new(store))
}

/// Wire the HTTP clients and persisted stores into a pipeline
pub async fn build_pipeline(
    config: &AppConfig,
    store: Arc<dyn KeyValueStore>,
) -> Result<WeatherPipeline> {
    let user_agent = config.geolocation.user_agent.as_str();

    let weather = OpenWeatherClient::new(&config.weather, user_agent)
        .context("Failed to create weather client")?;
    let fetcher = WeatherFetcher::new(Arc::new(weather));

    let reverse = NominatimClient::new(&config.geolocation)
        .context("Failed to create reverse geocoding client")?;
    let ip = IpApiClient::new(&config.geolocation).context("Failed to create IP lookup client")?;
    let geocoder = OpenWeatherGeocoder::new(&config.weather, user_agent)
        .context("Failed to create geocoding client")?;

    let fallback = ResolvedLocation::new(
        config.defaults.coordinate()?,
        config.defaults.location_name.clone(),
    );
    let resolver = LocationResolver::new(
        Arc::new(ConfiguredSensor::new(config.geolocation.device_position)),
        Arc::new(reverse),
        Arc::new(ip),
        fallback,
    );

    let saved = SavedLocationStore::load(store.clone(), fetcher.clone()).await?;
    let alerts = AlertBook::load(store.clone()).await?;
    let preferences = PreferenceStore::load(store).await?;

    tracing::info!("Pipeline assembled");
    Ok(WeatherPipeline::new(PipelineParts {
        resolver,
        fetcher,
        geocoder: Arc::new(geocoder),
        saved,
        alerts,
        preferences,
        settings: PipelineSettings::from_config(config),
    }))
}
