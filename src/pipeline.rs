//! Weather pipeline
//!
//! Ties location resolution, weather fetching, aggregation, suggestions, alerts
//! and saved locations together. Only the most recently started fetch may update
//! the view; anything older is dropped on arrival.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::alerts::{AlertBook, AlertRule, NewAlert};
use crate::error::FETCH_FAILED_MESSAGE;
use crate::forecast;
use crate::geo::{ForwardGeocoder, SearchResult};
use crate::location_resolver::LocationResolver;
use crate::models::{
    Coordinate, DailyBucket, HourlySample, ResolvedLocation, WeatherReport, condense_place_name,
};
use crate::preferences::{PreferenceStore, Theme};
use crate::saved_locations::{LiveTemperature, SavedLocationStore};
use crate::suggestion;
use crate::units::{UnitLabels, UnitMode};
use crate::weather::{FetchSequence, WeatherFetcher};
use crate::{Result, WildWeatherError};

/// Tunables for the derived outputs
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub search_limit: u32,
    pub cadence_hours: u32,
    pub hourly_window_hours: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            search_limit: 5,
            cadence_hours: 3,
            hourly_window_hours: 24,
        }
    }
}

/// Everything the presentation layer renders for the active location
#[derive(Debug, Clone, Serialize)]
pub struct WeatherView {
    pub location: ResolvedLocation,
    /// `"{name}, {country}"`, also the name used when saving the location
    pub headline: String,
    pub report: WeatherReport,
    pub labels: UnitLabels,
    pub daily: Vec<DailyBucket>,
    pub hourly: Vec<HourlySample>,
    pub suggestion: String,
    pub triggered_alerts: Vec<u64>,
}

impl WeatherView {
    fn build(
        location: ResolvedLocation,
        report: WeatherReport,
        triggered_alerts: Vec<u64>,
        settings: &PipelineSettings,
    ) -> Self {
        let current = &report.current;
        let suggestion = suggestion::suggest(
            &current.condition.description,
            current.temperature,
            current.wind_speed,
            current.humidity_pct,
        );
        let hourly = forecast::hourly_window(
            &report.hourly,
            settings.hourly_window_hours,
            settings.cadence_hours,
        )
        .to_vec();

        Self {
            headline: headline(&location, &report),
            labels: report.unit_mode.labels(),
            daily: forecast::group_by_day(&report.hourly),
            hourly,
            suggestion: suggestion.to_string(),
            triggered_alerts,
            location,
            report,
        }
    }
}

fn headline(location: &ResolvedLocation, report: &WeatherReport) -> String {
    let name = if location.display_name.trim().is_empty() {
        report.current.place_name.as_str()
    } else {
        location.display_name.as_str()
    };
    let country = &report.current.country_code;
    if country.is_empty() {
        condense_place_name(name)
    } else {
        condense_place_name(&format!("{name}, {country}"))
    }
}

/// State of the active location's weather
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PipelineState {
    Idle,
    Loading { location: ResolvedLocation },
    Ready(Box<WeatherView>),
    Failed { location: ResolvedLocation, message: String },
}

/// Collaborators the pipeline is assembled from
pub struct PipelineParts {
    pub resolver: LocationResolver,
    pub fetcher: WeatherFetcher,
    pub geocoder: Arc<dyn ForwardGeocoder>,
    pub saved: SavedLocationStore,
    pub alerts: AlertBook,
    pub preferences: PreferenceStore,
    pub settings: PipelineSettings,
}

pub struct WeatherPipeline {
    resolver: LocationResolver,
    fetcher: WeatherFetcher,
    geocoder: Arc<dyn ForwardGeocoder>,
    saved: SavedLocationStore,
    alerts: AlertBook,
    preferences: PreferenceStore,
    settings: PipelineSettings,
    sequence: FetchSequence,
    active: RwLock<Option<ResolvedLocation>>,
    state: RwLock<PipelineState>,
}

impl WeatherPipeline {
    #[must_use]
    pub fn new(parts: PipelineParts) -> Self {
        Self {
            resolver: parts.resolver,
            fetcher: parts.fetcher,
            geocoder: parts.geocoder,
            saved: parts.saved,
            alerts: parts.alerts,
            preferences: parts.preferences,
            settings: parts.settings,
            sequence: FetchSequence::new(),
            active: RwLock::new(None),
            state: RwLock::new(PipelineState::Idle),
        }
    }

    pub async fn state(&self) -> PipelineState {
        self.state.read().await.clone()
    }

    pub async fn active_location(&self) -> Option<ResolvedLocation> {
        self.active.read().await.clone()
    }

    #[must_use]
    pub fn saved(&self) -> &SavedLocationStore {
        &self.saved
    }

    #[must_use]
    pub fn alerts(&self) -> &AlertBook {
        &self.alerts
    }

    #[must_use]
    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    /// Resolve the starting location, then load its weather and the saved
    /// locations' live temperatures side by side.
    pub async fn start(&self) -> Result<()> {
        let location = self.resolver.resolve().await;
        let unit_mode = self.preferences.get().await.unit_mode;

        let (loaded, ()) = tokio::join!(
            self.select_location(location),
            self.saved.refresh_all(unit_mode)
        );
        loaded
    }

    /// Make `location` active and load its weather.
    ///
    /// Returns an error when this fetch failed. A result that arrives after a newer
    /// selection has started is discarded without touching the state.
    pub async fn select_location(&self, location: ResolvedLocation) -> Result<()> {
        self.load(location).await
    }

    /// Select a point picked on the map
    pub async fn select_point(&self, coordinate: Coordinate) -> Result<()> {
        let location = self.resolver.resolve_point(coordinate).await;
        self.select_location(location).await
    }

    /// Select a forward geocoding result
    pub async fn select_search_result(&self, result: &SearchResult) -> Result<()> {
        self.select_location(result.to_resolved()).await
    }

    /// Select a saved location by name.
    ///
    /// Entries saved without coordinates use the coordinate found by their live
    /// lookup, or a fresh name lookup.
    pub async fn select_saved(&self, name: &str) -> Result<()> {
        let saved = self
            .saved
            .list()
            .await
            .into_iter()
            .find(|l| l.name == name)
            .ok_or_else(|| WildWeatherError::validation(format!("No saved location named '{name}'")))?;

        let coordinate = match saved.coordinate() {
            Some(coordinate) => coordinate,
            None => match self.saved.live_temperature(name).await {
                Some(LiveTemperature::Reading { coordinate, .. }) => coordinate,
                _ => {
                    let unit_mode = self.preferences.get().await.unit_mode;
                    self.fetcher.current_by_name(name, unit_mode).await?.coordinate
                }
            },
        };

        self.select_location(ResolvedLocation::new(coordinate, saved.name))
            .await
    }

    /// Re-run the fetch for the active location, if any
    pub async fn reload(&self) -> Result<()> {
        match self.active_location().await {
            Some(location) => self.load(location).await,
            None => Ok(()),
        }
    }

    async fn load(&self, location: ResolvedLocation) -> Result<()> {
        let token = self.sequence.begin();
        let unit_mode = self.preferences.get().await.unit_mode;
        {
            let mut state = self.state.write().await;
            if self.sequence.is_current(token) {
                *state = PipelineState::Loading {
                    location: location.clone(),
                };
                *self.active.write().await = Some(location.clone());
            }
        }
        debug!(
            "Fetch {} started for {} in {}",
            token, location.display_name, unit_mode
        );

        let result = self.fetcher.fetch(location.coordinate, unit_mode).await;

        let next = match &result {
            Ok(report) => {
                let triggered = self.alerts.evaluate(&report.current).await;
                PipelineState::Ready(Box::new(WeatherView::build(
                    location,
                    report.clone(),
                    triggered,
                    &self.settings,
                )))
            }
            Err(e) => {
                warn!("Weather for {} unavailable: {}", location.display_name, e);
                PipelineState::Failed {
                    location,
                    message: FETCH_FAILED_MESSAGE.to_string(),
                }
            }
        };

        // Checked under the write lock so a newer fetch cannot be overwritten
        let mut state = self.state.write().await;
        if self.sequence.is_current(token) {
            *state = next;
        } else {
            debug!("Discarding stale fetch {}", token);
        }
        result.map(|_| ())
    }

    /// Persist a unit mode and, when it changed, reload the active location and
    /// every saved location's live temperature.
    pub async fn set_unit_mode(&self, unit_mode: UnitMode) -> Result<()> {
        if !self.preferences.set_unit_mode(unit_mode).await? {
            return Ok(());
        }
        info!("Unit mode changed to {}", unit_mode);

        let (reloaded, ()) = tokio::join!(self.reload(), self.saved.refresh_all(unit_mode));
        reloaded
    }

    /// Persist a theme. Presentation only, nothing is refetched.
    pub async fn set_theme(&self, theme: Theme) -> Result<()> {
        self.preferences.set_theme(theme).await?;
        Ok(())
    }

    /// Forward search. A blank query or a failing service yields no results.
    pub async fn search(&self, query: &str) -> Vec<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        match self.geocoder.search(query, self.settings.search_limit).await {
            Ok(results) => results,
            Err(e) => {
                warn!("Search for '{}' failed: {}", query, e);
                Vec::new()
            }
        }
    }

    /// Save the active location under its headline.
    ///
    /// Returns whether it was added; nothing is saved until weather has loaded.
    pub async fn save_active_location(&self) -> Result<bool> {
        let (name, coordinate) = match &*self.state.read().await {
            PipelineState::Ready(view) => (view.headline.clone(), view.location.coordinate),
            _ => return Ok(false),
        };

        let added = self.saved.save(&name, coordinate).await?;
        if added {
            let unit_mode = self.preferences.get().await.unit_mode;
            if let Some(location) = self.saved.list().await.into_iter().find(|l| l.name == name) {
                self.saved.refresh_one(&location, unit_mode).await;
            }
        }
        Ok(added)
    }

    pub async fn add_alert(&self, alert: NewAlert) -> Result<AlertRule> {
        let rule = self.alerts.add(alert).await?;
        self.reevaluate_alerts().await;
        Ok(rule)
    }

    pub async fn remove_alert(&self, id: u64) -> Result<bool> {
        let removed = self.alerts.remove(id).await?;
        self.reevaluate_alerts().await;
        Ok(removed)
    }

    pub async fn toggle_alert(&self, id: u64) -> Result<Option<bool>> {
        let toggled = self.alerts.toggle(id).await?;
        self.reevaluate_alerts().await;
        Ok(toggled)
    }

    async fn reevaluate_alerts(&self) {
        let mut state = self.state.write().await;
        if let PipelineState::Ready(view) = &mut *state {
            view.triggered_alerts = self.alerts.evaluate(&view.report.current).await;
        }
    }
}
