//! Saved locations with live temperature lookups
//!
//! Locations are keyed by exact name. Live temperatures are held in a map owned
//! by the store and rebuilt whenever the unit mode changes.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::Result;
use crate::models::{Coordinate, SavedLocation};
use crate::store::{self, KeyValueStore};
use crate::units::UnitMode;
use crate::weather::WeatherFetcher;

/// Storage key of the saved location document
pub const LOCATIONS_KEY: &str = "locations";

/// Text shown when a live temperature cannot be fetched
pub const UNAVAILABLE: &str = "N/A";

/// Outcome of a live temperature lookup
#[derive(Debug, Clone, PartialEq)]
pub enum LiveTemperature {
    Reading {
        temperature: f64,
        unit_mode: UnitMode,
        /// Coordinate the reading was taken at, also known for name-only entries
        coordinate: Coordinate,
    },
    Unavailable,
}

impl fmt::Display for LiveTemperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiveTemperature::Reading {
                temperature,
                unit_mode,
                ..
            } => f.write_str(&unit_mode.format_temperature(*temperature)),
            LiveTemperature::Unavailable => f.write_str(UNAVAILABLE),
        }
    }
}

/// Live readings of one refresh generation
#[derive(Debug, Default)]
struct LiveCache {
    generation: u64,
    /// Unit mode of the latest `refresh_all`, unset until the first one
    unit_mode: Option<UnitMode>,
    readings: HashMap<String, LiveTemperature>,
}

impl LiveCache {
    fn invalidate(&mut self) -> u64 {
        self.generation += 1;
        self.readings.clear();
        self.generation
    }
}

pub struct SavedLocationStore {
    store: Arc<dyn KeyValueStore>,
    fetcher: WeatherFetcher,
    locations: Mutex<Vec<SavedLocation>>,
    live: Mutex<LiveCache>,
}

impl SavedLocationStore {
    /// Load saved locations, resetting the list when the stored document is unreadable
    pub async fn load(store: Arc<dyn KeyValueStore>, fetcher: WeatherFetcher) -> Result<Self> {
        let locations: Vec<SavedLocation> =
            store::load_document(store.as_ref(), LOCATIONS_KEY).await?;
        debug!("Loaded {} saved locations", locations.len());
        Ok(Self {
            store,
            fetcher,
            locations: Mutex::new(locations),
            live: Mutex::new(LiveCache::default()),
        })
    }

    pub async fn list(&self) -> Vec<SavedLocation> {
        self.locations.lock().await.clone()
    }

    /// Save a location. Empty and already-saved names are ignored.
    ///
    /// Returns whether the location was added.
    pub async fn save(&self, name: &str, coordinate: Coordinate) -> Result<bool> {
        if name.trim().is_empty() {
            return Ok(false);
        }

        let mut locations = self.locations.lock().await;
        if locations.iter().any(|l| l.name == name) {
            debug!("'{}' is already saved", name);
            return Ok(false);
        }

        let mut updated = locations.clone();
        updated.push(SavedLocation::new(name, coordinate));
        store::save_document(self.store.as_ref(), LOCATIONS_KEY, &updated).await?;
        *locations = updated;

        info!("Saved location '{}'", name);
        Ok(true)
    }

    /// Remove a location by exact name. Removing an absent name does nothing.
    pub async fn remove(&self, name: &str) -> Result<bool> {
        let mut locations = self.locations.lock().await;
        if !locations.iter().any(|l| l.name == name) {
            return Ok(false);
        }

        let updated: Vec<SavedLocation> =
            locations.iter().filter(|l| l.name != name).cloned().collect();
        store::save_document(self.store.as_ref(), LOCATIONS_KEY, &updated).await?;
        *locations = updated;
        self.live.lock().await.readings.remove(name);

        info!("Removed saved location '{}'", name);
        Ok(true)
    }

    /// Erase every saved location
    pub async fn clear(&self) -> Result<()> {
        let mut locations = self.locations.lock().await;
        store::save_document(self.store.as_ref(), LOCATIONS_KEY, &Vec::<SavedLocation>::new())
            .await?;
        locations.clear();
        self.invalidate().await;

        info!("Cleared saved locations");
        Ok(())
    }

    /// Fetch the current temperature for one location.
    ///
    /// Looks up by coordinate when the entry has one, otherwise by name.
    pub async fn lookup_live_temperature(
        &self,
        location: &SavedLocation,
        unit_mode: UnitMode,
    ) -> LiveTemperature {
        let result = match location.coordinate() {
            Some(coordinate) => self
                .fetcher
                .current(coordinate, unit_mode)
                .await
                .map(|current| (current.temperature, coordinate)),
            None => self
                .fetcher
                .current_by_name(&location.name, unit_mode)
                .await
                .map(|found| (found.current.temperature, found.coordinate)),
        };

        match result {
            Ok((temperature, coordinate)) => LiveTemperature::Reading {
                temperature,
                unit_mode,
                coordinate,
            },
            Err(e) => {
                debug!("Live temperature for '{}' unavailable: {}", location.name, e);
                LiveTemperature::Unavailable
            }
        }
    }

    /// Drop every cached live temperature
    pub async fn invalidate(&self) {
        self.live.lock().await.invalidate();
    }

    /// Invalidate and re-run the lookup for every saved location.
    ///
    /// Lookups run concurrently and each result is recorded as it arrives. Results
    /// from a superseded refresh are dropped.
    pub async fn refresh_all(&self, unit_mode: UnitMode) {
        let generation = {
            let mut live = self.live.lock().await;
            live.unit_mode = Some(unit_mode);
            live.invalidate()
        };

        let locations = self.list().await;
        debug!("Refreshing {} live temperatures", locations.len());

        join_all(
            locations
                .iter()
                .map(|location| self.refresh_in_generation(location, unit_mode, generation)),
        )
        .await;
    }

    /// Look up one location within the current refresh generation.
    ///
    /// Uses the unit mode of that generation; `unit_mode` only applies before the
    /// first `refresh_all`.
    pub async fn refresh_one(&self, location: &SavedLocation, unit_mode: UnitMode) {
        let (generation, unit_mode) = {
            let live = self.live.lock().await;
            (live.generation, live.unit_mode.unwrap_or(unit_mode))
        };
        self.refresh_in_generation(location, unit_mode, generation).await;
    }

    async fn refresh_in_generation(
        &self,
        location: &SavedLocation,
        unit_mode: UnitMode,
        generation: u64,
    ) {
        let reading = self.lookup_live_temperature(location, unit_mode).await;
        // Checked under the lock so an invalidation cannot slip in between
        let mut live = self.live.lock().await;
        if live.generation != generation {
            debug!("Discarding stale live temperature for '{}'", location.name);
            return;
        }
        live.readings.insert(location.name.clone(), reading);
    }

    /// Cached live temperature for a saved name, `None` while not yet looked up
    pub async fn live_temperature(&self, name: &str) -> Option<LiveTemperature> {
        self.live.lock().await.readings.get(name).cloned()
    }

    /// Saved locations paired with their cached live temperatures
    pub async fn with_live_temperatures(&self) -> Vec<(SavedLocation, Option<LiveTemperature>)> {
        let locations = self.list().await;
        let live = self.live.lock().await;
        locations
            .into_iter()
            .map(|location| {
                let reading = live.readings.get(&location.name).cloned();
                (location, reading)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::weather::fixtures::current;
    use crate::models::{CurrentConditions, HourlySample};
    use crate::store::MemoryStore;
    use crate::weather::{ApiError, NamedConditions, WeatherApi};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves 10° metric / 50° imperial, and fails for latitudes above 80
    struct ThermometerApi;

    fn reading(unit_mode: UnitMode) -> f64 {
        match unit_mode {
            UnitMode::Metric => 10.0,
            UnitMode::Imperial => 50.0,
        }
    }

    #[async_trait]
    impl WeatherApi for ThermometerApi {
        async fn current_conditions(
            &self,
            coordinate: Coordinate,
            unit_mode: UnitMode,
        ) -> std::result::Result<CurrentConditions, ApiError> {
            if coordinate.lat > 80.0 {
                return Err(ApiError::Network("unreachable".to_string()));
            }
            Ok(current(reading(unit_mode), "clear sky"))
        }

        async fn forecast(
            &self,
            _coordinate: Coordinate,
            _unit_mode: UnitMode,
        ) -> std::result::Result<Vec<HourlySample>, ApiError> {
            Ok(Vec::new())
        }

        async fn current_conditions_by_name(
            &self,
            name: &str,
            unit_mode: UnitMode,
        ) -> std::result::Result<NamedConditions, ApiError> {
            if name == "Atlantis" {
                return Err(ApiError::Network("city not found".to_string()));
            }
            Ok(NamedConditions {
                coordinate: Coordinate { lat: 59.91, lon: 10.75 },
                current: current(reading(unit_mode), "clear sky"),
            })
        }
    }

    const OSLO: Coordinate = Coordinate { lat: 59.91, lon: 10.75 };
    const ROME: Coordinate = Coordinate { lat: 41.9, lon: 12.5 };

    /// Thermometer whose metric readings arrive late
    struct SlowMetricApi {
        metric_answers: AtomicUsize,
    }

    #[async_trait]
    impl WeatherApi for SlowMetricApi {
        async fn current_conditions(
            &self,
            _coordinate: Coordinate,
            unit_mode: UnitMode,
        ) -> std::result::Result<CurrentConditions, ApiError> {
            if unit_mode == UnitMode::Metric {
                tokio::time::sleep(Duration::from_millis(50)).await;
                self.metric_answers.fetch_add(1, Ordering::SeqCst);
            }
            Ok(current(reading(unit_mode), "clear sky"))
        }

        async fn forecast(
            &self,
            _coordinate: Coordinate,
            _unit_mode: UnitMode,
        ) -> std::result::Result<Vec<HourlySample>, ApiError> {
            Ok(Vec::new())
        }

        async fn current_conditions_by_name(
            &self,
            _name: &str,
            _unit_mode: UnitMode,
        ) -> std::result::Result<NamedConditions, ApiError> {
            Err(ApiError::Network("not supported".to_string()))
        }
    }

    async fn new_store() -> (Arc<dyn KeyValueStore>, SavedLocationStore) {
        store_with(Arc::new(ThermometerApi)).await
    }

    async fn store_with(api: Arc<dyn WeatherApi>) -> (Arc<dyn KeyValueStore>, SavedLocationStore) {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let saved = SavedLocationStore::load(kv.clone(), WeatherFetcher::new(api))
            .await
            .unwrap();
        (kv, saved)
    }

    fn shown(reading: Option<LiveTemperature>) -> Option<String> {
        reading.map(|t| t.to_string())
    }

    #[tokio::test]
    async fn test_save_twice_keeps_first_coordinate() {
        let (_, saved) = new_store().await;
        assert!(saved.save("Home", OSLO).await.unwrap());
        assert!(!saved.save("Home", ROME).await.unwrap());

        let list = saved.list().await;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].coordinate(), Some(OSLO));
    }

    #[tokio::test]
    async fn test_names_are_case_sensitive_and_empty_is_ignored() {
        let (_, saved) = new_store().await;
        assert!(saved.save("home", OSLO).await.unwrap());
        assert!(saved.save("Home", ROME).await.unwrap());
        assert!(!saved.save("", ROME).await.unwrap());
        assert!(!saved.save("   ", ROME).await.unwrap());
        assert_eq!(saved.list().await.len(), 2);
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let (kv, saved) = new_store().await;
        saved.save("Home", OSLO).await.unwrap();
        let before = kv.get(LOCATIONS_KEY).await.unwrap();

        assert!(!saved.remove("Elsewhere").await.unwrap());
        assert_eq!(saved.list().await.len(), 1);
        assert_eq!(kv.get(LOCATIONS_KEY).await.unwrap(), before);

        assert!(saved.remove("Home").await.unwrap());
        assert!(saved.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_saved_list_persists_and_clear_erases() {
        let (kv, saved) = new_store().await;
        saved.save("Home", OSLO).await.unwrap();
        saved.save("Work", ROME).await.unwrap();

        let reloaded = SavedLocationStore::load(kv.clone(), WeatherFetcher::new(Arc::new(ThermometerApi)))
            .await
            .unwrap();
        let names: Vec<String> = reloaded.list().await.into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["Home", "Work"]);

        reloaded.clear().await.unwrap();
        assert!(reloaded.list().await.is_empty());
        assert_eq!(kv.get(LOCATIONS_KEY).await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_lookup_failure_reads_na() {
        let (_, saved) = new_store().await;
        let north = SavedLocation::new("North", Coordinate { lat: 85.0, lon: 0.0 });

        let reading = saved.lookup_live_temperature(&north, UnitMode::Metric).await;
        assert_eq!(reading, LiveTemperature::Unavailable);
        assert_eq!(reading.to_string(), "N/A");
    }

    #[tokio::test]
    async fn test_name_only_entry_uses_name_lookup() {
        let (_, saved) = new_store().await;
        let legacy = SavedLocation {
            name: "Oslo".to_string(),
            lat: None,
            lon: None,
        };

        let reading = saved.lookup_live_temperature(&legacy, UnitMode::Metric).await;
        assert_eq!(
            reading,
            LiveTemperature::Reading {
                temperature: 10.0,
                unit_mode: UnitMode::Metric,
                coordinate: OSLO,
            }
        );
        assert_eq!(reading.to_string(), "10°C");
    }

    #[tokio::test]
    async fn test_refresh_all_follows_unit_mode() {
        let (_, saved) = new_store().await;
        saved.save("Home", OSLO).await.unwrap();
        saved.save("North", Coordinate { lat: 85.0, lon: 0.0 }).await.unwrap();

        saved.refresh_all(UnitMode::Metric).await;
        assert_eq!(
            saved.live_temperature("Home").await.map(|t| t.to_string()).as_deref(),
            Some("10°C")
        );
        assert_eq!(
            saved.live_temperature("North").await,
            Some(LiveTemperature::Unavailable)
        );

        saved.refresh_all(UnitMode::Imperial).await;
        assert_eq!(
            saved.live_temperature("Home").await.map(|t| t.to_string()).as_deref(),
            Some("50°F")
        );
    }

    #[tokio::test]
    async fn test_invalidate_drops_readings() {
        let (_, saved) = new_store().await;
        saved.save("Home", OSLO).await.unwrap();
        saved.refresh_all(UnitMode::Metric).await;
        assert!(saved.live_temperature("Home").await.is_some());

        saved.invalidate().await;
        assert!(saved.live_temperature("Home").await.is_none());
        let paired = saved.with_live_temperatures().await;
        assert_eq!(paired.len(), 1);
        assert!(paired[0].1.is_none());
    }

    #[tokio::test]
    async fn test_refresh_one_uses_unit_mode_of_latest_refresh() {
        let (_, saved) = new_store().await;
        saved.save("Home", OSLO).await.unwrap();
        let home = saved.list().await.remove(0);

        saved.refresh_all(UnitMode::Imperial).await;
        // caller still holds the unit mode it read before the switch
        saved.refresh_one(&home, UnitMode::Metric).await;

        assert_eq!(shown(saved.live_temperature("Home").await).as_deref(), Some("50°F"));
    }

    #[tokio::test]
    async fn test_refresh_one_before_any_refresh_uses_given_mode() {
        let (_, saved) = new_store().await;
        saved.save("Home", OSLO).await.unwrap();
        let home = saved.list().await.remove(0);

        saved.refresh_one(&home, UnitMode::Metric).await;
        assert_eq!(shown(saved.live_temperature("Home").await).as_deref(), Some("10°C"));
    }

    #[tokio::test]
    async fn test_overlapping_unit_toggles_keep_latest_readings() {
        let api = Arc::new(SlowMetricApi {
            metric_answers: AtomicUsize::new(0),
        });
        let (_, saved) = store_with(api.clone()).await;
        saved.save("Home", OSLO).await.unwrap();
        saved.save("Work", ROME).await.unwrap();

        tokio::join!(
            saved.refresh_all(UnitMode::Metric),
            saved.refresh_all(UnitMode::Imperial)
        );

        // both metric answers arrived after the imperial ones and were dropped
        assert_eq!(api.metric_answers.load(Ordering::SeqCst), 2);
        assert_eq!(shown(saved.live_temperature("Home").await).as_deref(), Some("50°F"));
        assert_eq!(shown(saved.live_temperature("Work").await).as_deref(), Some("50°F"));
    }
}
