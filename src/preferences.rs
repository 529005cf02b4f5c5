//! User preferences: unit mode and theme

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use crate::Result;
use crate::store::{self, KeyValueStore};
use crate::units::UnitMode;

/// Storage key of the preferences document
pub const PREFERENCES_KEY: &str = "preferences";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Preferences {
    #[serde(default)]
    pub unit_mode: UnitMode,
    #[serde(default)]
    pub theme: Theme,
}

/// Persisted preferences with read-modify-write updates
pub struct PreferenceStore {
    store: Arc<dyn KeyValueStore>,
    current: Mutex<Preferences>,
}

impl PreferenceStore {
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let current: Preferences = store::load_document(store.as_ref(), PREFERENCES_KEY).await?;
        Ok(Self {
            store,
            current: Mutex::new(current),
        })
    }

    pub async fn get(&self) -> Preferences {
        *self.current.lock().await
    }

    /// Persist a unit mode. Returns whether it changed.
    pub async fn set_unit_mode(&self, unit_mode: UnitMode) -> Result<bool> {
        self.update(|prefs| prefs.unit_mode = unit_mode).await
    }

    /// Persist a theme. Returns whether it changed.
    pub async fn set_theme(&self, theme: Theme) -> Result<bool> {
        self.update(|prefs| prefs.theme = theme).await
    }

    async fn update(&self, apply: impl FnOnce(&mut Preferences)) -> Result<bool> {
        let mut current = self.current.lock().await;
        let mut updated = *current;
        apply(&mut updated);
        if updated == *current {
            return Ok(false);
        }

        store::save_document(self.store.as_ref(), PREFERENCES_KEY, &updated).await?;
        *current = updated;
        info!("Preferences updated: units={}, theme={:?}", updated.unit_mode, updated.theme);
        Ok(true)
    }
}
