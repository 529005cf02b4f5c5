//! Key-value persistence for preferences, saved locations and alert rules
//!
//! Each collection is stored under its own key as a JSON document.

use async_trait::async_trait;
use fjall::Keyspace;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::Mutex;
use tokio::task;

use crate::{Result, WildWeatherError};

/// String key-value capability backing all persisted state
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: String) -> Result<()>;
}

/// On-disk store backed by a fjall keyspace
pub struct FjallStore {
    store: Keyspace,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> Result<Option<Vec<u8>>> {
    Ok(store
        .get(key)
        .map_err(|e| WildWeatherError::storage(e.to_string()))?
        .map(|v| v.to_vec()))
}

impl FjallStore {
    /// Open (or create) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path)
            .open()
            .map_err(|e| WildWeatherError::storage(format!("Failed to open store: {e}")))?;
        let items = db
            .keyspace("settings", fjall::KeyspaceCreateOptions::default)
            .map_err(|e| WildWeatherError::storage(format!("Failed to open keyspace: {e}")))?;
        Ok(FjallStore { store: items })
    }
}

#[async_trait]
impl KeyValueStore for FjallStore {
    #[tracing::instrument(name = "store_get", level = "debug", skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let maybe_bytes = task::spawn_blocking(move || get_from_store(store, key_bytes))
            .await
            .map_err(|e| WildWeatherError::storage(e.to_string()))??;

        maybe_bytes
            .map(|bytes| {
                String::from_utf8(bytes).map_err(|e| WildWeatherError::storage(e.to_string()))
            })
            .transpose()
    }

    #[tracing::instrument(name = "store_set", level = "debug", skip(self, value))]
    async fn set(&self, key: &str, value: String) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();

        task::spawn_blocking(move || store.insert(key, value.into_bytes()))
            .await
            .map_err(|e| WildWeatherError::storage(e.to_string()))?
            .map_err(|e| WildWeatherError::storage(e.to_string()))?;
        Ok(())
    }
}

/// In-process store, used for ephemeral sessions and tests
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Load the document stored under `key`.
///
/// A missing record yields the default. A record that does not parse is replaced
/// by the default so the next read succeeds.
pub async fn load_document<T>(store: &dyn KeyValueStore, key: &str) -> Result<T>
where
    T: DeserializeOwned + Serialize + Default,
{
    let Some(raw) = store.get(key).await? else {
        return Ok(T::default());
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!("Stored document '{}' is corrupt ({}), resetting it", key, e);
            let value = T::default();
            save_document(store, key, &value).await?;
            Ok(value)
        }
    }
}

/// Serialize `value` as JSON and store it under `key`
pub async fn save_document<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)
        .map_err(|e| WildWeatherError::storage(format!("Failed to encode '{key}': {e}")))?;
    store.set(key, raw).await
}
