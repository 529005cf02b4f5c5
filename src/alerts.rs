//! Threshold alerts
//!
//! Rules are user defined and persisted as one JSON document. Evaluation is pure
//! and only looks at enabled rules.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::{CurrentConditions, Metric};
use crate::store::{self, KeyValueStore};
use crate::{Result, WildWeatherError};

/// Storage key of the alert rule document
pub const ALERTS_KEY: &str = "alerts";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Above,
    Below,
}

impl Comparison {
    /// Strict comparison of a reading against a threshold
    #[must_use]
    pub fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Above => value > threshold,
            Comparison::Below => value < threshold,
        }
    }
}

impl std::str::FromStr for Comparison {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "above" => Ok(Comparison::Above),
            "below" => Ok(Comparison::Below),
            other => Err(format!("unknown comparison '{other}'")),
        }
    }
}

/// A user-defined threshold on one metric
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AlertRule {
    pub id: u64,
    pub metric: Metric,
    pub threshold: f64,
    pub comparison: Comparison,
    /// Activity the alert is meant for, e.g. `"Beach day"`
    pub activity: String,
    pub enabled: bool,
}

impl AlertRule {
    #[must_use]
    pub fn is_triggered_by(&self, current: &CurrentConditions) -> bool {
        self.enabled
            && self
                .metric
                .read_current(current)
                .is_some_and(|value| self.comparison.holds(value, self.threshold))
    }
}

/// Fields supplied when creating a rule
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    pub metric: Metric,
    pub threshold: f64,
    pub comparison: Comparison,
    pub activity: String,
}

/// Ids of the enabled rules whose condition holds for `current`.
///
/// A metric the feed does not provide never triggers.
#[must_use]
pub fn evaluate(rules: &[AlertRule], current: &CurrentConditions) -> Vec<u64> {
    rules
        .iter()
        .filter(|rule| rule.is_triggered_by(current))
        .map(|rule| rule.id)
        .collect()
}

/// Persisted collection of alert rules
pub struct AlertBook {
    store: Arc<dyn KeyValueStore>,
    rules: Mutex<Vec<AlertRule>>,
}

impl AlertBook {
    /// Load the rule list, resetting it when the stored document is unreadable
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let rules: Vec<AlertRule> = store::load_document(store.as_ref(), ALERTS_KEY).await?;
        debug!("Loaded {} alert rules", rules.len());
        Ok(Self {
            store,
            rules: Mutex::new(rules),
        })
    }

    pub async fn list(&self) -> Vec<AlertRule> {
        self.rules.lock().await.clone()
    }

    /// Create an enabled rule and persist it
    pub async fn add(&self, alert: NewAlert) -> Result<AlertRule> {
        if !alert.threshold.is_finite() {
            return Err(WildWeatherError::validation("Alert threshold must be a number"));
        }
        let activity = alert.activity.trim();
        if activity.is_empty() {
            return Err(WildWeatherError::validation("Alert activity must not be empty"));
        }

        let mut rules = self.rules.lock().await;
        let id = next_id(&rules, Utc::now().timestamp_millis());
        let rule = AlertRule {
            id,
            metric: alert.metric,
            threshold: alert.threshold,
            comparison: alert.comparison,
            activity: activity.to_string(),
            enabled: true,
        };

        let mut updated = rules.clone();
        updated.push(rule.clone());
        store::save_document(self.store.as_ref(), ALERTS_KEY, &updated).await?;
        *rules = updated;

        info!("Added alert {} for '{}'", rule.id, rule.activity);
        Ok(rule)
    }

    /// Delete a rule. Returns whether it existed.
    pub async fn remove(&self, id: u64) -> Result<bool> {
        let mut rules = self.rules.lock().await;
        if !rules.iter().any(|r| r.id == id) {
            return Ok(false);
        }

        let updated: Vec<AlertRule> = rules.iter().filter(|r| r.id != id).cloned().collect();
        store::save_document(self.store.as_ref(), ALERTS_KEY, &updated).await?;
        *rules = updated;

        info!("Removed alert {}", id);
        Ok(true)
    }

    /// Flip a rule's enabled flag, returning the new state or `None` for an unknown id
    pub async fn toggle(&self, id: u64) -> Result<Option<bool>> {
        let mut rules = self.rules.lock().await;
        let mut updated = rules.clone();
        let Some(rule) = updated.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        rule.enabled = !rule.enabled;
        let enabled = rule.enabled;

        store::save_document(self.store.as_ref(), ALERTS_KEY, &updated).await?;
        *rules = updated;

        debug!("Alert {} enabled={}", id, enabled);
        Ok(Some(enabled))
    }

    /// Evaluate the current rule list
    pub async fn evaluate(&self, current: &CurrentConditions) -> Vec<u64> {
        evaluate(&self.rules.lock().await, current)
    }
}

fn next_id(rules: &[AlertRule], now_millis: i64) -> u64 {
    let candidate = u64::try_from(now_millis).unwrap_or(0);
    match rules.iter().map(|r| r.id).max() {
        Some(max) if max >= candidate => max + 1,
        _ => candidate,
    }
}
