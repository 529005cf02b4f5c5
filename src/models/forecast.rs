//! Daily forecast bucket model

use chrono::NaiveDate;
use serde::Serialize;

use super::{Condition, HourlySample};
use crate::units::UnitMode;

/// Forecast samples sharing one calendar date
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DailyBucket {
    /// Calendar date the samples belong to
    pub date: NaiveDate,
    /// Short weekday name, e.g. `"Mon"`
    pub day_label: String,
    /// Short date, e.g. `"Jan 5"`
    pub date_label: String,
    /// Condition of the middle sample
    pub representative: Condition,
    /// Mean temperature at full precision
    pub mean_temperature: f64,
    /// Samples in arrival order
    pub samples: Vec<HourlySample>,
}

impl DailyBucket {
    /// ISO date key, e.g. `"2024-01-05"`
    #[must_use]
    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Mean temperature rounded for display with its unit
    #[must_use]
    pub fn display_temperature(&self, mode: UnitMode) -> String {
        mode.format_temperature(self.mean_temperature)
    }
}
