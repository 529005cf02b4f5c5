//! Forecast aggregation
//!
//! Regroups the forecast series into calendar-day buckets and provides the
//! windowed per-metric series used for hourly charts.

use std::collections::HashMap;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

use crate::models::{DailyBucket, HourlySample, Metric};

/// Maximum number of daily buckets produced
pub const MAX_DAYS: usize = 5;

/// Group samples by their calendar date in the local time zone
#[must_use]
pub fn group_by_day(hourly: &[HourlySample]) -> Vec<DailyBucket> {
    group_by_day_in(hourly, &Local)
}

/// Group samples by their calendar date in `tz`.
///
/// Buckets appear in the order their dates are first seen, which for a chronological
/// feed is ascending date order. Only the first [`MAX_DAYS`] buckets are kept.
#[must_use]
pub fn group_by_day_in<Tz: TimeZone>(hourly: &[HourlySample], tz: &Tz) -> Vec<DailyBucket> {
    let mut order: Vec<NaiveDate> = Vec::new();
    let mut groups: HashMap<NaiveDate, Vec<HourlySample>> = HashMap::new();

    for sample in hourly {
        let date = sample.dt.with_timezone(tz).date_naive();
        groups
            .entry(date)
            .or_insert_with(|| {
                order.push(date);
                Vec::new()
            })
            .push(sample.clone());
    }

    order
        .into_iter()
        .take(MAX_DAYS)
        .filter_map(|date| groups.remove(&date).map(|samples| build_bucket(date, samples)))
        .collect()
}

fn build_bucket(date: NaiveDate, samples: Vec<HourlySample>) -> DailyBucket {
    let representative = samples[samples.len() / 2].condition.clone();
    let mean_temperature = mean(samples.iter().map(|s| s.temperature));

    DailyBucket {
        date,
        day_label: date.format("%a").to_string(),
        date_label: date.format("%b %-d").to_string(),
        representative,
        mean_temperature,
        samples,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Samples covering the next `hours` at the feed's `cadence_hours`
#[must_use]
pub fn hourly_window(hourly: &[HourlySample], hours: u32, cadence_hours: u32) -> &[HourlySample] {
    let cadence = cadence_hours.max(1);
    let count = hours.div_ceil(cadence) as usize;
    &hourly[..hourly.len().min(count)]
}

/// Time series of one metric, skipping samples that lack it
#[must_use]
pub fn metric_series(samples: &[HourlySample], metric: Metric) -> Vec<(DateTime<Utc>, f64)> {
    samples
        .iter()
        .filter_map(|s| metric.read_sample(s).map(|v| (s.dt, v)))
        .collect()
}
