//! Hourly demand forecasting from historical trip counts.
//!
//! The model is deliberately a historical-average baseline: for every hour
//! of the day it averages the per-day trip counts observed in the full
//! history. No fitting, no smoothing: the goal is a stable "expected
//! demand" curve operators can staff against.

use std::collections::BTreeMap;

use bikeshare_core::models::TripTable;
use bikeshare_core::stats::{mean, population_std_dev, round1};
use chrono::{Datelike, NaiveDate, Timelike, Weekday};
use serde::Serialize;

use crate::temporal::HOURS_PER_DAY;

/// Expected demand profile for one hour of the day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyForecast {
    pub hour: u32,
    /// Mean trip count across all days with trips in this hour.
    pub predicted_demand: f64,
    /// Population standard deviation of the per-day samples; `0.0` with
    /// fewer than two samples.
    pub std_dev: f64,
    /// Mean restricted to Monday–Friday samples.
    pub weekday_demand: f64,
    /// Mean restricted to Saturday/Sunday samples.
    pub weekend_demand: f64,
}

/// Headline numbers derived from a 24-hour profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    /// Hour with the highest predicted demand (first hour wins ties).
    pub peak_hour: u32,
    pub peak_demand: f64,
    /// Sum of the hourly predictions: the expected trips in a typical day.
    pub total_daily_trips: f64,
}

/// Derive the 24-row expected-demand profile from the full historical
/// table.
///
/// Predictions must be based on all available history, so callers pass the
/// *unfiltered* canonical table here, never the operator's current view.
///
/// Always returns exactly 24 rows, hours 0–23; an hour with no observed
/// trips (or an empty table) yields zeros for every metric. All metrics
/// are rounded to one decimal for display.
pub fn forecast_hourly_demand(table: &TripTable) -> Vec<HourlyForecast> {
    // Per-(date, hour) trip counts, the raw daily-hourly sample set.
    let mut samples: BTreeMap<(NaiveDate, u32), u64> = BTreeMap::new();
    for trip in table.rows() {
        let key = (trip.start_time.date(), trip.start_time.hour());
        *samples.entry(key).or_insert(0) += 1;
    }

    // Regroup the samples by hour, splitting weekday from weekend days.
    let mut by_hour: Vec<Vec<f64>> = vec![Vec::new(); HOURS_PER_DAY];
    let mut weekday_by_hour: Vec<Vec<f64>> = vec![Vec::new(); HOURS_PER_DAY];
    let mut weekend_by_hour: Vec<Vec<f64>> = vec![Vec::new(); HOURS_PER_DAY];
    for (&(date, hour), &count) in &samples {
        let count = count as f64;
        by_hour[hour as usize].push(count);
        if is_weekend(date) {
            weekend_by_hour[hour as usize].push(count);
        } else {
            weekday_by_hour[hour as usize].push(count);
        }
    }

    (0..HOURS_PER_DAY)
        .map(|hour| HourlyForecast {
            hour: hour as u32,
            predicted_demand: round1(mean(&by_hour[hour])),
            std_dev: round1(population_std_dev(&by_hour[hour])),
            weekday_demand: round1(mean(&weekday_by_hour[hour])),
            weekend_demand: round1(mean(&weekend_by_hour[hour])),
        })
        .collect()
}

/// Headline metrics over a profile produced by [`forecast_hourly_demand`].
pub fn summarize(profile: &[HourlyForecast]) -> ForecastSummary {
    let mut peak_hour = 0u32;
    let mut peak_demand = f64::MIN;
    for row in profile {
        if row.predicted_demand > peak_demand {
            peak_hour = row.hour;
            peak_demand = row.predicted_demand;
        }
    }
    ForecastSummary {
        peak_hour,
        peak_demand: if profile.is_empty() { 0.0 } else { peak_demand },
        total_daily_trips: profile.iter().map(|r| r.predicted_demand).sum(),
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
