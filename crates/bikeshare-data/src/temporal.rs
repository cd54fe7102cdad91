//! Time-keyed aggregations: hourly distribution and daily trend.

use std::collections::BTreeMap;

use bikeshare_core::models::TripTable;
use chrono::{NaiveDate, Timelike};
use serde::Serialize;

/// Number of hours in the canonical hourly profile.
pub const HOURS_PER_DAY: usize = 24;

// ── Peak hours ────────────────────────────────────────────────────────────────

/// Trip count for one hour of the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourCount {
    pub hour: u32,
    pub trip_count: u64,
}

/// Trip counts per hour of day.
///
/// Always returns exactly 24 rows, hours 0–23 ascending; hours with no
/// trips appear with a zero count, also for an empty table.
pub fn peak_hours(table: &TripTable) -> Vec<HourCount> {
    let mut counts = [0u64; HOURS_PER_DAY];
    for trip in table.rows() {
        counts[trip.start_time.hour() as usize] += 1;
    }
    counts
        .iter()
        .enumerate()
        .map(|(hour, &trip_count)| HourCount {
            hour: hour as u32,
            trip_count,
        })
        .collect()
}

// ── Daily trend ───────────────────────────────────────────────────────────────

/// Trip count for one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub trip_count: u64,
    /// English weekday name, e.g. `"Thursday"`.
    pub day_of_week: String,
    /// Whether this date achieved the maximum count (ties all flagged).
    pub is_peak_day: bool,
}

/// Trip counts per calendar date, sorted chronologically, with weekday
/// labels and the busiest date(s) flagged. Empty input yields an empty
/// result.
pub fn daily_trend(table: &TripTable) -> Vec<DailyCount> {
    let mut counts: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for trip in table.rows() {
        *counts.entry(trip.start_time.date()).or_insert(0) += 1;
    }

    let max = counts.values().copied().max().unwrap_or(0);

    counts
        .into_iter()
        .map(|(date, trip_count)| DailyCount {
            date,
            trip_count,
            day_of_week: date.format("%A").to_string(),
            is_peak_day: trip_count == max,
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
