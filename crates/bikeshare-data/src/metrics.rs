//! Volume, duration, fleet-usage and rider-mix metrics.
//!
//! Each function is independent and callable in any order; a missing input
//! column or an empty table yields the function's defined zero/empty result
//! rather than an error.

use std::collections::BTreeMap;

use bikeshare_core::columns;
use bikeshare_core::models::TripTable;
use bikeshare_core::stats::{mean, percentile, round1};
use chrono::NaiveDateTime;
use serde::Serialize;

/// 24 hours in seconds. Durations above this are treated as outliers by the
/// duration statistic (the rows themselves stay in the table).
pub const MAX_DURATION_SECONDS: f64 = 24.0 * 60.0 * 60.0;

/// Default number of vehicles returned by [`vehicle_usage`].
pub const DEFAULT_TOP_N: usize = 10;

/// Default usage quantile at which a vehicle is flagged as extreme.
pub const DEFAULT_EXTREME_QUANTILE: f64 = 0.95;

// ── Total volume ──────────────────────────────────────────────────────────────

/// Total number of trips, optionally restricted to rows whose `start_time`
/// lies in `[start, end]`, inclusive on both ends.
///
/// With no bounds this is the plain row count. A table without a start-time
/// column cannot be filtered and returns its full row count.
pub fn total_trips(
    table: &TripTable,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
) -> u64 {
    if table.is_empty() {
        return 0;
    }
    if start.is_none() && end.is_none() {
        return table.len() as u64;
    }
    if table.resolve_column(columns::START_TIME_ALIASES).is_none() {
        return table.len() as u64;
    }

    table
        .rows()
        .iter()
        .filter(|trip| {
            start.map_or(true, |s| trip.start_time >= s)
                && end.map_or(true, |e| trip.start_time <= e)
        })
        .count() as u64
}

// ── Average duration ──────────────────────────────────────────────────────────

/// Average trip duration in minutes.
///
/// Negative values and outliers above 24 hours are excluded; non-numeric
/// source values were already marked invalid by the loader and are skipped.
/// Returns `0.0` when no valid duration remains or the column is absent.
pub fn average_duration_minutes(table: &TripTable) -> f64 {
    if table.is_empty() || table.resolve_column(columns::DURATION_ALIASES).is_none() {
        return 0.0;
    }

    let valid: Vec<f64> = table
        .rows()
        .iter()
        .filter_map(|trip| trip.duration_seconds)
        .filter(|&d| (0.0..=MAX_DURATION_SECONDS).contains(&d))
        .collect();

    if valid.is_empty() {
        return 0.0;
    }
    mean(&valid) / 60.0
}

// ── Vehicle usage ─────────────────────────────────────────────────────────────

/// Summed usage for one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleUsage {
    pub bike_id: String,
    pub total_duration_seconds: f64,
    /// Whether this vehicle sits at or above the extreme-usage quantile.
    pub is_extreme: bool,
}

/// Rank vehicles by total trip duration, descending.
///
/// Ties are broken by bike id ascending so the ranking is deterministic.
/// The extreme flag compares each total against the `extreme_quantile`
/// (linear interpolation) of all per-vehicle totals, computed before the
/// list is truncated to `top_n`. Missing id or duration columns yield an
/// empty result.
pub fn vehicle_usage(table: &TripTable, top_n: usize, extreme_quantile: f64) -> Vec<VehicleUsage> {
    if table.is_empty()
        || table.resolve_column(columns::BIKE_ID_ALIASES).is_none()
        || table.resolve_column(columns::DURATION_ALIASES).is_none()
    {
        return Vec::new();
    }

    // BTreeMap keeps ids sorted, which becomes the tie-break order below.
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for trip in table.rows() {
        let Some(bike_id) = trip.bike_id.as_deref() else {
            continue;
        };
        *totals.entry(bike_id).or_insert(0.0) += trip.duration_seconds.unwrap_or(0.0);
    }

    if totals.is_empty() {
        return Vec::new();
    }

    let mut sorted_totals: Vec<f64> = totals.values().copied().collect();
    sorted_totals.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let cutoff = percentile(&sorted_totals, extreme_quantile * 100.0);

    let mut ranked: Vec<VehicleUsage> = totals
        .into_iter()
        .map(|(bike_id, total)| VehicleUsage {
            bike_id: bike_id.to_string(),
            total_duration_seconds: total,
            is_extreme: total >= cutoff,
        })
        .collect();

    // Stable sort: equal totals keep the ascending id order from the map.
    ranked.sort_by(|a, b| {
        b.total_duration_seconds
            .partial_cmp(&a.total_duration_seconds)
            .unwrap()
    });
    ranked.truncate(top_n);
    ranked
}

// ── User-type breakdown ───────────────────────────────────────────────────────

/// Trip counts (or percentages) per rider category.
///
/// Groups by whatever labels appear in the data; the label set is open,
/// nothing is hardcoded or zero-filled. In percentage mode each share is
/// `count / total × 100`, rounded to one decimal. Empty input or a missing
/// user-type column yields an empty map.
pub fn user_type_breakdown(table: &TripTable, as_percentage: bool) -> BTreeMap<String, f64> {
    if table.is_empty() || table.resolve_column(columns::USER_TYPE_ALIASES).is_none() {
        return BTreeMap::new();
    }

    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for trip in table.rows() {
        if let Some(label) = trip.user_type.as_deref() {
            *counts.entry(label.to_string()).or_insert(0) += 1;
        }
    }

    let total: u64 = counts.values().sum();
    if !as_percentage {
        return counts.into_iter().map(|(k, v)| (k, v as f64)).collect();
    }
    if total == 0 {
        return BTreeMap::new();
    }
    counts
        .into_iter()
        .map(|(k, v)| (k, round1(v as f64 / total as f64 * 100.0)))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use bikeshare_core::columns::Column;
    use bikeshare_core::models::Trip;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn ts(d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 8, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn trip(id: &str) -> Trip {
        Trip {
            trip_id: id.to_string(),
            start_time: ts(1, 8, 0),
            end_time: None,
            duration_seconds: None,
            start_station: None,
            end_station: None,
            bike_id: None,
            user_type: None,
            model: None,
        }
    }

    fn table_with(rows: Vec<Trip>, cols: &[Column]) -> TripTable {
        TripTable::new(rows, BTreeSet::from_iter(cols.iter().copied()))
    }

    const BASE_COLS: &[Column] = &[Column::TripId, Column::StartTime];

    // ── total_trips ───────────────────────────────────────────────────────────

    #[test]
    fn test_total_trips_is_row_count() {
        let t = table_with(vec![trip("1"), trip("2"), trip("3")], BASE_COLS);
        assert_eq!(total_trips(&t, None, None), 3);
    }

    #[test]
    fn test_total_trips_empty_is_zero() {
        assert_eq!(total_trips(&TripTable::empty(), None, None), 0);
    }

    #[test]
    fn test_total_trips_inclusive_window() {
        let mut a = trip("1");
        a.start_time = ts(1, 8, 0);
        let mut b = trip("2");
        b.start_time = ts(2, 8, 0);
        let mut c = trip("3");
        c.start_time = ts(3, 8, 0);
        let t = table_with(vec![a, b, c], BASE_COLS);

        // Both bounds inclusive.
        assert_eq!(total_trips(&t, Some(ts(1, 8, 0)), Some(ts(2, 8, 0))), 2);
        // Open lower bound.
        assert_eq!(total_trips(&t, None, Some(ts(1, 8, 0))), 1);
        // Open upper bound.
        assert_eq!(total_trips(&t, Some(ts(3, 8, 0)), None), 1);
    }

    #[test]
    fn test_total_trips_without_start_time_column_ignores_filter() {
        let t = table_with(vec![trip("1"), trip("2")], &[Column::TripId]);
        assert_eq!(total_trips(&t, Some(ts(2, 0, 0)), None), 2);
    }

    // ── average_duration_minutes ──────────────────────────────────────────────

    fn duration_table(durations: &[Option<f64>]) -> TripTable {
        let rows = durations
            .iter()
            .enumerate()
            .map(|(i, &d)| {
                let mut t = trip(&i.to_string());
                t.duration_seconds = d;
                t
            })
            .collect();
        table_with(
            rows,
            &[Column::TripId, Column::StartTime, Column::DurationSeconds],
        )
    }

    #[test]
    fn test_average_duration_basic() {
        let t = duration_table(&[Some(60.0), Some(120.0), Some(180.0)]);
        assert!((average_duration_minutes(&t) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_duration_excludes_24h_outliers() {
        let t = duration_table(&[Some(60.0), Some(120.0), Some(90_000.0)]);
        assert!((average_duration_minutes(&t) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_average_duration_excludes_negative() {
        let t = duration_table(&[Some(-30.0), Some(120.0)]);
        assert!((average_duration_minutes(&t) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_duration_skips_invalid_values() {
        let t = duration_table(&[None, Some(120.0)]);
        assert!((average_duration_minutes(&t) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_duration_all_invalid_is_zero() {
        let t = duration_table(&[None, Some(-1.0), Some(100_000.0)]);
        assert_eq!(average_duration_minutes(&t), 0.0);
    }

    #[test]
    fn test_average_duration_missing_column_is_zero() {
        let t = table_with(vec![trip("1")], BASE_COLS);
        assert_eq!(average_duration_minutes(&t), 0.0);
    }

    #[test]
    fn test_average_duration_empty_is_zero() {
        assert_eq!(average_duration_minutes(&TripTable::empty()), 0.0);
    }

    // ── vehicle_usage ─────────────────────────────────────────────────────────

    fn usage_table(entries: &[(&str, Option<f64>)]) -> TripTable {
        let rows = entries
            .iter()
            .enumerate()
            .map(|(i, &(bike, dur))| {
                let mut t = trip(&i.to_string());
                t.bike_id = Some(bike.to_string());
                t.duration_seconds = dur;
                t
            })
            .collect();
        table_with(
            rows,
            &[
                Column::TripId,
                Column::StartTime,
                Column::BikeId,
                Column::DurationSeconds,
            ],
        )
    }

    #[test]
    fn test_vehicle_usage_sums_and_ranks() {
        let t = usage_table(&[("1", Some(60.0)), ("1", Some(120.0)), ("2", Some(30.0))]);
        let ranked = vehicle_usage(&t, DEFAULT_TOP_N, DEFAULT_EXTREME_QUANTILE);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].bike_id, "1");
        assert_eq!(ranked[0].total_duration_seconds, 180.0);
        assert_eq!(ranked[1].bike_id, "2");
        assert_eq!(ranked[1].total_duration_seconds, 30.0);
    }

    #[test]
    fn test_vehicle_usage_tie_break_by_id() {
        let t = usage_table(&[("b", Some(100.0)), ("a", Some(100.0)), ("c", Some(50.0))]);
        let ranked = vehicle_usage(&t, DEFAULT_TOP_N, DEFAULT_EXTREME_QUANTILE);
        let ids: Vec<&str> = ranked.iter().map(|r| r.bike_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_vehicle_usage_extreme_flag_quantile() {
        // Totals 10, 20, ..., 100. p95 by linear interpolation = 95.5,
        // so only the 100-second bike is extreme.
        let entries: Vec<(String, Option<f64>)> = (1..=10)
            .map(|i| (format!("bike-{i:02}"), Some(i as f64 * 10.0)))
            .collect();
        let refs: Vec<(&str, Option<f64>)> =
            entries.iter().map(|(s, d)| (s.as_str(), *d)).collect();
        let t = usage_table(&refs);

        let ranked = vehicle_usage(&t, DEFAULT_TOP_N, DEFAULT_EXTREME_QUANTILE);
        assert!(ranked[0].is_extreme, "top vehicle must be flagged");
        assert!(ranked.iter().skip(1).all(|r| !r.is_extreme));
    }

    #[test]
    fn test_vehicle_usage_truncates_after_flagging() {
        let t = usage_table(&[("a", Some(10.0)), ("b", Some(20.0)), ("c", Some(30.0))]);
        let ranked = vehicle_usage(&t, 2, DEFAULT_EXTREME_QUANTILE);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].bike_id, "c");
    }

    #[test]
    fn test_vehicle_usage_invalid_duration_counts_zero() {
        let t = usage_table(&[("a", None), ("b", Some(10.0))]);
        let ranked = vehicle_usage(&t, DEFAULT_TOP_N, DEFAULT_EXTREME_QUANTILE);
        assert_eq!(ranked[1].bike_id, "a");
        assert_eq!(ranked[1].total_duration_seconds, 0.0);
    }

    #[test]
    fn test_vehicle_usage_missing_columns_is_empty() {
        let t = table_with(vec![trip("1")], BASE_COLS);
        assert!(vehicle_usage(&t, DEFAULT_TOP_N, DEFAULT_EXTREME_QUANTILE).is_empty());
    }

    #[test]
    fn test_vehicle_usage_empty_table() {
        assert!(
            vehicle_usage(&TripTable::empty(), DEFAULT_TOP_N, DEFAULT_EXTREME_QUANTILE).is_empty()
        );
    }

    // ── user_type_breakdown ───────────────────────────────────────────────────

    fn user_table(labels: &[Option<&str>]) -> TripTable {
        let rows = labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let mut t = trip(&i.to_string());
                t.user_type = label.map(Arc::from);
                t
            })
            .collect();
        table_with(rows, &[Column::TripId, Column::StartTime, Column::UserType])
    }

    #[test]
    fn test_user_type_counts() {
        let t = user_table(&[
            Some("Member"),
            Some("Casual"),
            Some("Member"),
            Some("Member"),
            Some("Casual"),
        ]);
        let counts = user_type_breakdown(&t, false);
        assert_eq!(counts.get("Member"), Some(&3.0));
        assert_eq!(counts.get("Casual"), Some(&2.0));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_user_type_percentages_rounded() {
        let t = user_table(&[Some("Member"), Some("Member"), Some("Casual")]);
        let pct = user_type_breakdown(&t, true);
        assert_eq!(pct.get("Member"), Some(&66.7));
        assert_eq!(pct.get("Casual"), Some(&33.3));
    }

    #[test]
    fn test_user_type_open_label_set() {
        let t = user_table(&[Some("Member"), Some("Day Pass"), Some("Corporate")]);
        let counts = user_type_breakdown(&t, false);
        assert_eq!(counts.len(), 3);
        assert_eq!(counts.get("Day Pass"), Some(&1.0));
    }

    #[test]
    fn test_user_type_skips_missing_labels() {
        let t = user_table(&[Some("Member"), None]);
        let counts = user_type_breakdown(&t, false);
        assert_eq!(counts.len(), 1);
    }

    #[test]
    fn test_user_type_empty_and_missing_column() {
        assert!(user_type_breakdown(&TripTable::empty(), false).is_empty());
        let t = table_with(vec![trip("1")], BASE_COLS);
        assert!(user_type_breakdown(&t, false).is_empty());
        assert!(user_type_breakdown(&t, true).is_empty());
    }
}
