//! Interactive view filters over the canonical trip table.
//!
//! Every filter is pure: it reads a table and returns a new one, leaving
//! the input untouched. The presentation layer re-derives a view from the
//! cached canonical table on every parameter change.

use chrono::NaiveDateTime;

use crate::models::TripTable;

/// Restrict a table to trips whose `start_time` lies in `[start, end]`,
/// inclusive on both ends. A `None` bound is open.
pub fn filter_by_datetime(
    table: &TripTable,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
) -> TripTable {
    if start.is_none() && end.is_none() {
        return table.clone();
    }
    let rows = table
        .rows()
        .iter()
        .filter(|trip| {
            start.map_or(true, |s| trip.start_time >= s)
                && end.map_or(true, |e| trip.start_time <= e)
        })
        .cloned()
        .collect();
    table.with_rows(rows)
}

/// Restrict a table to trips departing from one of the selected origin
/// stations. An empty selection means "all stations" and is a no-op.
pub fn filter_by_stations(table: &TripTable, stations: &[String]) -> TripTable {
    if stations.is_empty() {
        return table.clone();
    }
    let rows = table
        .rows()
        .iter()
        .filter(|trip| {
            trip.start_station
                .as_ref()
                .is_some_and(|s| stations.iter().any(|sel| sel.as_str() == s.as_ref()))
        })
        .cloned()
        .collect();
    table.with_rows(rows)
}

/// Earliest and latest `start_time` in the table, used to seed the
/// presentation layer's date pickers. `None` for an empty table.
pub fn date_range(table: &TripTable) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let min = table.rows().iter().map(|t| t.start_time).min()?;
    let max = table.rows().iter().map(|t| t.start_time).max()?;
    Some((min, max))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
