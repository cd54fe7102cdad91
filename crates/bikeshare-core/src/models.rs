use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::columns::{self, Column};

/// One bicycle rental record from the canonical trip table.
///
/// The loader guarantees `trip_id` and `start_time` are always valid; every
/// other field keeps an explicit "invalid / absent" marker (`None`) rather
/// than a sentinel value, so aggregations decide per-statistic what to skip.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    /// Unique trip identifier.
    pub trip_id: String,
    /// Rental start, local wall-clock (the source data carries no timezone).
    pub start_time: NaiveDateTime,
    /// Rental end; `None` when the source value was missing or unparsable.
    pub end_time: Option<NaiveDateTime>,
    /// Trip duration in seconds; `None` when non-numeric in the source.
    /// Outliers (> 24 h) and negatives are kept here and excluded only by
    /// the statistics that care.
    pub duration_seconds: Option<f64>,
    /// Origin station; interned, `None` when blank.
    pub start_station: Option<Arc<str>>,
    /// Destination station; interned, `None` when blank.
    pub end_station: Option<Arc<str>>,
    /// Identifier of the physical bike.
    pub bike_id: Option<String>,
    /// Rider category (open label set, e.g. "Member" / "Casual"); interned.
    pub user_type: Option<Arc<str>>,
    /// Bike hardware model; interned.
    pub model: Option<Arc<str>>,
}

/// Which endpoint of a trip a station-keyed aggregation analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationRole {
    Origin,
    Destination,
}

impl Trip {
    /// The station at the given endpoint of this trip.
    pub fn station(&self, role: StationRole) -> Option<&Arc<str>> {
        match role {
            StationRole::Origin => self.start_station.as_ref(),
            StationRole::Destination => self.end_station.as_ref(),
        }
    }
}

// ── TripTable ─────────────────────────────────────────────────────────────────

/// The cleaned, type-coerced trip dataset every aggregation consumes.
///
/// A table is immutable once built: filters and transforms produce new
/// tables, never mutate in place. Alongside the rows it records which
/// semantic columns were present in the source file, so aggregations can
/// distinguish "column absent" (empty result) from "column present but some
/// values invalid" (skip those values).
#[derive(Debug, Clone, PartialEq)]
pub struct TripTable {
    rows: Vec<Trip>,
    columns: BTreeSet<Column>,
}

impl TripTable {
    /// Build a table from rows plus the set of source columns.
    pub fn new(rows: Vec<Trip>, columns: BTreeSet<Column>) -> Self {
        Self { rows, columns }
    }

    /// A table with no rows and no columns.
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            columns: BTreeSet::new(),
        }
    }

    pub fn rows(&self) -> &[Trip] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Semantic columns that were present in the source file.
    pub fn columns(&self) -> &BTreeSet<Column> {
        &self.columns
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Probe an ordered list of header names and return the semantic column
    /// of the first candidate present in this table.
    ///
    /// This is the duck-typed column lookup: callers pass their accepted
    /// historical names in priority order, and absence of every candidate is
    /// a graceful "no data" case for the caller, never an error.
    pub fn resolve_column(&self, candidates: &[&str]) -> Option<Column> {
        candidates
            .iter()
            .filter_map(|name| columns::canonical(name))
            .find(|col| self.columns.contains(col))
    }

    /// A new table holding `rows`, with this table's column set.
    ///
    /// Used by filters: a filtered view keeps the source schema even when
    /// every row was removed.
    pub fn with_rows(&self, rows: Vec<Trip>) -> Self {
        Self {
            rows,
            columns: self.columns.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn make_trip(id: &str) -> Trip {
        Trip {
            trip_id: id.to_string(),
            start_time: ts(2024, 8, 1, 8),
            end_time: None,
            duration_seconds: Some(600.0),
            start_station: Some(Arc::from("Union Station")),
            end_station: Some(Arc::from("King St W")),
            bike_id: Some("B-1".to_string()),
            user_type: Some(Arc::from("Member")),
            model: None,
        }
    }

    #[test]
    fn test_empty_table() {
        let table = TripTable::empty();
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
        assert!(table.columns().is_empty());
    }

    #[test]
    fn test_has_column() {
        let table = TripTable::new(
            vec![],
            BTreeSet::from([Column::TripId, Column::StartTime]),
        );
        assert!(table.has_column(Column::TripId));
        assert!(!table.has_column(Column::DurationSeconds));
    }

    #[test]
    fn test_resolve_column_first_match() {
        let table = TripTable::new(vec![], BTreeSet::from([Column::DurationSeconds]));
        let col = table.resolve_column(&["trip_duration_seconds", "Trip Duration", "amount"]);
        assert_eq!(col, Some(Column::DurationSeconds));
    }

    #[test]
    fn test_resolve_column_absent() {
        let table = TripTable::new(vec![], BTreeSet::from([Column::TripId]));
        assert_eq!(
            table.resolve_column(&["trip_duration_seconds", "Trip Duration"]),
            None
        );
    }

    #[test]
    fn test_resolve_column_skips_unknown_candidates() {
        let table = TripTable::new(vec![], BTreeSet::from([Column::BikeId]));
        // First candidate is not a recorded alias at all; probe continues.
        assert_eq!(
            table.resolve_column(&["bicycle_number", "Bike Id"]),
            Some(Column::BikeId)
        );
    }

    #[test]
    fn test_with_rows_keeps_schema() {
        let table = TripTable::new(
            vec![make_trip("1"), make_trip("2")],
            BTreeSet::from([Column::TripId, Column::StartTime, Column::StartStation]),
        );
        let filtered = table.with_rows(vec![]);
        assert!(filtered.is_empty());
        assert_eq!(filtered.columns(), table.columns());
    }

    #[test]
    fn test_station_role_accessor() {
        let trip = make_trip("1");
        assert_eq!(
            trip.station(StationRole::Origin).map(|s| s.as_ref()),
            Some("Union Station")
        );
        assert_eq!(
            trip.station(StationRole::Destination).map(|s| s.as_ref()),
            Some("King St W")
        );
    }
}
