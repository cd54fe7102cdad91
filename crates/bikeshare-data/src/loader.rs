//! CSV trip-log discovery, loading and normalization.
//!
//! Reads a delimited trip log, standardizes header names, coerces
//! timestamps and durations, drops rows missing the critical fields, and
//! interns low-cardinality text so repeated values share storage.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bikeshare_core::columns::{self, Column};
use bikeshare_core::error::{DatasetError, Result};
use bikeshare_core::models::{Trip, TripTable};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.csv` files recursively under `data_path`, sorted by path.
pub fn find_csv_files(data_path: &Path) -> Vec<PathBuf> {
    if !data_path.exists() {
        warn!("Data path does not exist: {}", data_path.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == "csv")
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Load a trip-log CSV into the canonical [`TripTable`].
///
/// * A missing file yields [`DatasetError::NotFound`].
/// * Content that fails to parse as CSV yields [`DatasetError::Malformed`]
///   wrapping the underlying cause.
/// * Rows without a parsable `start_time` or a non-empty `trip_id` are
///   dropped; every other invalid value becomes an explicit `None` marker
///   on the row.
pub fn load(path: &Path) -> Result<TripTable> {
    if !path.exists() {
        return Err(DatasetError::NotFound(path.to_path_buf()));
    }

    let file = std::fs::File::open(path)?;
    let mut reader = csv::Reader::from_reader(std::io::BufReader::new(file));

    let headers = reader
        .headers()
        .map_err(|e| malformed(path, e))?
        .clone();
    let layout = resolve_layout(&headers);
    let present: BTreeSet<Column> = layout.keys().copied().collect();

    let mut pool = StringPool::default();
    let mut rows: Vec<Trip> = Vec::new();
    let mut rows_read = 0u64;
    let mut rows_dropped = 0u64;

    for record in reader.records() {
        let record = record.map_err(|e| malformed(path, e))?;
        rows_read += 1;

        match map_to_trip(&record, &layout, &mut pool) {
            Some(trip) => rows.push(trip),
            None => rows_dropped += 1,
        }
    }

    debug!(
        "Loaded {}: {} rows read, {} dropped, {} columns recognised",
        path.display(),
        rows_read,
        rows_dropped,
        present.len(),
    );

    Ok(TripTable::new(rows, present))
}

/// Parse a timestamp string through the ordered list of formats seen across
/// trip-log exports. Returns `None` for anything unrecognised; the caller
/// records the value as invalid rather than failing the load.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: &[&str] = &[
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    // Date-only values resolve to midnight.
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn malformed(path: &Path, source: csv::Error) -> DatasetError {
    DatasetError::Malformed {
        path: path.to_path_buf(),
        source,
    }
}

/// Map each recognised header to its field index. The first occurrence of a
/// semantic column wins; headers that match no alias are ignored.
fn resolve_layout(headers: &csv::StringRecord) -> HashMap<Column, usize> {
    let mut layout: HashMap<Column, usize> = HashMap::new();
    for (idx, raw) in headers.iter().enumerate() {
        if let Some(col) = columns::canonical(raw) {
            layout.entry(col).or_insert(idx);
        }
    }
    layout
}

/// Trimmed, non-empty field value for a semantic column, if present.
fn field<'r>(
    record: &'r csv::StringRecord,
    layout: &HashMap<Column, usize>,
    col: Column,
) -> Option<&'r str> {
    layout
        .get(&col)
        .and_then(|&idx| record.get(idx))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Numeric duration in seconds; non-numeric and non-finite values are
/// invalid, never coerced to zero.
fn parse_duration(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Build a [`Trip`] from one record, or `None` when the row lacks a valid
/// `start_time` or `trip_id` and must be dropped.
fn map_to_trip(
    record: &csv::StringRecord,
    layout: &HashMap<Column, usize>,
    pool: &mut StringPool,
) -> Option<Trip> {
    let trip_id = field(record, layout, Column::TripId)?.to_string();
    let start_time = field(record, layout, Column::StartTime).and_then(parse_timestamp)?;

    let end_time = field(record, layout, Column::EndTime).and_then(parse_timestamp);
    let duration_seconds = field(record, layout, Column::DurationSeconds).and_then(parse_duration);
    let start_station = field(record, layout, Column::StartStation).map(|s| pool.intern(s));
    let end_station = field(record, layout, Column::EndStation).map(|s| pool.intern(s));
    let bike_id = field(record, layout, Column::BikeId).map(str::to_string);
    let user_type = field(record, layout, Column::UserType).map(|s| pool.intern(s));
    let model = field(record, layout, Column::BikeModel).map(|s| pool.intern(s));

    Some(Trip {
        trip_id,
        start_time,
        end_time,
        duration_seconds,
        start_station,
        end_station,
        bike_id,
        user_type,
        model,
    })
}

// ── String interning ──────────────────────────────────────────────────────────

/// Deduplicating pool for low-cardinality text columns (stations, user
/// type, bike model). Repeated values share one allocation; equality and
/// ordering of the interned strings are unchanged, so no aggregation can
/// observe the difference.
#[derive(Default)]
struct StringPool {
    pool: HashMap<String, Arc<str>>,
}

impl StringPool {
    fn intern(&mut self, s: &str) -> Arc<str> {
        if let Some(interned) = self.pool.get(s) {
            return interned.clone();
        }
        let interned: Arc<str> = Arc::from(s);
        self.pool.insert(s.to_string(), interned.clone());
        interned
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
