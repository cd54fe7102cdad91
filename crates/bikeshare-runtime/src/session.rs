//! Interactive dashboard session over one trip dataset.
//!
//! A session loads the canonical table once (through the [`TableCache`]),
//! holds the operator's current filter parameters, and re-derives a
//! filtered view on demand. Every analytic delegates to the pure
//! aggregation layer; the forecaster deliberately bypasses the filters and
//! always reads the full history.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bikeshare_core::error::Result;
use bikeshare_core::filters;
use bikeshare_core::models::{StationRole, TripTable};
use bikeshare_data::forecast::{self, ForecastSummary, HourlyForecast};
use bikeshare_data::metrics::{self, VehicleUsage};
use bikeshare_data::stations::{self, RouteCount, StationCount, StationFlow};
use bikeshare_data::temporal::{self, DailyCount, HourCount};
use chrono::NaiveDateTime;

use crate::table_cache::TableCache;

/// The operator's current view parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterParams {
    /// Inclusive lower bound on `start_time`.
    pub start: Option<NaiveDateTime>,
    /// Inclusive upper bound on `start_time`.
    pub end: Option<NaiveDateTime>,
    /// Origin stations to keep; empty means all.
    pub stations: Vec<String>,
}

impl FilterParams {
    pub fn is_unfiltered(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.stations.is_empty()
    }
}

/// One operator's view over a loaded trip dataset.
#[derive(Debug)]
pub struct DashboardSession {
    cache: TableCache,
    path: PathBuf,
    canonical: Arc<TripTable>,
    params: FilterParams,
}

impl DashboardSession {
    /// Load (or reuse) the canonical table for `path` and start an
    /// unfiltered session over it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut cache = TableCache::new();
        let canonical = cache.get_or_load(&path)?;
        Ok(Self {
            cache,
            path,
            canonical,
            params: FilterParams::default(),
        })
    }

    // ── Table access ──────────────────────────────────────────────────────

    /// The full, unfiltered canonical table.
    pub fn canonical(&self) -> &TripTable {
        &self.canonical
    }

    pub fn source_path(&self) -> &Path {
        &self.path
    }

    /// Re-derive the filtered view from the canonical table.
    ///
    /// Always a fresh table: mutating filter parameters never touches a
    /// previously returned view.
    pub fn view(&self) -> TripTable {
        if self.params.is_unfiltered() {
            return (*self.canonical).clone();
        }
        let by_time = filters::filter_by_datetime(&self.canonical, self.params.start, self.params.end);
        filters::filter_by_stations(&by_time, &self.params.stations)
    }

    /// Invalidate the cache entry and reload the table from disk.
    pub fn reload(&mut self) -> Result<()> {
        self.cache.invalidate(&self.path);
        self.canonical = self.cache.get_or_load(&self.path)?;
        Ok(())
    }

    // ── Filter parameters ─────────────────────────────────────────────────

    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    pub fn set_datetime_filter(&mut self, start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) {
        self.params.start = start;
        self.params.end = end;
    }

    pub fn set_station_filter(&mut self, stations: Vec<String>) {
        self.params.stations = stations;
    }

    pub fn clear_filters(&mut self) {
        self.params = FilterParams::default();
    }

    /// Earliest and latest trip start in the full dataset, for seeding the
    /// filter widgets.
    pub fn date_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        filters::date_range(&self.canonical)
    }

    // ── Analytics over the filtered view ──────────────────────────────────

    pub fn total_trips(&self) -> u64 {
        metrics::total_trips(&self.view(), None, None)
    }

    pub fn average_duration_minutes(&self) -> f64 {
        metrics::average_duration_minutes(&self.view())
    }

    pub fn vehicle_usage(&self, top_n: usize, extreme_quantile: f64) -> Vec<VehicleUsage> {
        metrics::vehicle_usage(&self.view(), top_n, extreme_quantile)
    }

    pub fn user_type_breakdown(&self, as_percentage: bool) -> BTreeMap<String, f64> {
        metrics::user_type_breakdown(&self.view(), as_percentage)
    }

    pub fn top_stations(&self, n: usize, by: StationRole) -> Vec<StationCount> {
        stations::top_stations(&self.view(), n, by)
    }

    pub fn top_routes(&self, n: usize, include_circular: bool) -> Vec<RouteCount> {
        stations::top_routes(&self.view(), n, include_circular)
    }

    pub fn station_flow_balance(&self, n: usize, priority_threshold: i64) -> Vec<StationFlow> {
        stations::station_flow_balance(&self.view(), n, priority_threshold)
    }

    pub fn peak_hours(&self) -> Vec<HourCount> {
        temporal::peak_hours(&self.view())
    }

    pub fn daily_trend(&self) -> Vec<DailyCount> {
        temporal::daily_trend(&self.view())
    }

    // ── Forecasting over the full history ─────────────────────────────────

    /// The 24-hour demand profile, always computed from the unfiltered
    /// canonical table regardless of the session's current filters.
    pub fn forecast_hourly_demand(&self) -> Vec<HourlyForecast> {
        forecast::forecast_hourly_demand(&self.canonical)
    }

    pub fn forecast_summary(&self) -> ForecastSummary {
        forecast::summarize(&self.forecast_hourly_demand())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_csv(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    /// Two days of trips across two stations.
    fn sample(dir: &Path) -> PathBuf {
        write_csv(
            dir,
            "trips.csv",
            &[
                "Trip Id,Start Time,Trip Duration,Start Station Name,End Station Name,User Type",
                "1,2024-08-01 08:00:00,600,Station A,Station B,Member",
                "2,2024-08-01 08:30:00,900,Station B,Station A,Casual",
                "3,2024-08-02 09:00:00,300,Station A,Station B,Member",
            ],
        )
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_open_loads_canonical_table() {
        let dir = TempDir::new().unwrap();
        let session = DashboardSession::open(sample(dir.path())).unwrap();
        assert_eq!(session.canonical().len(), 3);
        assert_eq!(session.total_trips(), 3);
    }

    #[test]
    fn test_open_missing_file_fails() {
        let err = DashboardSession::open("/tmp/bikeshare-session-test/ghost.csv").unwrap_err();
        assert!(matches!(
            err,
            bikeshare_core::error::DatasetError::NotFound(_)
        ));
    }

    #[test]
    fn test_datetime_filter_narrows_view() {
        let dir = TempDir::new().unwrap();
        let mut session = DashboardSession::open(sample(dir.path())).unwrap();

        session.set_datetime_filter(
            Some(dt("2024-08-01 00:00:00")),
            Some(dt("2024-08-01 23:59:59")),
        );
        assert_eq!(session.total_trips(), 2);

        session.clear_filters();
        assert_eq!(session.total_trips(), 3);
    }

    #[test]
    fn test_station_filter_narrows_view() {
        let dir = TempDir::new().unwrap();
        let mut session = DashboardSession::open(sample(dir.path())).unwrap();

        session.set_station_filter(vec!["Station B".to_string()]);
        assert_eq!(session.total_trips(), 1);
    }

    #[test]
    fn test_view_is_a_fresh_copy() {
        let dir = TempDir::new().unwrap();
        let mut session = DashboardSession::open(sample(dir.path())).unwrap();

        let before = session.view();
        session.set_station_filter(vec!["Station A".to_string()]);
        // The earlier view is unaffected by the parameter change.
        assert_eq!(before.len(), 3);
        assert_eq!(session.view().len(), 2);
    }

    #[test]
    fn test_forecast_ignores_filters() {
        let dir = TempDir::new().unwrap();
        let mut session = DashboardSession::open(sample(dir.path())).unwrap();

        let unfiltered = session.forecast_hourly_demand();
        session.set_datetime_filter(
            Some(dt("2024-08-02 00:00:00")),
            Some(dt("2024-08-02 23:59:59")),
        );
        session.set_station_filter(vec!["Station A".to_string()]);

        // The view shrinks but the forecast still sees the full history.
        assert_eq!(session.total_trips(), 1);
        assert_eq!(session.forecast_hourly_demand(), unfiltered);
    }

    #[test]
    fn test_forecast_summary() {
        let dir = TempDir::new().unwrap();
        let session = DashboardSession::open(sample(dir.path())).unwrap();
        let summary = session.forecast_summary();
        // Hour 8: two trips on day one → mean 2.0; the daily total adds
        // hour 9's single-day mean of 1.0.
        assert_eq!(summary.peak_hour, 8);
        assert_eq!(summary.peak_demand, 2.0);
        assert_eq!(summary.total_daily_trips, 3.0);
    }

    #[test]
    fn test_date_range_uses_full_history() {
        let dir = TempDir::new().unwrap();
        let mut session = DashboardSession::open(sample(dir.path())).unwrap();
        session.set_station_filter(vec!["Station B".to_string()]);
        assert_eq!(
            session.date_range(),
            Some((dt("2024-08-01 08:00:00"), dt("2024-08-02 09:00:00")))
        );
    }

    #[test]
    fn test_reload_picks_up_changes() {
        let dir = TempDir::new().unwrap();
        let path = sample(dir.path());
        let mut session = DashboardSession::open(&path).unwrap();
        assert_eq!(session.total_trips(), 3);

        write_csv(
            dir.path(),
            "trips.csv",
            &["Trip Id,Start Time", "9,2024-08-03 10:00:00"],
        );
        // Stale until an explicit reload.
        assert_eq!(session.total_trips(), 3);
        session.reload().unwrap();
        assert_eq!(session.total_trips(), 1);
    }

    #[test]
    fn test_analytics_delegate_to_view() {
        let dir = TempDir::new().unwrap();
        let session = DashboardSession::open(sample(dir.path())).unwrap();

        let top = session.top_stations(10, StationRole::Origin);
        assert_eq!(top[0].station_name, "Station A");
        assert_eq!(top[0].trip_count, 2);

        let breakdown = session.user_type_breakdown(false);
        assert_eq!(breakdown.get("Member"), Some(&2.0));

        let hours = session.peak_hours();
        assert_eq!(hours.len(), 24);
        assert_eq!(hours[8].trip_count, 2);
    }
}
