//! Station and route aggregations: popularity rankings and flow balance.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use bikeshare_core::columns;
use bikeshare_core::models::{StationRole, TripTable};
use regex::Regex;
use serde::Serialize;

/// Default number of stations/routes returned by the rankings.
pub const DEFAULT_TOP_N: usize = 10;

/// Default absolute net flow above which a station needs rebalancing.
pub const DEFAULT_PRIORITY_THRESHOLD: i64 = 50;

/// Station names matching this pattern are synthetic entries left over from
/// system testing and are excluded from popularity rankings.
fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("(?i)test|temp").expect("valid placeholder pattern"))
}

// ── Top stations ──────────────────────────────────────────────────────────────

/// Trip count for one station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationCount {
    pub station_name: String,
    pub trip_count: u64,
}

/// The `n` busiest stations at the given trip endpoint.
///
/// Blank stations and placeholder names (containing "test" or "temp",
/// case-insensitive) are excluded. Sorted by count descending, then station
/// name ascending. A table without the endpoint's column yields an empty
/// result.
pub fn top_stations(table: &TripTable, n: usize, by: StationRole) -> Vec<StationCount> {
    let aliases = match by {
        StationRole::Origin => columns::START_STATION_ALIASES,
        StationRole::Destination => columns::END_STATION_ALIASES,
    };
    if table.is_empty() || table.resolve_column(aliases).is_none() {
        return Vec::new();
    }

    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for trip in table.rows() {
        let Some(station) = trip.station(by) else {
            continue;
        };
        if placeholder_pattern().is_match(station) {
            continue;
        }
        *counts.entry(station.as_ref()).or_insert(0) += 1;
    }

    // Stable sort: equal counts keep the map's name-ascending order.
    let mut ranked: Vec<StationCount> = counts
        .into_iter()
        .map(|(name, count)| StationCount {
            station_name: name.to_string(),
            trip_count: count,
        })
        .collect();
    ranked.sort_by(|a, b| b.trip_count.cmp(&a.trip_count));
    ranked.truncate(n);
    ranked
}

// ── Top routes ────────────────────────────────────────────────────────────────

/// Trip count for one origin → destination pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteCount {
    /// Canonical route label, `"{origin} → {destination}"`.
    pub route: String,
    pub trip_count: u64,
}

/// The `n` most-travelled routes.
///
/// Rows missing either endpoint are skipped; circular trips (origin equals
/// destination) are kept unless `include_circular` is `false`. Sorted by
/// count descending, then route label ascending.
pub fn top_routes(table: &TripTable, n: usize, include_circular: bool) -> Vec<RouteCount> {
    if table.is_empty()
        || table.resolve_column(columns::START_STATION_ALIASES).is_none()
        || table.resolve_column(columns::END_STATION_ALIASES).is_none()
    {
        return Vec::new();
    }

    let mut counts: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    for trip in table.rows() {
        let (Some(origin), Some(dest)) = (trip.start_station.as_ref(), trip.end_station.as_ref())
        else {
            continue;
        };
        if !include_circular && origin == dest {
            continue;
        }
        *counts.entry((origin.as_ref(), dest.as_ref())).or_insert(0) += 1;
    }

    let mut ranked: Vec<RouteCount> = counts
        .into_iter()
        .map(|((origin, dest), count)| RouteCount {
            route: format!("{} → {}", origin, dest),
            trip_count: count,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.trip_count
            .cmp(&a.trip_count)
            .then_with(|| a.route.cmp(&b.route))
    });
    ranked.truncate(n);
    ranked
}

// ── Station flow balance ──────────────────────────────────────────────────────

/// Net arrival/departure balance for one station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationFlow {
    pub station_name: String,
    /// Arrivals minus departures; positive = surplus, negative = deficit.
    pub net_flow: i64,
    /// Whether the absolute imbalance exceeds the rebalancing threshold.
    pub needs_rebalancing: bool,
}

/// Net flow per station over the outer union of origin and destination
/// station sets: a station appearing only at one endpoint gets zero for
/// the other side.
///
/// Sorted by net flow descending (largest surplus first), then station name
/// ascending; truncated to `n`. Requires both station columns.
pub fn station_flow_balance(table: &TripTable, n: usize, priority_threshold: i64) -> Vec<StationFlow> {
    if table.is_empty()
        || table.resolve_column(columns::START_STATION_ALIASES).is_none()
        || table.resolve_column(columns::END_STATION_ALIASES).is_none()
    {
        return Vec::new();
    }

    let mut departures: BTreeMap<&str, i64> = BTreeMap::new();
    let mut arrivals: BTreeMap<&str, i64> = BTreeMap::new();
    for trip in table.rows() {
        if let Some(origin) = trip.start_station.as_ref() {
            *departures.entry(origin.as_ref()).or_insert(0) += 1;
        }
        if let Some(dest) = trip.end_station.as_ref() {
            *arrivals.entry(dest.as_ref()).or_insert(0) += 1;
        }
    }

    let stations: BTreeSet<&str> = departures.keys().chain(arrivals.keys()).copied().collect();

    // Stable sort over the name-ascending union preserves the tie-break.
    let mut flows: Vec<StationFlow> = stations
        .into_iter()
        .map(|name| {
            let net = arrivals.get(name).copied().unwrap_or(0)
                - departures.get(name).copied().unwrap_or(0);
            StationFlow {
                station_name: name.to_string(),
                net_flow: net,
                needs_rebalancing: net.abs() > priority_threshold,
            }
        })
        .collect();
    flows.sort_by(|a, b| b.net_flow.cmp(&a.net_flow));
    flows.truncate(n);
    flows
}

// ── Tests ─────────────────────────────────────────────────────────────────────
