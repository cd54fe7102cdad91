//! Column-name registry for the canonical trip table.
//!
//! Trip logs arrive from several sources that name the same semantic field
//! differently (`"Trip Duration"`, `"trip_duration_seconds"`, ...). Each
//! field has an ordered list of accepted header names; lookups probe the
//! list and use the first match. A header that matches no list is ignored,
//! and a field whose aliases all miss is treated as absent, not an error.

/// A semantic column of the canonical trip table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    TripId,
    StartTime,
    EndTime,
    DurationSeconds,
    StartStation,
    EndStation,
    BikeId,
    UserType,
    BikeModel,
}

impl Column {
    /// The canonical snake_case name, used for display and export headers.
    pub fn canonical_name(self) -> &'static str {
        match self {
            Column::TripId => "trip_id",
            Column::StartTime => "start_time",
            Column::EndTime => "end_time",
            Column::DurationSeconds => "trip_duration_seconds",
            Column::StartStation => "start_station_name",
            Column::EndStation => "end_station_name",
            Column::BikeId => "bike_id",
            Column::UserType => "user_type",
            Column::BikeModel => "model",
        }
    }
}

// ── Alias lists (ordered, first match wins) ───────────────────────────────────

pub const TRIP_ID_ALIASES: &[&str] = &["trip_id", "Trip Id", "Trip ID", "id"];
pub const START_TIME_ALIASES: &[&str] = &["start_time", "Start Time"];
pub const END_TIME_ALIASES: &[&str] = &["end_time", "End Time"];
pub const DURATION_ALIASES: &[&str] = &["trip_duration_seconds", "Trip Duration", "amount"];
pub const START_STATION_ALIASES: &[&str] = &["start_station_name", "Start Station Name"];
pub const END_STATION_ALIASES: &[&str] = &["end_station_name", "End Station Name"];
pub const BIKE_ID_ALIASES: &[&str] = &["bike_id", "Bike Id", "Bike ID", "customer_id"];
pub const USER_TYPE_ALIASES: &[&str] = &["user_type", "User Type", "type"];
pub const BIKE_MODEL_ALIASES: &[&str] = &["model", "Model", "Bike Model"];

/// Normalise a raw header: trim and collapse internal whitespace runs.
///
/// Some exports carry a doubled space inside header names (`"Trip  Id"`);
/// collapsing runs folds those variants onto the plain-space alias.
pub fn normalize_header(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Map a (raw) header name to its semantic column, if it is a known alias.
pub fn canonical(header: &str) -> Option<Column> {
    let name = normalize_header(header);
    let lists: &[(&[&str], Column)] = &[
        (TRIP_ID_ALIASES, Column::TripId),
        (START_TIME_ALIASES, Column::StartTime),
        (END_TIME_ALIASES, Column::EndTime),
        (DURATION_ALIASES, Column::DurationSeconds),
        (START_STATION_ALIASES, Column::StartStation),
        (END_STATION_ALIASES, Column::EndStation),
        (BIKE_ID_ALIASES, Column::BikeId),
        (USER_TYPE_ALIASES, Column::UserType),
        (BIKE_MODEL_ALIASES, Column::BikeModel),
    ];
    lists
        .iter()
        .find(|(aliases, _)| aliases.contains(&name.as_str()))
        .map(|&(_, col)| col)
}
