mod bootstrap;
mod export;
mod render;

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use bikeshare_core::error::DatasetError;
use bikeshare_core::models::StationRole;
use bikeshare_data::loader;
use bikeshare_data::metrics::DEFAULT_EXTREME_QUANTILE;
use bikeshare_data::stations::DEFAULT_PRIORITY_THRESHOLD;
use bikeshare_runtime::session::DashboardSession;
use chrono::NaiveDateTime;
use clap::Parser;
use serde::Serialize;

/// Terminal report over a bike-share trip log: volume and duration
/// metrics, station and route rankings, temporal patterns, and the hourly
/// demand forecast.
#[derive(Parser)]
#[command(name = "bikeshare-analytics", version, about)]
struct Cli {
    /// Trip-log CSV to analyse (default: first CSV under ./data).
    #[arg(long)]
    data: Option<PathBuf>,

    /// Inclusive lower bound on trip start, e.g. "2024-08-01 00:00:00".
    #[arg(long)]
    start: Option<String>,

    /// Inclusive upper bound on trip start.
    #[arg(long)]
    end: Option<String>,

    /// Comma-separated origin stations to keep.
    #[arg(long, value_delimiter = ',')]
    stations: Vec<String>,

    /// Number of entries in each ranking.
    #[arg(long, default_value_t = 10)]
    top_n: usize,

    /// Write every result table as CSV into this directory.
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "BIKESHARE_LOG")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    bootstrap::setup_logging(&cli.log_level)?;

    tracing::info!("Bike Share Analytics v{} starting", env!("CARGO_PKG_VERSION"));

    let Some(data_file) = bootstrap::discover_data_file(cli.data.as_ref()) else {
        eprintln!("No trip dataset found. Place a CSV under ./data or pass --data <path>.");
        std::process::exit(2);
    };

    let mut session = match DashboardSession::open(&data_file) {
        Ok(session) => session,
        Err(DatasetError::NotFound(path)) => {
            eprintln!("Dataset not found: {}", path.display());
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("Failed to load dataset: {err}");
            std::process::exit(1);
        }
    };

    session.set_datetime_filter(parse_bound(cli.start.as_deref())?, parse_bound(cli.end.as_deref())?);
    if !cli.stations.is_empty() {
        session.set_station_filter(cli.stations.clone());
    }

    print_report(&session, cli.top_n);

    if let Some(dir) = &cli.export_dir {
        export_all(&session, dir, cli.top_n)?;
        println!("\nResult tables written to {}", dir.display());
    }

    Ok(())
}

/// Parse an optional CLI timestamp through the loader's accepted formats.
fn parse_bound(raw: Option<&str>) -> Result<Option<NaiveDateTime>> {
    match raw {
        None => Ok(None),
        Some(s) => loader::parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| anyhow!("Unrecognised timestamp: {s}")),
    }
}

// ── Report rendering ───────────────────────────────────────────────────────────

fn print_report(session: &DashboardSession, top_n: usize) {
    println!("Bike Share: Daily Operations");
    println!("Dataset: {}", session.source_path().display());
    if let Some((min, max)) = session.date_range() {
        println!("Data available: {} to {}", min, max);
    }
    println!();
    println!("Records loaded:    {}", session.canonical().len());
    println!("Total trips:       {}", session.total_trips());
    println!("Avg trip duration: {:.1} min", session.average_duration_minutes());

    section("Peak Hours");
    let rows: Vec<Vec<String>> = session
        .peak_hours()
        .iter()
        .map(|h| vec![format!("{:02}:00", h.hour), h.trip_count.to_string()])
        .collect();
    print!("{}", render::render_table(&["hour", "trips"], &rows));

    section("Daily Trend");
    let rows: Vec<Vec<String>> = session
        .daily_trend()
        .iter()
        .map(|d| {
            vec![
                d.date.to_string(),
                d.trip_count.to_string(),
                d.day_of_week.clone(),
                if d.is_peak_day { "peak".to_string() } else { String::new() },
            ]
        })
        .collect();
    print!("{}", render::render_table(&["date", "trips", "weekday", ""], &rows));

    section(&format!("Top {top_n} Start Stations"));
    let rows: Vec<Vec<String>> = session
        .top_stations(top_n, StationRole::Origin)
        .iter()
        .map(|s| vec![s.station_name.clone(), s.trip_count.to_string()])
        .collect();
    print!("{}", render::render_table(&["station", "trips"], &rows));

    section(&format!("Top {top_n} Routes"));
    let rows: Vec<Vec<String>> = session
        .top_routes(top_n, true)
        .iter()
        .map(|r| vec![r.route.clone(), r.trip_count.to_string()])
        .collect();
    print!("{}", render::render_table(&["route", "trips"], &rows));

    section("Station Flow Balance");
    let rows: Vec<Vec<String>> = session
        .station_flow_balance(top_n, DEFAULT_PRIORITY_THRESHOLD)
        .iter()
        .map(|f| {
            vec![
                f.station_name.clone(),
                f.net_flow.to_string(),
                if f.needs_rebalancing { "rebalance".to_string() } else { String::new() },
            ]
        })
        .collect();
    print!("{}", render::render_table(&["station", "net flow", ""], &rows));

    section("User Types");
    let rows: Vec<Vec<String>> = session
        .user_type_breakdown(false)
        .iter()
        .map(|(label, count)| vec![label.clone(), format!("{count:.0}")])
        .collect();
    print!("{}", render::render_table(&["user type", "trips"], &rows));

    section(&format!("Top {top_n} Bikes by Usage"));
    let rows: Vec<Vec<String>> = session
        .vehicle_usage(top_n, DEFAULT_EXTREME_QUANTILE)
        .iter()
        .map(|v| {
            vec![
                v.bike_id.clone(),
                format!("{:.0}", v.total_duration_seconds),
                if v.is_extreme { "extreme".to_string() } else { String::new() },
            ]
        })
        .collect();
    print!("{}", render::render_table(&["bike", "seconds", ""], &rows));

    section("Hourly Demand Forecast (full history)");
    let rows: Vec<Vec<String>> = session
        .forecast_hourly_demand()
        .iter()
        .map(|f| {
            vec![
                format!("{:02}:00", f.hour),
                format!("{:.1}", f.predicted_demand),
                format!("{:.1}", f.std_dev),
                format!("{:.1}", f.weekday_demand),
                format!("{:.1}", f.weekend_demand),
            ]
        })
        .collect();
    print!(
        "{}",
        render::render_table(&["hour", "expected", "std dev", "weekday", "weekend"], &rows)
    );

    let summary = session.forecast_summary();
    println!();
    println!("Predicted peak hour:  {:02}:00", summary.peak_hour);
    println!("Max expected trips:   {:.1}", summary.peak_demand);
    println!("Total daily forecast: {:.0} trips", summary.total_daily_trips);
}

fn section(title: &str) {
    println!("\n{title}");
}

// ── Export ─────────────────────────────────────────────────────────────────────

/// A user-type count flattened for CSV export.
#[derive(Serialize)]
struct UserTypeRow {
    user_type: String,
    trips: f64,
}

fn export_all(session: &DashboardSession, dir: &PathBuf, top_n: usize) -> Result<()> {
    export::write_csv(dir, "peak_hours", &session.peak_hours())?;
    export::write_csv(dir, "daily_trend", &session.daily_trend())?;
    export::write_csv(dir, "top_stations", &session.top_stations(top_n, StationRole::Origin))?;
    export::write_csv(dir, "top_routes", &session.top_routes(top_n, true))?;
    export::write_csv(
        dir,
        "station_flow_balance",
        &session.station_flow_balance(top_n, DEFAULT_PRIORITY_THRESHOLD),
    )?;
    export::write_csv(
        dir,
        "vehicle_usage",
        &session.vehicle_usage(top_n, DEFAULT_EXTREME_QUANTILE),
    )?;
    let user_rows: Vec<UserTypeRow> = session
        .user_type_breakdown(false)
        .into_iter()
        .map(|(user_type, trips)| UserTypeRow { user_type, trips })
        .collect();
    export::write_csv(dir, "user_types", &user_rows)?;
    export::write_csv(dir, "hourly_forecast", &session.forecast_hourly_demand())?;
    Ok(())
}
