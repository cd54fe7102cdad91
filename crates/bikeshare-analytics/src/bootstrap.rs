use std::path::PathBuf;

use bikeshare_data::loader;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Initialise the global `tracing` subscriber.
///
/// `log_level` is mapped to a [`tracing_subscriber::EnvFilter`] directive.
/// Falls back to `"info"` if the level string is not recognised.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(log_level.to_lowercase()).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer().with_target(false).with_thread_ids(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .init();

    Ok(())
}

// ── Dataset discovery ──────────────────────────────────────────────────────────

/// Locate the trip-log CSV to analyse.
///
/// An explicit `--data` path always wins. Otherwise the following
/// directories are probed in order and the first CSV found (recursively,
/// sorted by path) is used:
/// 1. `./data/`
/// 2. `~/.bikeshare/data/`
///
/// Returns `None` when no candidate directory holds a CSV file.
pub fn discover_data_file(explicit: Option<&PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.clone());
    }

    let mut candidates = vec![PathBuf::from("data")];
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".bikeshare").join("data"));
    }

    candidates
        .into_iter()
        .filter(|dir| dir.exists())
        .find_map(|dir| loader::find_csv_files(&dir).into_iter().next())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_discover_explicit_path_wins() {
        let explicit = PathBuf::from("/anywhere/trips.csv");
        assert_eq!(discover_data_file(Some(&explicit)), Some(explicit));
    }

    #[test]
    fn test_discover_finds_csv_in_data_dir() {
        let tmp = TempDir::new().expect("tempdir");
        let data_dir = tmp.path().join("data");
        std::fs::create_dir_all(&data_dir).unwrap();
        let csv_path = data_dir.join("trips.csv");
        let mut file = std::fs::File::create(&csv_path).unwrap();
        writeln!(file, "Trip Id,Start Time").unwrap();

        // Run discovery from inside the temp dir so "./data" resolves there.
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(tmp.path()).unwrap();
        let found = discover_data_file(None);
        std::env::set_current_dir(original).unwrap();

        let name = found
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()));
        assert_eq!(name.as_deref(), Some("trips.csv"));
    }
}
