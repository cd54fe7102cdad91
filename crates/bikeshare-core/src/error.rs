use std::path::PathBuf;
use thiserror::Error;

/// All errors produced when building the canonical trip table.
///
/// A missing aggregation column is deliberately *not* an error: every
/// aggregation degrades to its empty result shape instead, so a single odd
/// dataset never prevents the remaining analyses from running.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// The trip-log file does not exist. Kept separate from [`Malformed`]
    /// so the caller can show a specific "dataset not found" message.
    ///
    /// [`Malformed`]: DatasetError::Malformed
    #[error("Dataset not found: {0}")]
    NotFound(PathBuf),

    /// The file exists but its content failed to parse into a table.
    #[error("Malformed trip data in {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// No CSV files were found under the given data directory.
    #[error("No CSV files found in {0}")]
    NoDataFiles(PathBuf),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the bikeshare crates.
pub type Result<T> = std::result::Result<T, DatasetError>;
