//! CSV export of result tables.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

/// Write `rows` to `<dir>/<name>.csv`, creating `dir` if needed.
///
/// Headers come from the row type's serde field names. Returns the path of
/// the written file.
pub fn write_csv<T: Serialize>(dir: &Path, name: &str, rows: &[T]) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export dir {}", dir.display()))?;
    let path = dir.join(format!("{name}.csv"));

    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(path)
}
