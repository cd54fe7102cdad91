//! Explicit canonical-table cache keyed by source path.
//!
//! Loading and cleaning a trip log is the only expensive operation in the
//! system, so the canonical table is built once per path and shared from
//! then on. Invalidation is manual: nothing expires on its own, and a
//! reload happens only when the caller asks for one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bikeshare_core::error::Result;
use bikeshare_core::models::TripTable;
use bikeshare_data::loader;

/// Cache of loaded canonical tables, keyed by the source path as given.
///
/// Tables are handed out as [`Arc`]s: callers get cheap shared references
/// and can never mutate the cached canonical table, only derive new views
/// from it.
#[derive(Debug, Default)]
pub struct TableCache {
    tables: HashMap<PathBuf, Arc<TripTable>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `path`, loading it on first access.
    ///
    /// Load failures are returned to the caller and leave the cache
    /// untouched, so a transient failure never poisons a later retry.
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<TripTable>> {
        if let Some(table) = self.tables.get(path) {
            tracing::debug!("table cache hit for {}", path.display());
            return Ok(table.clone());
        }

        let table = Arc::new(loader::load(path)?);
        tracing::debug!(
            rows = table.len(),
            "table cache miss for {}; loaded",
            path.display()
        );
        self.tables.insert(path.to_path_buf(), table.clone());
        Ok(table)
    }

    /// Drop the cached table for `path`. Returns `true` when an entry was
    /// actually removed.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        let removed = self.tables.remove(path).is_some();
        if removed {
            tracing::debug!("table cache invalidated for {}", path.display());
        }
        removed
    }

    /// Drop every cached table.
    pub fn invalidate_all(&mut self) {
        self.tables.clear();
        tracing::debug!("table cache cleared");
    }

    pub fn is_cached(&self, path: &Path) -> bool {
        self.tables.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
