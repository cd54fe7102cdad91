//! Session layer for the bike-share analytics suite.
//!
//! Owns the lifecycle described by the data model: the canonical table is
//! loaded once per source path, cached explicitly, and re-filtered into
//! fresh views on every interactive parameter change.

pub mod session;
pub mod table_cache;

pub use bikeshare_core as core;
pub use bikeshare_data as data;
