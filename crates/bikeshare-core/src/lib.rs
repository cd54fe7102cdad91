//! Domain layer for the bike-share trip analytics suite.
//!
//! Defines the canonical trip table, the column-alias registry, the error
//! taxonomy shared by every crate, and the small statistics and filtering
//! primitives the aggregation layer is built on. This crate performs no I/O.

pub mod columns;
pub mod error;
pub mod filters;
pub mod models;
pub mod stats;

pub use error::{DatasetError, Result};
