//! Data layer for the bike-share trip analytics suite.
//!
//! Responsible for loading raw trip CSV logs into the canonical
//! [`TripTable`](bikeshare_core::models::TripTable) and for every
//! aggregation computed over it: volume and duration metrics, station and
//! route rankings, temporal distributions, and the hourly demand forecast.
//! All aggregations are pure functions; they never mutate their input.

pub mod forecast;
pub mod loader;
pub mod metrics;
pub mod stations;
pub mod temporal;

pub use bikeshare_core as core;
