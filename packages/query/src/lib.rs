#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Runtime query path for the conflict map.
//!
//! Store rows are turned into map-ready feature collections in one of two
//! modes: [`points`] emits one feature per event, and [`aggregate`]
//! collapses country-year rows into one feature per country with summary
//! statistics. [`service::QueryService`] wires both to the store and the
//! response cache.

pub mod aggregate;
pub mod points;
pub mod service;

use conflict_map_store::StoreError;

pub use service::QueryService;

/// Errors surfaced by the query service.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The store query failed.
    #[error("Store query failed: {0}")]
    Store(#[from] StoreError),
}
