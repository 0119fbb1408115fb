#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Batch ETL producing the two map datasets.
//!
//! The country pipeline expands multi-country episode locations, resolves
//! each country name to a repaired reference polygon, and writes one
//! polygon feature per `(conflict_id, year, country_name)`. The event
//! pipeline turns geocoded event rows into point features. Both datasets
//! are written atomically and can then be bulk loaded into the store.
//!
//! The pipeline is single-pass and single-threaded. Any failure aborts the
//! run before the output file is replaced.

pub mod config;
pub mod expand;
pub mod input;
pub mod load;
pub mod pipeline;
pub mod points;
pub mod write;

use conflict_map_geography::GeoError;
use conflict_map_store::StoreError;
use thiserror::Error;

/// Errors that abort an ETL run.
#[derive(Debug, Error)]
pub enum EtlError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `GeoJSON` parsing error.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Configuration file could not be parsed.
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Reference dataset or geometry error.
    #[error("Geography error: {0}")]
    Geo(#[from] GeoError),

    /// Store error during bulk loading.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// An input dataset lacks required columns.
    #[error("{dataset} is missing required columns: {missing:?}")]
    MissingColumns {
        /// Dataset label.
        dataset: String,
        /// Columns that were expected but absent.
        missing: Vec<String>,
    },

    /// A processed dataset is not a feature collection.
    #[error("{0} is not a GeoJSON FeatureCollection")]
    NotFeatureCollection(String),
}
