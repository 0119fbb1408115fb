#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Country name normalization, geometry repair, and name-based country
//! resolution.
//!
//! Conflict episode locations are free text, so countries are attributed
//! by matching normalized names against a reference polygon dataset
//! (Natural Earth admin-0 countries). Matching is two-tier: the primary
//! official name first, then the long-form name. Reference geometries are
//! repaired before use so that every resolved feature is renderable.

pub mod normalize;
pub mod reference;
pub mod repair;
pub mod resolve;

use thiserror::Error;

/// Errors that can occur during geography operations.
#[derive(Debug, Error)]
pub enum GeoError {
    /// I/O error reading a reference dataset.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The reference dataset is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The reference dataset has none of the expected name fields.
    #[error("Reference dataset has neither of the expected name fields {primary}/{secondary}")]
    MissingNameFields {
        /// Expected primary name field.
        primary: String,
        /// Expected secondary name field.
        secondary: String,
    },

    /// Data conversion error.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}
