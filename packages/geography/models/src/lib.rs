#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Country reference polygon and resolution result types.
//!
//! Country attribution is purely name based: every reference polygon is
//! addressed by up to two name fields, and conflict rows are matched to
//! them by normalized key equality. No geometry-to-geometry joins happen
//! anywhere in the pipeline.

use std::collections::BTreeMap;

use conflict_map_conflict_models::{EventRecord, ExpandedCountryRow};
use serde::{Deserialize, Serialize};

/// Property names holding the candidate country names on reference
/// polygons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceFields {
    /// Official name field matched first (Natural Earth `ADMIN`).
    pub primary: String,
    /// Long-form name field used as the fallback (Natural Earth `NAME_LONG`).
    pub secondary: String,
}

impl Default for ReferenceFields {
    fn default() -> Self {
        Self {
            primary: "ADMIN".to_string(),
            secondary: "NAME_LONG".to_string(),
        }
    }
}

/// A reference country geometry keyed by its candidate names.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryPolygon {
    /// Value of the primary name field, if present.
    pub primary_name: Option<String>,
    /// Value of the secondary name field, if present.
    pub secondary_name: Option<String>,
    /// Boundary geometry as read from the reference dataset (possibly
    /// invalid).
    pub geometry: Option<geo::Geometry<f64>>,
}

/// Which match tier attached a geometry to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Matched on the primary name key.
    Primary,
    /// Matched on the secondary name key after the primary tier failed.
    Fallback,
}

/// An expanded country row joined with a repaired reference geometry.
///
/// The geometry is always present and valid; rows that could not be
/// matched or repaired never become a `ResolvedCountryFeature`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCountryFeature {
    /// The matched row.
    pub row: ExpandedCountryRow,
    /// Repaired, non-degenerate geometry.
    pub geometry: geo::Geometry<f64>,
    /// Tier that produced the match.
    pub tier: MatchTier,
}

/// A point geometry derived from an event's coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPoint {
    /// `(longitude, latitude)` point.
    pub point: geo::Point<f64>,
    /// The source event.
    pub record: EventRecord,
}

/// Data-quality counters from one country resolution run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionReport {
    /// Rows entering resolution.
    pub input_rows: u64,
    /// Rows matched on the primary key.
    pub primary_matches: u64,
    /// Rows matched on the secondary key.
    pub fallback_matches: u64,
    /// Rows that matched neither key.
    pub unmatched_rows: u64,
    /// Unmatched country names with the number of rows carrying each.
    pub unmatched_names: BTreeMap<String, u64>,
    /// Rows whose matched polygon could not be repaired into a valid,
    /// non-degenerate geometry.
    pub invalid_geometry_rows: u64,
    /// Rows collapsed by `(conflict_id, year, country_name)` deduplication.
    pub duplicates_removed: u64,
    /// Rows emitted.
    pub resolved: u64,
}

impl ResolutionReport {
    /// Total rows dropped for any reason.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.unmatched_rows + self.invalid_geometry_rows + self.duplicates_removed
    }
}
