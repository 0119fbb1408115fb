//! Index mapping documents.
//!
//! One JSON mapping per dataset, embedded at compile time from
//! `packages/store/mappings/` and applied once when the index is created.

use conflict_map_conflict_models::DatasetKind;

const EVENTS_MAPPING: &str = include_str!("../mappings/conflicts.json");
const COUNTRIES_MAPPING: &str = include_str!("../mappings/conflict_countries.json");

/// Returns the raw mapping document for a dataset.
#[must_use]
pub const fn mapping_source(kind: DatasetKind) -> &'static str {
    match kind {
        DatasetKind::Events => EVENTS_MAPPING,
        DatasetKind::Countries => COUNTRIES_MAPPING,
    }
}

/// Returns the parsed mapping document for a dataset.
///
/// # Panics
///
/// Panics if an embedded mapping is malformed (covered by tests, since the
/// documents are compiled in).
#[must_use]
pub fn mapping(kind: DatasetKind) -> serde_json::Value {
    serde_json::from_str(mapping_source(kind))
        .unwrap_or_else(|e| panic!("Failed to parse {kind} index mapping: {e}"))
}
