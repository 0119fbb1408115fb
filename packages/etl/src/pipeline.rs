//! Dataset builders and the end-to-end ETL runs.

use std::path::Path;

use conflict_map_conflict_models::{ConflictEpisodeRecord, EventRecord, fields};
use conflict_map_geography::reference::load_reference;
use conflict_map_geography::resolve::{Resolution, resolve_countries};
use conflict_map_geography_models::{
    CountryPolygon, EventPoint, ReferenceFields, ResolutionReport, ResolvedCountryFeature,
};
use geojson::{Feature, FeatureCollection, Geometry};

use crate::EtlError;
use crate::expand::expand_episodes;
use crate::input::{read_episodes, read_events};
use crate::points::build_event_points;
use crate::write::write_feature_collection;

/// Expands episodes into country rows and resolves each against the
/// reference polygons.
#[must_use]
pub fn build_country_conflicts(
    episodes: &[ConflictEpisodeRecord],
    reference: &[CountryPolygon],
) -> Resolution {
    let rows = expand_episodes(episodes);
    log::info!(
        "Expanded {} episodes into {} country rows",
        episodes.len(),
        rows.len()
    );
    resolve_countries(rows, reference)
}

/// Converts resolved country rows to `GeoJSON` features.
#[must_use]
pub fn country_feature_collection(features: &[ResolvedCountryFeature]) -> FeatureCollection {
    collection(
        features
            .iter()
            .map(|f| feature(&f.geometry, f.row.to_properties()))
            .collect(),
    )
}

/// Converts event points to `GeoJSON` features.
///
/// All event attributes are kept as properties; any `geometry` column in
/// the raw data is replaced by the built point.
#[must_use]
pub fn event_feature_collection(points: &[EventPoint]) -> FeatureCollection {
    collection(
        points
            .iter()
            .map(|p| {
                let mut properties = p.record.fields.clone();
                properties.remove(fields::GEOMETRY);
                feature(&geo::Geometry::Point(p.point), properties)
            })
            .collect(),
    )
}

fn feature(geometry: &geo::Geometry<f64>, properties: geojson::JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::from(geometry))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

const fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Builds and writes the country dataset.
///
/// # Errors
///
/// Returns [`EtlError`] if an input cannot be read, the reference dataset
/// lacks both name fields, or the output cannot be written.
pub fn run_countries(
    episodes_path: &Path,
    reference_path: &Path,
    fields: &ReferenceFields,
    output: &Path,
) -> Result<ResolutionReport, EtlError> {
    let episodes = read_episodes(episodes_path)?;
    let reference = load_reference(reference_path, fields)?;
    let resolution = build_country_conflicts(&episodes.records, &reference);

    write_feature_collection(output, &country_feature_collection(&resolution.features))?;
    log::info!(
        "Wrote {} country features to {}",
        resolution.features.len(),
        output.display()
    );
    Ok(resolution.report)
}

/// Builds and writes the event dataset. Returns the number of features
/// written.
///
/// # Errors
///
/// Returns [`EtlError`] if the input cannot be read or the output cannot
/// be written.
pub fn run_events(events_path: &Path, output: &Path) -> Result<usize, EtlError> {
    let events: Vec<EventRecord> = read_events(events_path)?;
    let (points, _excluded) = build_event_points(events);

    write_feature_collection(output, &event_feature_collection(&points))?;
    log::info!(
        "Wrote {} event features to {}",
        points.len(),
        output.display()
    );
    Ok(points.len())
}
