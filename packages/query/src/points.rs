//! Point-mode feature building for per-event records.
//!
//! Unlike the ETL point builder, rows without usable coordinates are kept
//! and emitted with a `null` geometry so partial data still reaches the
//! caller.

use conflict_map_conflict_models::{fields, value_as_f64};
use conflict_map_query_models::Feature;
use serde_json::{Map, Value, json};

/// Converts store rows to point features, one per row, in input order.
#[must_use]
pub fn point_features(rows: Vec<Map<String, Value>>) -> Vec<Feature> {
    rows.into_iter().map(point_feature).collect()
}

/// Converts one store row to a feature.
///
/// The stored `geometry` wins when present. Otherwise a `Point` is built
/// from `longitude`/`latitude` when both are numeric.
#[must_use]
pub fn point_feature(mut row: Map<String, Value>) -> Feature {
    let stored = row.remove(fields::GEOMETRY).filter(|g| !g.is_null());
    let geometry = stored.or_else(|| synthesize_point(&row));
    Feature::new(geometry, row)
}

fn synthesize_point(row: &Map<String, Value>) -> Option<Value> {
    let lon = row.get(fields::LONGITUDE).and_then(value_as_f64)?;
    let lat = row.get(fields::LATITUDE).and_then(value_as_f64)?;
    Some(json!({ "type": "Point", "coordinates": [lon, lat] }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn uses_stored_geometry() {
        let f = point_feature(row(json!({
            "id": 1,
            "latitude": 1.0,
            "longitude": 2.0,
            "geometry": {"type": "Point", "coordinates": [9.0, 9.0]}
        })));
        assert_eq!(f.geometry["coordinates"], json!([9.0, 9.0]));
        assert!(!f.properties.contains_key("geometry"));
        assert_eq!(f.properties["id"], 1);
    }

    #[test]
    fn synthesizes_point_from_coordinates() {
        let f = point_feature(row(json!({"latitude": 12.5, "longitude": -3.25})));
        assert_eq!(f.geometry, json!({"type": "Point", "coordinates": [-3.25, 12.5]}));
    }

    #[test]
    fn null_geometry_falls_back_to_coordinates() {
        let f = point_feature(row(json!({"latitude": 1, "longitude": 2, "geometry": null})));
        assert_eq!(f.geometry["type"], "Point");
    }

    #[test]
    fn keeps_rows_without_coordinates() {
        let features = point_features(vec![
            row(json!({"id": 1, "latitude": 10.0})),
            row(json!({"id": 2, "latitude": null, "longitude": null})),
        ]);
        assert_eq!(features.len(), 2);
        assert!(features.iter().all(|f| f.geometry.is_null()));
        assert_eq!(features[1].properties["id"], 2);
    }
}
