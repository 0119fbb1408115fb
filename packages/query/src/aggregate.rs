//! Aggregate-mode feature building for per country-year records.
//!
//! Rows are grouped by `country_name`. The first row seen for a country
//! supplies the geometry and the scalar properties; later rows only feed
//! the derived fields. "First" is whatever order the store returned, so
//! results are not sorted here.

use std::collections::BTreeMap;

use conflict_map_conflict_models::{fields, value_as_f64};
use conflict_map_query_models::Feature;
use serde_json::{Map, Value};

/// Number of rows merged into a feature.
pub const CONFLICTS_COUNT: &str = "conflicts_count";
/// Largest intensity across merged rows.
pub const INTENSITY_LEVEL_MAX: &str = "intensity_level_max";
/// Conflict ids of merged rows, in merge order.
pub const CONFLICT_IDS: &str = "conflict_ids";

struct CountryFeature {
    geometry: Value,
    properties: Map<String, Value>,
    conflicts_count: u64,
    intensity_level_max: i64,
    conflict_ids: Vec<Value>,
}

impl CountryFeature {
    fn seed(mut row: Map<String, Value>, geometry: Value) -> Self {
        let intensity = parse_intensity(row.get(fields::INTENSITY_LEVEL));
        let conflict_ids = row
            .get(fields::CONFLICT_ID)
            .filter(|id| !id.is_null())
            .cloned()
            .into_iter()
            .collect();
        row.remove(fields::GEOMETRY);

        Self {
            geometry,
            properties: row,
            conflicts_count: 1,
            intensity_level_max: intensity,
            conflict_ids,
        }
    }

    fn merge(&mut self, row: &Map<String, Value>) {
        self.conflicts_count += 1;
        self.intensity_level_max = self
            .intensity_level_max
            .max(parse_intensity(row.get(fields::INTENSITY_LEVEL)));
        if let Some(id) = row.get(fields::CONFLICT_ID).filter(|id| !id.is_null()) {
            self.conflict_ids.push(id.clone());
        }
    }

    fn into_feature(self) -> Feature {
        let mut properties = self.properties;
        properties.insert(CONFLICTS_COUNT.to_string(), self.conflicts_count.into());
        properties.insert(
            INTENSITY_LEVEL_MAX.to_string(),
            self.intensity_level_max.into(),
        );
        properties.insert(CONFLICT_IDS.to_string(), Value::Array(self.conflict_ids));
        Feature::new(Some(self.geometry), properties)
    }
}

/// Parses an intensity value, treating anything absent or unparseable as 0.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_intensity(value: Option<&Value>) -> i64 {
    value
        .and_then(|v| v.as_i64().or_else(|| value_as_f64(v).map(|f| f as i64)))
        .unwrap_or(0)
}

/// Collapses country-year rows into one feature per `country_name`.
///
/// Rows without a `country_name` or with a null geometry are skipped.
/// Features are emitted in the order their first row appeared.
#[must_use]
pub fn aggregate_country_features(rows: Vec<Map<String, Value>>) -> Vec<Feature> {
    let mut order: Vec<CountryFeature> = Vec::new();
    let mut by_country: BTreeMap<String, usize> = BTreeMap::new();

    for row in rows {
        let Some(name) = row
            .get(fields::COUNTRY_NAME)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
        else {
            continue;
        };
        let Some(geometry) = row.get(fields::GEOMETRY).filter(|g| !g.is_null()).cloned() else {
            continue;
        };

        if let Some(&pos) = by_country.get(&name) {
            order[pos].merge(&row);
        } else {
            by_country.insert(name, order.len());
            order.push(CountryFeature::seed(row, geometry));
        }
    }

    order.into_iter().map(CountryFeature::into_feature).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn square() -> Value {
        json!({"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]})
    }

    #[test]
    fn collapses_rows_per_country() {
        let features = aggregate_country_features(vec![
            row(json!({"country_name": "Mali", "year": 2020, "intensity_level": 1,
                       "conflict_id": 10, "side_a": "first", "geometry": square()})),
            row(json!({"country_name": "Mali", "year": 2020, "intensity_level": 3,
                       "conflict_id": 11, "side_a": "second", "geometry": square()})),
            row(json!({"country_name": "Mali", "year": 2020, "intensity_level": 2,
                       "conflict_id": 12, "geometry": square()})),
        ]);

        assert_eq!(features.len(), 1);
        let props = &features[0].properties;
        assert_eq!(props["conflicts_count"], 3);
        assert_eq!(props["intensity_level_max"], 3);
        assert_eq!(props["conflict_ids"], json!([10, 11, 12]));
        assert_eq!(props["side_a"], "first");
        assert_eq!(props["intensity_level"], 1);
        assert!(!props.contains_key("geometry"));
        assert_eq!(features[0].geometry["type"], "Polygon");
    }

    #[test]
    fn skips_rows_without_name_or_geometry() {
        let features = aggregate_country_features(vec![
            row(json!({"country_name": "Chad", "geometry": null})),
            row(json!({"year": 2020, "geometry": square()})),
            row(json!({"country_name": "Chad", "conflict_id": 5, "geometry": square()})),
        ]);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].properties["conflicts_count"], 1);
        assert_eq!(features[0].properties["conflict_ids"], json!([5]));
    }

    #[test]
    fn unparseable_intensity_counts_as_zero() {
        let features = aggregate_country_features(vec![
            row(json!({"country_name": "Peru", "intensity_level": "high", "geometry": square()})),
            row(json!({"country_name": "Peru", "geometry": square()})),
        ]);
        assert_eq!(features[0].properties["intensity_level_max"], 0);
        assert_eq!(features[0].properties["conflicts_count"], 2);
        assert_eq!(features[0].properties["conflict_ids"], json!([]));
    }

    #[test]
    fn duplicate_ids_are_kept() {
        let features = aggregate_country_features(vec![
            row(json!({"country_name": "Iraq", "conflict_id": 7, "geometry": square()})),
            row(json!({"country_name": "Iraq", "conflict_id": 7, "geometry": square()})),
        ]);
        assert_eq!(features[0].properties["conflict_ids"], json!([7, 7]));
    }

    #[test]
    fn preserves_first_seen_order() {
        let features = aggregate_country_features(vec![
            row(json!({"country_name": "Yemen", "geometry": square()})),
            row(json!({"country_name": "Chad", "geometry": square()})),
            row(json!({"country_name": "Yemen", "geometry": square()})),
        ]);
        let names: Vec<&str> = features
            .iter()
            .filter_map(|f| f.properties["country_name"].as_str())
            .collect();
        assert_eq!(names, vec!["Yemen", "Chad"]);
    }

    #[test]
    fn parses_intensity_variants() {
        assert_eq!(parse_intensity(Some(&json!(2))), 2);
        assert_eq!(parse_intensity(Some(&json!(2.0))), 2);
        assert_eq!(parse_intensity(Some(&json!("2"))), 2);
        assert_eq!(parse_intensity(Some(&Value::Null)), 0);
        assert_eq!(parse_intensity(None), 0);
    }
}
