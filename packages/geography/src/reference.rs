//! Reference country polygon loading.
//!
//! Reads an admin-0 country `GeoJSON` `FeatureCollection` (Natural Earth)
//! and extracts the configured name fields and geometry of each feature.

use std::path::Path;

use conflict_map_geography_models::{CountryPolygon, ReferenceFields};
use geojson::GeoJson;

use crate::GeoError;

/// Loads reference polygons from a `GeoJSON` file.
///
/// # Errors
///
/// Returns [`GeoError`] if the file cannot be read or parsed, or if no
/// feature carries either of the configured name fields.
pub fn load_reference(
    path: &Path,
    fields: &ReferenceFields,
) -> Result<Vec<CountryPolygon>, GeoError> {
    log::info!("Loading reference polygons from {}", path.display());
    let contents = std::fs::read_to_string(path)?;
    let polygons = parse_reference(&contents, fields)?;
    log::info!("Loaded {} reference polygons", polygons.len());
    Ok(polygons)
}

/// Parses reference polygons from a `GeoJSON` string.
///
/// A name field counts as present if any feature carries it. Features
/// whose geometry is missing or cannot be converted keep a `None`
/// geometry and will never resolve a row.
///
/// # Errors
///
/// Returns [`GeoError`] if the input is not a `FeatureCollection`, or if
/// neither name field is present on any feature.
pub fn parse_reference(
    geojson_str: &str,
    fields: &ReferenceFields,
) -> Result<Vec<CountryPolygon>, GeoError> {
    let geojson: GeoJson = geojson_str.parse()?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(GeoError::Conversion {
            message: "Reference dataset is not a FeatureCollection".to_string(),
        });
    };

    let mut has_primary = false;
    let mut has_secondary = false;
    let mut polygons = Vec::with_capacity(collection.features.len());

    for feature in collection.features {
        has_primary |= feature.contains_property(&fields.primary);
        has_secondary |= feature.contains_property(&fields.secondary);

        let primary_name = string_property(&feature, &fields.primary);
        let secondary_name = string_property(&feature, &fields.secondary);

        let geometry = feature.geometry.and_then(|geom| {
            geo::Geometry::<f64>::try_from(geom)
                .inspect_err(|e| {
                    log::warn!(
                        "Skipping unconvertible geometry for {}: {e}",
                        primary_name.as_deref().unwrap_or("<unnamed>")
                    );
                })
                .ok()
        });

        polygons.push(CountryPolygon {
            primary_name,
            secondary_name,
            geometry,
        });
    }

    if !has_primary && !has_secondary {
        return Err(GeoError::MissingNameFields {
            primary: fields.primary.clone(),
            secondary: fields.secondary.clone(),
        });
    }

    if !has_primary {
        log::warn!(
            "Reference dataset has no {} field; matching on {} only",
            fields.primary,
            fields.secondary
        );
    }

    Ok(polygons)
}

fn string_property(feature: &geojson::Feature, name: &str) -> Option<String> {
    feature
        .property(name)
        .and_then(serde_json::Value::as_str)
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"ADMIN": "Mali", "NAME_LONG": "Republic of Mali"},
                "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}
            },
            {
                "type": "Feature",
                "properties": {"ADMIN": "Nowhere"},
                "geometry": null
            }
        ]
    }"#;

    #[test]
    fn parses_names_and_geometry() {
        let polygons = parse_reference(SAMPLE, &ReferenceFields::default()).unwrap();
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[0].primary_name.as_deref(), Some("Mali"));
        assert_eq!(polygons[0].secondary_name.as_deref(), Some("Republic of Mali"));
        assert!(matches!(polygons[0].geometry, Some(geo::Geometry::Polygon(_))));
        assert_eq!(polygons[1].secondary_name, None);
        assert!(polygons[1].geometry.is_none());
    }

    #[test]
    fn rejects_dataset_without_name_fields() {
        let fields = ReferenceFields {
            primary: "NAME_EN".to_string(),
            secondary: "FORMAL_EN".to_string(),
        };
        let err = parse_reference(SAMPLE, &fields).unwrap_err();
        assert!(matches!(err, GeoError::MissingNameFields { .. }));
    }

    #[test]
    fn accepts_dataset_with_only_secondary_field() {
        let fields = ReferenceFields {
            primary: "NAME_EN".to_string(),
            secondary: "NAME_LONG".to_string(),
        };
        let polygons = parse_reference(SAMPLE, &fields).unwrap();
        assert!(polygons.iter().all(|p| p.primary_name.is_none()));
    }

    #[test]
    fn rejects_non_collection() {
        let err = parse_reference(
            r#"{"type": "Point", "coordinates": [1, 2]}"#,
            &ReferenceFields::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GeoError::Conversion { .. }));
    }
}
