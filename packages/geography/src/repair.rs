//! Geometry validation and repair.
//!
//! Reference boundaries routinely contain self-intersections and other
//! OGC simple-features violations. Repair first re-nodes the polygon set
//! through a boolean union; if that still does not produce a valid result,
//! a zero-distance buffer of the original is used instead. Results that
//! collapse to zero area are rejected so that a returned geometry is
//! always renderable.

use geo::{Area, BooleanOps, Buffer, Geometry, MultiPolygon, Polygon, Validation};

/// Repairs a geometry, returning `None` if it is absent or cannot be made
/// into a valid, non-degenerate areal geometry.
#[must_use]
pub fn repair_optional(geometry: Option<&Geometry<f64>>) -> Option<Geometry<f64>> {
    repair_geometry(geometry?)
}

/// Repairs an areal geometry.
///
/// Non-areal inputs (points, lines) have no area and are rejected. A
/// single-polygon result is returned as a `Polygon`, anything else as a
/// `MultiPolygon`.
#[must_use]
pub fn repair_geometry(geometry: &Geometry<f64>) -> Option<Geometry<f64>> {
    let original = to_multi_polygon(geometry)?;

    let repaired = make_valid(&original).unwrap_or_else(|| {
        log::debug!("Union repair did not yield a valid geometry, falling back to buffer(0)");
        original.buffer(0.0)
    });

    if repaired.0.is_empty() || repaired.unsigned_area() <= 0.0 {
        return None;
    }

    Some(into_geometry(repaired))
}

/// Attempts the primary repair. Returns `None` when the repair fails to
/// produce a valid geometry.
fn make_valid(original: &MultiPolygon<f64>) -> Option<MultiPolygon<f64>> {
    if original.is_valid() {
        return Some(original.clone());
    }

    let unioned = original.union(&MultiPolygon::<f64>::new(vec![]));
    unioned.is_valid().then_some(unioned)
}

/// Extracts the areal parts of a geometry.
fn to_multi_polygon(geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        Geometry::Rect(r) => Some(MultiPolygon::new(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Some(MultiPolygon::new(vec![t.to_polygon()])),
        Geometry::GeometryCollection(gc) => {
            let polygons: Vec<Polygon<f64>> = gc
                .iter()
                .filter_map(to_multi_polygon)
                .flat_map(|mp| mp.0)
                .collect();
            if polygons.is_empty() {
                None
            } else {
                Some(MultiPolygon::new(polygons))
            }
        }
        Geometry::Point(_)
        | Geometry::Line(_)
        | Geometry::LineString(_)
        | Geometry::MultiPoint(_)
        | Geometry::MultiLineString(_) => None,
    }
}

fn into_geometry(mut mp: MultiPolygon<f64>) -> Geometry<f64> {
    if mp.0.len() == 1 {
        Geometry::Polygon(mp.0.remove(0))
    } else {
        Geometry::MultiPolygon(mp)
    }
}
