//! Point building for geocoded events.

use conflict_map_conflict_models::{EventRecord, fields};
use conflict_map_geography_models::EventPoint;

/// Builds a point from an event's `longitude`/`latitude`.
///
/// Returns `None` when either coordinate is missing or not numeric.
#[must_use]
pub fn build_event_point(record: EventRecord) -> Option<EventPoint> {
    let lon = record.number(fields::LONGITUDE)?;
    let lat = record.number(fields::LATITUDE)?;
    Some(EventPoint {
        point: geo::Point::new(lon, lat),
        record,
    })
}

/// Builds points for every event that has coordinates.
///
/// Returns the points in input order and the number of rows excluded.
#[must_use]
pub fn build_event_points(records: Vec<EventRecord>) -> (Vec<EventPoint>, usize) {
    let total = records.len();
    let points: Vec<EventPoint> = records.into_iter().filter_map(build_event_point).collect();
    let excluded = total - points.len();
    if excluded > 0 {
        log::info!("Excluded {excluded} of {total} events without usable coordinates");
    }
    (points, excluded)
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn event(value: Value) -> EventRecord {
        EventRecord::new(value.as_object().unwrap().clone())
    }

    #[test]
    fn builds_point_from_coordinates() {
        let point = build_event_point(event(json!({"id": 1, "latitude": 15.5, "longitude": -1.25})))
            .unwrap();
        assert!((point.point.x() - -1.25).abs() < f64::EPSILON);
        assert!((point.point.y() - 15.5).abs() < f64::EPSILON);
        assert_eq!(point.record.fields["id"], 1);
    }

    #[test]
    fn excludes_rows_without_coordinates() {
        let (points, excluded) = build_event_points(vec![
            event(json!({"latitude": 1.0, "longitude": 2.0})),
            event(json!({"latitude": null, "longitude": 2.0})),
            event(json!({"latitude": "north", "longitude": 2.0})),
            event(json!({"longitude": 2.0})),
        ]);
        assert_eq!(points.len(), 1);
        assert_eq!(excluded, 3);
    }

    #[test]
    fn accepts_numeric_strings() {
        assert!(build_event_point(event(json!({"latitude": "1.5", "longitude": "2"}))).is_some());
    }
}
