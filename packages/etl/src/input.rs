//! Raw CSV dataset readers.
//!
//! Header names are trimmed and required columns are checked before any
//! row is parsed. Cells are parsed leniently: empty and `NaN` cells are
//! null, and unparseable numeric attributes become null rather than
//! failing the run.

use std::io::Read;
use std::path::Path;

use conflict_map_conflict_models::sanitize::infer_cell;
use conflict_map_conflict_models::{
    ConflictEpisodeRecord, EpisodeAttributes, EventRecord, fields, value_as_f64,
};
use serde_json::{Map, Value};

use crate::EtlError;

const EPISODE_COLUMNS: &[&str] = &[fields::CONFLICT_ID, fields::YEAR, fields::LOCATION];
const EVENT_COLUMNS: &[&str] = &[
    fields::CONFLICT_ID,
    fields::YEAR,
    fields::LATITUDE,
    fields::LONGITUDE,
];

/// Episodes read from a CSV file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpisodeTable {
    /// Parsed episodes in file order.
    pub records: Vec<ConflictEpisodeRecord>,
    /// Rows skipped because `conflict_id` or `year` did not parse.
    pub skipped: usize,
}

/// Reads the conflict-episode CSV.
///
/// # Errors
///
/// Returns [`EtlError`] if the file cannot be read or lacks a required
/// column.
pub fn read_episodes(path: &Path) -> Result<EpisodeTable, EtlError> {
    let table = read_episodes_from(std::fs::File::open(path)?)?;
    log::info!(
        "Read {} episodes from {} ({} skipped)",
        table.records.len(),
        path.display(),
        table.skipped
    );
    Ok(table)
}

/// Reads conflict episodes from any CSV source.
///
/// # Errors
///
/// Returns [`EtlError`] on CSV errors or missing required columns.
pub fn read_episodes_from<R: Read>(reader: R) -> Result<EpisodeTable, EtlError> {
    let mut table = EpisodeTable::default();

    for row in read_rows(reader, "episodes", EPISODE_COLUMNS, false)? {
        let (Some(conflict_id), Some(year)) = (
            integer(&row, fields::CONFLICT_ID),
            integer(&row, fields::YEAR).and_then(|y| i32::try_from(y).ok()),
        ) else {
            table.skipped += 1;
            continue;
        };

        table.records.push(ConflictEpisodeRecord {
            conflict_id,
            year,
            location: text(&row, fields::LOCATION).unwrap_or_default(),
            attributes: EpisodeAttributes {
                type_of_conflict: integer(&row, fields::TYPE_OF_CONFLICT),
                intensity_level: integer(&row, fields::INTENSITY_LEVEL),
                incompatibility: integer(&row, fields::INCOMPATIBILITY),
                side_a: text(&row, fields::SIDE_A),
                side_b: text(&row, fields::SIDE_B),
                region: text(&row, fields::REGION),
                version: row.get(fields::VERSION).and_then(value_as_f64),
            },
        });
    }

    if table.skipped > 0 {
        log::warn!(
            "Skipped {} episode rows with unparseable conflict_id or year",
            table.skipped
        );
    }
    Ok(table)
}

/// Reads the geocoded event CSV.
///
/// # Errors
///
/// Returns [`EtlError`] if the file cannot be read or lacks a required
/// column.
pub fn read_events(path: &Path) -> Result<Vec<EventRecord>, EtlError> {
    let events = read_events_from(std::fs::File::open(path)?)?;
    log::info!("Read {} events from {}", events.len(), path.display());
    Ok(events)
}

/// Reads geocoded events from any CSV source.
///
/// A `conflict_new_id` column stands in for a missing `conflict_id`.
///
/// # Errors
///
/// Returns [`EtlError`] on CSV errors or missing required columns.
pub fn read_events_from<R: Read>(reader: R) -> Result<Vec<EventRecord>, EtlError> {
    Ok(read_rows(reader, "events", EVENT_COLUMNS, true)?
        .into_iter()
        .map(EventRecord::new)
        .collect())
}

fn read_rows<R: Read>(
    reader: R,
    dataset: &str,
    required: &[&str],
    alias_conflict_id: bool,
) -> Result<Vec<Map<String, Value>>, EtlError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    let alias = alias_conflict_id
        && !headers.iter().any(|h| h == fields::CONFLICT_ID)
        && headers.iter().any(|h| h == fields::CONFLICT_NEW_ID);

    let missing: Vec<String> = required
        .iter()
        .filter(|c| !headers.iter().any(|h| h == *c))
        .filter(|c| !(alias && **c == fields::CONFLICT_ID))
        .map(|c| (*c).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(EtlError::MissingColumns {
            dataset: dataset.to_string(),
            missing,
        });
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let mut row = Map::new();
        for (i, header) in headers.iter().enumerate() {
            row.insert(header.clone(), infer_cell(record.get(i).unwrap_or("")));
        }
        if alias {
            let id = row.get(fields::CONFLICT_NEW_ID).cloned().unwrap_or(Value::Null);
            row.insert(fields::CONFLICT_ID.to_string(), id);
        }
        rows.push(row);
    }
    Ok(rows)
}

#[allow(clippy::cast_possible_truncation)]
fn integer(row: &Map<String, Value>, name: &str) -> Option<i64> {
    let value = row.get(name)?;
    value.as_i64().or_else(|| {
        value_as_f64(value)
            .filter(|f| f.fract().abs() < f64::EPSILON)
            .map(|f| f as i64)
    })
}

fn text(row: &Map<String, Value>, name: &str) -> Option<String> {
    match row.get(name)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_episodes_leniently() {
        let csv = "conflict_id, year ,location,intensity_level,side_a,side_b,region,version\n\
                   11342,2020,\"Mali, Niger\",2,Government of Mali,JNIM,1,23.1\n\
                   11343,2020.0,Chad,oops,Government of Chad,NaN,,\n\
                   bad,2020,Peru,1,,,,\n";
        let table = read_episodes_from(csv.as_bytes()).unwrap();

        assert_eq!(table.records.len(), 2);
        assert_eq!(table.skipped, 1);

        let mali = &table.records[0];
        assert_eq!(mali.conflict_id, 11342);
        assert_eq!(mali.location, "Mali, Niger");
        assert_eq!(mali.attributes.intensity_level, Some(2));
        assert_eq!(mali.attributes.side_b.as_deref(), Some("JNIM"));
        assert_eq!(mali.attributes.region.as_deref(), Some("1"));

        let chad = &table.records[1];
        assert_eq!(chad.year, 2020);
        assert_eq!(chad.attributes.intensity_level, None);
        assert_eq!(chad.attributes.side_b, None);
        assert_eq!(chad.attributes.region, None);
        assert_eq!(chad.attributes.version, None);
    }

    #[test]
    fn missing_episode_columns_is_an_error() {
        let err = read_episodes_from("conflict_id,year\n1,2020\n".as_bytes()).unwrap_err();
        match err {
            EtlError::MissingColumns { missing, .. } => assert_eq!(missing, vec!["location"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reads_events_with_inferred_cells() {
        let csv = "id,conflict_id,year,latitude,longitude,side_b,best\n\
                   1,10,2020,15.5,-1.25,NaN,12\n\
                   2,10,2020,,,,\n";
        let events = read_events_from(csv.as_bytes()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].fields["best"], 12);
        assert_eq!(events[0].fields["latitude"], 15.5);
        assert_eq!(events[0].fields["side_b"], Value::Null);
        assert_eq!(events[1].fields["latitude"], Value::Null);
    }

    #[test]
    fn aliases_conflict_new_id() {
        let csv = "conflict_new_id,year,latitude,longitude\n77,2021,1,2\n";
        let events = read_events_from(csv.as_bytes()).unwrap();
        assert_eq!(events[0].fields["conflict_id"], 77);
        assert_eq!(events[0].fields["conflict_new_id"], 77);
    }

    #[test]
    fn missing_event_columns_is_an_error() {
        assert!(matches!(
            read_events_from("id,year\n1,2020\n".as_bytes()),
            Err(EtlError::MissingColumns { .. })
        ));
    }
}
