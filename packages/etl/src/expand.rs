//! Location expansion for conflict episodes.
//!
//! An episode's `location` may list several countries separated by `,` or
//! `;`. Each non-empty fragment becomes its own country row carrying the
//! episode's attributes unchanged.

use conflict_map_conflict_models::{ConflictEpisodeRecord, ExpandedCountryRow};
use conflict_map_geography::normalize::normalize_name;

/// Splits a location string into trimmed, non-empty country fragments.
#[must_use]
pub fn split_location(location: &str) -> Vec<&str> {
    location
        .split([',', ';'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Expands one episode into one row per named country.
///
/// An empty or separator-only location yields no rows.
#[must_use]
pub fn expand_episode(record: &ConflictEpisodeRecord) -> Vec<ExpandedCountryRow> {
    split_location(&record.location)
        .into_iter()
        .map(|name| ExpandedCountryRow {
            conflict_id: record.conflict_id,
            year: record.year,
            country_name: name.to_string(),
            country_key: normalize_name(name),
            attributes: record.attributes.clone(),
        })
        .collect()
}

/// Expands every episode, preserving input order.
#[must_use]
pub fn expand_episodes(records: &[ConflictEpisodeRecord]) -> Vec<ExpandedCountryRow> {
    records.iter().flat_map(expand_episode).collect()
}

#[cfg(test)]
mod tests {
    use conflict_map_conflict_models::EpisodeAttributes;

    use super::*;

    fn episode(location: &str) -> ConflictEpisodeRecord {
        ConflictEpisodeRecord {
            conflict_id: 42,
            year: 2019,
            location: location.to_string(),
            attributes: EpisodeAttributes {
                intensity_level: Some(2),
                side_a: Some("Government of X".to_string()),
                ..EpisodeAttributes::default()
            },
        }
    }

    #[test]
    fn splits_on_both_separators() {
        let rows = expand_episode(&episode("India, Pakistan; China"));
        let names: Vec<&str> = rows.iter().map(|r| r.country_name.as_str()).collect();
        assert_eq!(names, vec!["India", "Pakistan", "China"]);
        assert!(rows.iter().all(|r| r.conflict_id == 42 && r.year == 2019));
        assert!(rows.iter().all(|r| r.attributes.intensity_level == Some(2)));
    }

    #[test]
    fn drops_empty_fragments() {
        assert_eq!(split_location(" ,; , "), Vec::<&str>::new());
        assert_eq!(split_location("Mali,,"), vec!["Mali"]);
        assert!(expand_episode(&episode("")).is_empty());
    }

    #[test]
    fn computes_country_key() {
        let rows = expand_episode(&episode("Bosnia & Herzegovina"));
        assert_eq!(rows[0].country_name, "Bosnia & Herzegovina");
        assert_eq!(rows[0].country_key, "bosnia and herzegovina");
    }

    #[test]
    fn expands_in_input_order() {
        let rows = expand_episodes(&[episode("A, B"), episode("C")]);
        let names: Vec<&str> = rows.iter().map(|r| r.country_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }
}
