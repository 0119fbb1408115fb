//! Two-tier country resolution.
//!
//! Expanded conflict rows are joined to reference polygons by normalized
//! name: first against the primary name key, then, for rows still without
//! a geometry, against the secondary name key. Rows matching neither tier
//! are dropped and reported, never emitted with a null geometry.

use std::collections::{BTreeMap, BTreeSet};

use conflict_map_conflict_models::{CountryRowIdentity, ExpandedCountryRow};
use conflict_map_geography_models::{
    CountryPolygon, MatchTier, ResolutionReport, ResolvedCountryFeature,
};

use crate::normalize::normalize_optional;
use crate::repair::repair_geometry;

/// Maximum number of distinct unmatched names listed in the log.
const UNMATCHED_LOG_LIMIT: usize = 25;

/// Lookup tables from normalized name key to reference polygon, built once
/// per run.
///
/// Geometries are repaired while the index is built, so each reference
/// polygon is repaired once no matter how many rows resolve to it. A key
/// whose polygon cannot be repaired still counts as a match; the rows it
/// resolves are then dropped as invalid.
pub struct NameIndex {
    geometries: Vec<Option<geo::Geometry<f64>>>,
    primary: BTreeMap<String, usize>,
    secondary: BTreeMap<String, usize>,
}

impl NameIndex {
    /// Builds the index from reference polygons.
    ///
    /// Polygons without a geometry are not indexed. When several polygons
    /// share a key, the first one wins.
    #[must_use]
    pub fn build(polygons: &[CountryPolygon]) -> Self {
        let mut geometries = Vec::new();
        let mut primary = BTreeMap::new();
        let mut secondary = BTreeMap::new();
        let mut unrepairable = 0usize;

        for polygon in polygons {
            let Some(geometry) = &polygon.geometry else {
                continue;
            };

            let repaired = repair_geometry(geometry);
            if repaired.is_none() {
                unrepairable += 1;
                log::warn!(
                    "Reference geometry for {} could not be repaired",
                    polygon
                        .primary_name
                        .as_deref()
                        .or(polygon.secondary_name.as_deref())
                        .unwrap_or("<unnamed>")
                );
            }

            let idx = geometries.len();
            geometries.push(repaired);

            let primary_key = normalize_optional(polygon.primary_name.as_deref());
            if !primary_key.is_empty() {
                primary.entry(primary_key).or_insert(idx);
            }

            let secondary_key = normalize_optional(polygon.secondary_name.as_deref());
            if !secondary_key.is_empty() {
                secondary.entry(secondary_key).or_insert(idx);
            }
        }

        log::info!(
            "Built name index: {} polygons, {} primary keys, {} secondary keys, {unrepairable} unrepairable",
            geometries.len(),
            primary.len(),
            secondary.len()
        );

        Self {
            geometries,
            primary,
            secondary,
        }
    }

    /// Looks up a normalized key. Returns the matching tier and the
    /// repaired geometry (`None` if the matched polygon was unrepairable),
    /// or `None` if neither tier matches.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<(MatchTier, Option<&geo::Geometry<f64>>)> {
        if key.is_empty() {
            return None;
        }

        self.primary
            .get(key)
            .map(|&idx| (MatchTier::Primary, idx))
            .or_else(|| {
                self.secondary
                    .get(key)
                    .map(|&idx| (MatchTier::Fallback, idx))
            })
            .map(|(tier, idx)| (tier, self.geometries[idx].as_ref()))
    }

    /// Number of indexed polygons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    /// Returns `true` if no polygon was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }
}

/// Output of a resolution run.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Resolved features, at most one per `(conflict_id, year, country_name)`.
    /// Ordering is not part of the contract.
    pub features: Vec<ResolvedCountryFeature>,
    /// Data-quality counters.
    pub report: ResolutionReport,
}

/// Resolves expanded rows against reference polygons.
#[must_use]
pub fn resolve_countries(rows: Vec<ExpandedCountryRow>, polygons: &[CountryPolygon]) -> Resolution {
    let index = NameIndex::build(polygons);
    resolve_with_index(rows, &index)
}

/// Resolves expanded rows against a prebuilt [`NameIndex`].
///
/// Deduplication keeps the first row seen for each
/// `(conflict_id, year, country_name)`.
#[must_use]
pub fn resolve_with_index(rows: Vec<ExpandedCountryRow>, index: &NameIndex) -> Resolution {
    let mut report = ResolutionReport {
        input_rows: rows.len() as u64,
        ..ResolutionReport::default()
    };
    let mut seen: BTreeSet<CountryRowIdentity> = BTreeSet::new();
    let mut features = Vec::new();

    for row in rows {
        let Some((tier, geometry)) = index.lookup(&row.country_key) else {
            report.unmatched_rows += 1;
            *report
                .unmatched_names
                .entry(row.country_name.clone())
                .or_insert(0) += 1;
            continue;
        };

        match tier {
            MatchTier::Primary => report.primary_matches += 1,
            MatchTier::Fallback => report.fallback_matches += 1,
        }

        let Some(geometry) = geometry else {
            report.invalid_geometry_rows += 1;
            continue;
        };

        if !seen.insert(row.identity()) {
            report.duplicates_removed += 1;
            continue;
        }

        features.push(ResolvedCountryFeature {
            row,
            geometry: geometry.clone(),
            tier,
        });
    }

    report.resolved = features.len() as u64;
    log_report(&report);

    Resolution { features, report }
}

fn log_report(report: &ResolutionReport) {
    log::info!(
        "Country resolution: {} rows in, {} resolved ({} primary, {} fallback), {} unmatched, {} invalid geometry, {} duplicates",
        report.input_rows,
        report.resolved,
        report.primary_matches,
        report.fallback_matches,
        report.unmatched_rows,
        report.invalid_geometry_rows,
        report.duplicates_removed,
    );

    if report.unmatched_names.is_empty() {
        return;
    }

    let mut names: Vec<(&String, &u64)> = report.unmatched_names.iter().collect();
    names.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    let listed = names
        .iter()
        .take(UNMATCHED_LOG_LIMIT)
        .map(|(name, count)| format!("{name} ({count})"))
        .collect::<Vec<_>>()
        .join(", ");
    let more = names.len().saturating_sub(UNMATCHED_LOG_LIMIT);

    if more > 0 {
        log::warn!("Unmatched country names: {listed}, and {more} more");
    } else {
        log::warn!("Unmatched country names: {listed}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conflict_map_conflict_models::EpisodeAttributes;
    use geo::polygon;

    use crate::normalize::normalize_name;

    fn square(offset: f64) -> geo::Geometry<f64> {
        geo::Geometry::Polygon(polygon![
            (x: offset, y: 0.0),
            (x: offset + 1.0, y: 0.0),
            (x: offset + 1.0, y: 1.0),
            (x: offset, y: 1.0),
            (x: offset, y: 0.0),
        ])
    }

    fn country(primary: Option<&str>, secondary: Option<&str>, offset: f64) -> CountryPolygon {
        CountryPolygon {
            primary_name: primary.map(ToString::to_string),
            secondary_name: secondary.map(ToString::to_string),
            geometry: Some(square(offset)),
        }
    }

    fn row(conflict_id: i64, year: i32, name: &str) -> ExpandedCountryRow {
        ExpandedCountryRow {
            conflict_id,
            year,
            country_name: name.to_string(),
            country_key: normalize_name(name),
            attributes: EpisodeAttributes::default(),
        }
    }

    fn reference() -> Vec<CountryPolygon> {
        vec![
            country(Some("Mali"), Some("Republic of Mali"), 0.0),
            country(Some("Ivory Coast"), Some("Côte d'Ivoire"), 10.0),
            country(Some("Sudan"), None, 20.0),
        ]
    }

    #[test]
    fn matches_primary_key() {
        let resolution = resolve_countries(vec![row(1, 2000, "Mali")], &reference());
        assert_eq!(resolution.features.len(), 1);
        assert_eq!(resolution.features[0].tier, MatchTier::Primary);
        assert_eq!(resolution.features[0].geometry, square(0.0));
        assert_eq!(resolution.report.primary_matches, 1);
    }

    #[test]
    fn secondary_only_match_appears_once() {
        let resolution = resolve_countries(vec![row(2, 2001, "Cote d'Ivoire")], &reference());
        assert_eq!(resolution.features.len(), 1);
        assert_eq!(resolution.features[0].tier, MatchTier::Fallback);
        assert_eq!(resolution.features[0].geometry, square(10.0));
        assert_eq!(resolution.report.fallback_matches, 1);
    }

    #[test]
    fn unmatched_rows_are_absent_and_reported() {
        let resolution = resolve_countries(
            vec![
                row(3, 2002, "Atlantis"),
                row(4, 2002, "Atlantis"),
                row(5, 2002, "Sudan"),
            ],
            &reference(),
        );
        assert_eq!(resolution.features.len(), 1);
        assert!(
            resolution
                .features
                .iter()
                .all(|f| f.row.country_name != "Atlantis")
        );
        assert_eq!(resolution.report.unmatched_rows, 2);
        assert_eq!(resolution.report.unmatched_names.get("Atlantis"), Some(&2));
    }

    #[test]
    fn duplicates_collapse_to_first() {
        let mut second = row(6, 2003, "Mali");
        second.attributes.intensity_level = Some(2);
        let resolution = resolve_countries(vec![row(6, 2003, "Mali"), second], &reference());
        assert_eq!(resolution.features.len(), 1);
        assert_eq!(resolution.features[0].row.attributes.intensity_level, None);
        assert_eq!(resolution.report.duplicates_removed, 1);
    }

    #[test]
    fn same_country_different_years_are_distinct() {
        let resolution = resolve_countries(
            vec![row(7, 2003, "Mali"), row(7, 2004, "Mali"), row(8, 2003, "Mali")],
            &reference(),
        );
        assert_eq!(resolution.features.len(), 3);
    }

    #[test]
    fn primary_tier_takes_precedence_over_secondary() {
        let polygons = vec![
            country(Some("Other"), Some("Mali"), 30.0),
            country(Some("Mali"), None, 0.0),
        ];
        let resolution = resolve_countries(vec![row(9, 2005, "Mali")], &polygons);
        assert_eq!(resolution.features[0].tier, MatchTier::Primary);
        assert_eq!(resolution.features[0].geometry, square(0.0));
    }

    #[test]
    fn unrepairable_geometry_drops_row() {
        let polygons = vec![CountryPolygon {
            primary_name: Some("Flatland".to_string()),
            secondary_name: None,
            geometry: Some(geo::Geometry::Polygon(polygon![
                (x: 0.0, y: 0.0),
                (x: 1.0, y: 1.0),
                (x: 2.0, y: 2.0),
                (x: 0.0, y: 0.0),
            ])),
        }];
        let resolution = resolve_countries(vec![row(10, 2006, "Flatland")], &polygons);
        assert!(resolution.features.is_empty());
        assert_eq!(resolution.report.invalid_geometry_rows, 1);
        assert_eq!(resolution.report.primary_matches, 1);
    }

    #[test]
    fn polygons_without_geometry_are_not_indexed() {
        let polygons = vec![
            CountryPolygon {
                primary_name: Some("Mali".to_string()),
                secondary_name: None,
                geometry: None,
            },
            country(None, Some("Mali"), 40.0),
        ];
        let index = NameIndex::build(&polygons);
        assert_eq!(index.len(), 1);
        let (tier, geometry) = index.lookup("mali").unwrap();
        assert_eq!(tier, MatchTier::Fallback);
        assert_eq!(geometry, Some(&square(40.0)));
    }

    #[test]
    fn empty_key_never_matches() {
        let index = NameIndex::build(&[country(Some(" . "), None, 0.0)]);
        assert!(index.lookup("").is_none());
    }

    #[test]
    fn report_accounts_for_every_row() {
        let resolution = resolve_countries(
            vec![
                row(1, 2000, "Mali"),
                row(1, 2000, "Mali"),
                row(2, 2000, "Nowhere"),
                row(3, 2000, "Republic of Mali"),
            ],
            &reference(),
        );
        let report = &resolution.report;
        assert_eq!(report.input_rows, 4);
        assert_eq!(report.resolved + report.dropped(), report.input_rows);
        assert_eq!(report.resolved, 2);
    }
}
