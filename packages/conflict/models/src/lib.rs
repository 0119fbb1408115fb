#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Conflict episode and event record types.
//!
//! Episode records describe one armed conflict in one calendar year and
//! carry a free-text `location` that may name several countries. Event
//! records are single geocoded incidents with loosely typed attributes.
//! Both are immutable source inputs to the ETL pipeline.

pub mod sanitize;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum_macros::{AsRefStr, Display, EnumString};

/// Well-known attribute names shared by the datasets, the store mappings,
/// and the query filters.
pub mod fields {
    /// Conflict identifier.
    pub const CONFLICT_ID: &str = "conflict_id";
    /// Legacy conflict identifier column used by newer event exports.
    pub const CONFLICT_NEW_ID: &str = "conflict_new_id";
    /// Calendar year.
    pub const YEAR: &str = "year";
    /// Free-text, possibly multi-country location.
    pub const LOCATION: &str = "location";
    /// Single country name after location expansion.
    pub const COUNTRY_NAME: &str = "country_name";
    /// Normalized country matching key.
    pub const COUNTRY_KEY: &str = "country_key";
    /// Event country.
    pub const COUNTRY: &str = "country";
    /// Region label.
    pub const REGION: &str = "region";
    /// Episode conflict type code.
    pub const TYPE_OF_CONFLICT: &str = "type_of_conflict";
    /// Episode intensity code.
    pub const INTENSITY_LEVEL: &str = "intensity_level";
    /// Episode incompatibility code.
    pub const INCOMPATIBILITY: &str = "incompatibility";
    /// Primary party.
    pub const SIDE_A: &str = "side_a";
    /// Opposing party.
    pub const SIDE_B: &str = "side_b";
    /// Dataset version.
    pub const VERSION: &str = "version";
    /// Event violence type code.
    pub const TYPE_OF_VIOLENCE: &str = "type_of_violence";
    /// Best fatality estimate for an event.
    pub const BEST: &str = "best";
    /// Event latitude.
    pub const LATITUDE: &str = "latitude";
    /// Event longitude.
    pub const LONGITUDE: &str = "longitude";
    /// Event identifier.
    pub const ID: &str = "id";
    /// Geometry attribute in persisted and indexed records.
    pub const GEOMETRY: &str = "geometry";
}

/// The two derived datasets produced by the ETL and served by the query
/// layer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DatasetKind {
    /// Per-event point records.
    Events,
    /// Per country-year polygon records.
    Countries,
}

impl DatasetKind {
    /// Default store index name for this dataset. Also used as the cache
    /// key prefix for the matching query endpoint.
    #[must_use]
    pub const fn default_index(self) -> &'static str {
        match self {
            Self::Events => "conflicts",
            Self::Countries => "conflict_countries",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Events, Self::Countries]
    }
}

/// Attributes carried unchanged from an episode record onto every country
/// row expanded from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeAttributes {
    /// Conflict type code (1-4).
    pub type_of_conflict: Option<i64>,
    /// Intensity code (1 = minor, 2 = war).
    pub intensity_level: Option<i64>,
    /// Incompatibility code (territory, government, or both).
    pub incompatibility: Option<i64>,
    /// Primary party (usually a government).
    pub side_a: Option<String>,
    /// Opposing party or parties.
    pub side_b: Option<String>,
    /// Region label. May list several regions.
    pub region: Option<String>,
    /// Source dataset version.
    pub version: Option<f64>,
}

/// One conflict in one calendar year. Identity is `(conflict_id, year)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictEpisodeRecord {
    /// Conflict identifier.
    pub conflict_id: i64,
    /// Calendar year.
    pub year: i32,
    /// Free-text location, possibly naming several countries separated by
    /// `,` or `;`.
    pub location: String,
    /// Remaining episode attributes.
    #[serde(flatten)]
    pub attributes: EpisodeAttributes,
}

/// One `(conflict_id, year, country_name)` row produced by splitting an
/// episode's location string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandedCountryRow {
    /// Conflict identifier inherited from the episode.
    pub conflict_id: i64,
    /// Year inherited from the episode.
    pub year: i32,
    /// Trimmed country name fragment from the location string.
    pub country_name: String,
    /// Normalized form of `country_name`, used only for equality matching.
    pub country_key: String,
    /// Attributes inherited from the episode.
    #[serde(flatten)]
    pub attributes: EpisodeAttributes,
}

/// Uniqueness key of an [`ExpandedCountryRow`].
pub type CountryRowIdentity = (i64, i32, String);

impl ExpandedCountryRow {
    /// Returns the `(conflict_id, year, country_name)` identity.
    #[must_use]
    pub fn identity(&self) -> CountryRowIdentity {
        (self.conflict_id, self.year, self.country_name.clone())
    }

    /// Flattens the row into a property map for persistence and indexing.
    #[must_use]
    pub fn to_properties(&self) -> Map<String, Value> {
        let attrs = &self.attributes;
        let mut props = Map::new();
        props.insert(fields::CONFLICT_ID.to_string(), self.conflict_id.into());
        props.insert(fields::YEAR.to_string(), self.year.into());
        props.insert(
            fields::COUNTRY_NAME.to_string(),
            self.country_name.clone().into(),
        );
        props.insert(
            fields::COUNTRY_KEY.to_string(),
            self.country_key.clone().into(),
        );
        props.insert(
            fields::TYPE_OF_CONFLICT.to_string(),
            attrs.type_of_conflict.into(),
        );
        props.insert(
            fields::INTENSITY_LEVEL.to_string(),
            attrs.intensity_level.into(),
        );
        props.insert(
            fields::INCOMPATIBILITY.to_string(),
            attrs.incompatibility.into(),
        );
        props.insert(fields::SIDE_A.to_string(), attrs.side_a.clone().into());
        props.insert(fields::SIDE_B.to_string(), attrs.side_b.clone().into());
        props.insert(fields::REGION.to_string(), attrs.region.clone().into());
        props.insert(fields::VERSION.to_string(), attrs.version.into());
        props
    }
}

/// A single geocoded conflict event with loosely typed attributes, as read
/// from the raw event feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventRecord {
    /// Column name to sanitized cell value.
    pub fields: Map<String, Value>,
}

impl EventRecord {
    /// Wraps a field map.
    #[must_use]
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Returns a field value, treating JSON `null` as absent.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    /// Reads a numeric field. Numeric strings are accepted; anything else
    /// (including non-finite values) yields `None`.
    #[must_use]
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(value_as_f64)
    }
}

/// Interprets a JSON value as a finite `f64`, accepting numeric strings.
#[must_use]
pub fn value_as_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}
