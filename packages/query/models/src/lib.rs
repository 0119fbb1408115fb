#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Query-side types for the conflict map.
//!
//! [`FeatureCollection`] is the envelope every query endpoint returns. The
//! filter sets describe the optional narrowing each endpoint accepts and
//! know how to render themselves both as store filters and as cache key
//! inputs.

use conflict_map_conflict_models::fields;
use conflict_map_store::Filter;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default result-size cap when a caller does not supply one.
pub const DEFAULT_SIZE: usize = 10_000;

/// Default upper bound for result-size caps.
pub const DEFAULT_MAX_SIZE: usize = 50_000;

/// A `GeoJSON`-shaped feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Always `"Feature"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// `GeoJSON` geometry, or `null`.
    pub geometry: Value,
    /// Attributes.
    pub properties: Map<String, Value>,
}

impl Feature {
    /// Creates a feature.
    #[must_use]
    pub fn new(geometry: Option<Value>, properties: Map<String, Value>) -> Self {
        Self {
            kind: "Feature".to_string(),
            geometry: geometry.unwrap_or(Value::Null),
            properties,
        }
    }
}

/// A `GeoJSON`-shaped feature collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    /// Always `"FeatureCollection"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Features in emission order.
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Wraps features in a collection.
    #[must_use]
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            features,
        }
    }
}

/// Clamps a requested result-size cap to `[1, max]`.
#[must_use]
pub fn clamp_size(size: usize, max: usize) -> usize {
    size.clamp(1, max.max(1))
}

/// Optional filters for the per-event endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilters {
    /// Region label.
    pub region: Option<String>,
    /// Country name.
    pub country: Option<String>,
    /// Violence type code.
    pub type_of_violence: Option<i64>,
    /// Inclusive minimum of the best fatality estimate.
    pub min_best: Option<i64>,
}

impl EventFilters {
    /// Store filters, excluding the mandatory year term.
    #[must_use]
    pub fn store_filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(region) = non_empty(self.region.as_deref()) {
            filters.push(Filter::term(fields::REGION, region));
        }
        if let Some(country) = non_empty(self.country.as_deref()) {
            filters.push(Filter::term(fields::COUNTRY, country));
        }
        if let Some(t) = self.type_of_violence {
            filters.push(Filter::term(fields::TYPE_OF_VIOLENCE, t));
        }
        if let Some(min) = self.min_best {
            filters.push(Filter::range_gte(fields::BEST, min));
        }
        filters
    }

    /// Name/value pairs for cache keying. Unset filters are `null`.
    #[must_use]
    pub fn cache_fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("region", opt_value(self.region.clone())),
            ("country", opt_value(self.country.clone())),
            ("type_of_violence", opt_value(self.type_of_violence)),
            ("min_best", opt_value(self.min_best)),
        ]
    }
}

/// Optional filters for the per-country endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryFilters {
    /// Region label.
    pub region: Option<String>,
    /// Country name.
    pub country_name: Option<String>,
    /// Conflict type code.
    pub type_of_conflict: Option<i64>,
    /// Intensity code.
    pub intensity_level: Option<i64>,
}

impl CountryFilters {
    /// Store filters, excluding the mandatory year term.
    #[must_use]
    pub fn store_filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(region) = non_empty(self.region.as_deref()) {
            filters.push(Filter::term(fields::REGION, region));
        }
        if let Some(name) = non_empty(self.country_name.as_deref()) {
            filters.push(Filter::term(fields::COUNTRY_NAME, name));
        }
        if let Some(t) = self.type_of_conflict {
            filters.push(Filter::term(fields::TYPE_OF_CONFLICT, t));
        }
        if let Some(level) = self.intensity_level {
            filters.push(Filter::term(fields::INTENSITY_LEVEL, level));
        }
        filters
    }

    /// Name/value pairs for cache keying. Unset filters are `null`.
    #[must_use]
    pub fn cache_fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("region", opt_value(self.region.clone())),
            ("country_name", opt_value(self.country_name.clone())),
            ("type_of_conflict", opt_value(self.type_of_conflict)),
            ("intensity_level", opt_value(self.intensity_level)),
        ]
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

fn opt_value<T: Into<Value>>(value: Option<T>) -> Value {
    value.map_or(Value::Null, Into::into)
}
