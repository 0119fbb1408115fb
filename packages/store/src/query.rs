//! Store query construction.
//!
//! Filters are combined conjunctively in a `bool.filter` clause. Total hit
//! counting is switched off; callers only need the capped result set.

use serde_json::{Map, Value, json};

use conflict_map_conflict_models::value_as_f64;

/// A single filter predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Exact match on a field.
    Term {
        /// Field name.
        field: String,
        /// Required value.
        value: Value,
    },
    /// Numeric lower bound, inclusive.
    Range {
        /// Field name.
        field: String,
        /// Inclusive lower bound.
        gte: Value,
    },
}

impl Filter {
    /// Creates an exact-match filter.
    #[must_use]
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates an inclusive lower-bound range filter.
    #[must_use]
    pub fn range_gte(field: impl Into<String>, gte: impl Into<Value>) -> Self {
        Self::Range {
            field: field.into(),
            gte: gte.into(),
        }
    }

    /// Renders the filter in Elasticsearch query DSL.
    #[must_use]
    pub fn to_query(&self) -> Value {
        match self {
            Self::Term { field, value } => json!({ "term": { field: value } }),
            Self::Range { field, gte } => json!({ "range": { field: { "gte": gte } } }),
        }
    }

    /// Evaluates the filter against a document body.
    ///
    /// Term filters compare numbers numerically, so `2` matches `2.0`.
    #[must_use]
    pub fn matches(&self, doc: &Map<String, Value>) -> bool {
        match self {
            Self::Term { field, value } => doc.get(field).is_some_and(|v| {
                match (v.as_f64(), value.as_f64()) {
                    (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
                    _ => v == value,
                }
            }),
            Self::Range { field, gte } => match (
                doc.get(field).and_then(value_as_f64),
                value_as_f64(gte),
            ) {
                (Some(v), Some(bound)) => v >= bound,
                _ => false,
            },
        }
    }
}

/// A capped, filtered search against one index.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Index name.
    pub index: String,
    /// Conjunctive filters.
    pub filters: Vec<Filter>,
    /// Maximum number of documents to return.
    pub size: usize,
}

impl SearchRequest {
    /// Creates a request with no filters.
    #[must_use]
    pub fn new(index: impl Into<String>, size: usize) -> Self {
        Self {
            index: index.into(),
            filters: Vec::new(),
            size,
        }
    }

    /// Adds a filter.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Renders the request body.
    #[must_use]
    pub fn to_body(&self) -> Value {
        let filters: Vec<Value> = self.filters.iter().map(Filter::to_query).collect();
        json!({
            "query": { "bool": { "filter": filters } },
            "size": self.size,
            "track_total_hits": false,
        })
    }
}
