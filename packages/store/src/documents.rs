//! Index document construction from processed dataset records.
//!
//! Every document carries the record's business attributes plus a
//! `geometry` field holding a `GeoJSON` geometry or `null`, with `NaN`
//! markers replaced by `null` so the store never sees them.

use conflict_map_conflict_models::sanitize::sanitize_value;
use conflict_map_conflict_models::{DatasetKind, fields};
use serde_json::{Map, Value};

use crate::IndexDocument;

/// Builds an index document from a record's properties and geometry.
#[must_use]
pub fn build_document(
    kind: DatasetKind,
    properties: Map<String, Value>,
    geometry: Option<Value>,
) -> IndexDocument {
    let mut source: Map<String, Value> = properties
        .into_iter()
        .map(|(k, v)| (k, sanitize_value(v)))
        .collect();
    source.insert(
        fields::GEOMETRY.to_string(),
        geometry.map_or(Value::Null, sanitize_value),
    );

    let id = document_id(kind, &source);
    IndexDocument { id, source }
}

/// Derives the document id.
///
/// Event documents use their `id` attribute when present. Country
/// documents use `"{conflict_id}-{year}-{country_name}"`, which makes
/// re-loading a dataset idempotent.
#[must_use]
pub fn document_id(kind: DatasetKind, source: &Map<String, Value>) -> Option<String> {
    match kind {
        DatasetKind::Events => source.get(fields::ID).and_then(scalar_to_string),
        DatasetKind::Countries => Some(format!(
            "{}-{}-{}",
            display_or_none(source.get(fields::CONFLICT_ID)),
            display_or_none(source.get(fields::YEAR)),
            display_or_none(source.get(fields::COUNTRY_NAME)),
        )),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn display_or_none(value: Option<&Value>) -> String {
    value
        .and_then(scalar_to_string)
        .unwrap_or_else(|| "None".to_string())
}
