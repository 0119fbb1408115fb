//! NaN-to-null sanitization.
//!
//! Raw tabular exports encode missing values as empty cells or as the
//! literal string `NaN` (in any case). Neither may reach the store or a
//! response, so both become JSON `null`.

use serde_json::{Number, Value};

/// Returns `true` if the string is a `NaN` marker (surrounding whitespace
/// and case are ignored).
#[must_use]
pub fn is_nan_marker(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case("nan")
}

/// Recursively replaces `NaN` marker strings with `null`.
#[must_use]
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(s) if is_nan_marker(&s) => Value::Null,
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, sanitize_value(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Infers a typed JSON value from a raw CSV cell.
///
/// Empty and `NaN` cells become `null`, integers and finite floats become
/// numbers, and everything else stays a string.
#[must_use]
pub fn infer_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() || is_nan_marker(trimmed) {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Some(n) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    Value::String(raw.to_string())
}
