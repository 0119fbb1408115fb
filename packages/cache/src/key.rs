//! Deterministic cache keys for query responses.

use std::collections::BTreeMap;

use serde_json::Value;

/// Builds the cache key for a query.
///
/// Filters whose value is `null` or an empty string are dropped. The rest
/// are serialized as a JSON object with sorted keys, so the same logical
/// filter set always produces the same key regardless of the order the
/// caller supplied it in.
///
/// Format: `"{endpoint}:year={year}:size={size}:filters={json}"`.
#[must_use]
pub fn cache_key<K, I>(endpoint: &str, year: i64, size: usize, filters: I) -> String
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Value)>,
{
    let canonical: BTreeMap<String, Value> = filters
        .into_iter()
        .filter(|(_, v)| !is_blank(v))
        .map(|(k, v)| (k.into(), v))
        .collect();

    let filters = serde_json::to_string(&canonical).unwrap_or_else(|_| "{}".to_string());
    format!("{endpoint}:year={year}:size={size}:filters={filters}")
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ignores_argument_order_and_null_values() {
        let a = cache_key(
            "conflicts",
            2020,
            100,
            [("region", json!("Africa")), ("country", Value::Null)],
        );
        let b = cache_key(
            "conflicts",
            2020,
            100,
            [("country", Value::Null), ("region", json!("Africa"))],
        );
        assert_eq!(a, b);
        assert_eq!(a, r#"conflicts:year=2020:size=100:filters={"region":"Africa"}"#);
    }

    #[test]
    fn empty_strings_are_dropped() {
        let key = cache_key("conflicts", 2020, 10, [("country", json!(""))]);
        assert_eq!(key, "conflicts:year=2020:size=10:filters={}");
    }

    #[test]
    fn zero_is_not_blank() {
        let key = cache_key("conflicts", 2020, 10, [("min_best", json!(0))]);
        assert!(key.ends_with(r#"filters={"min_best":0}"#));
    }

    #[test]
    fn differing_inputs_differ() {
        let base = cache_key("conflicts", 2020, 10, [("region", json!("Asia"))]);
        assert_ne!(base, cache_key("conflicts", 2021, 10, [("region", json!("Asia"))]));
        assert_ne!(base, cache_key("conflicts", 2020, 11, [("region", json!("Asia"))]));
        assert_ne!(
            base,
            cache_key("conflict_countries", 2020, 10, [("region", json!("Asia"))])
        );
        assert_ne!(base, cache_key("conflicts", 2020, 10, [("region", json!("Europe"))]));
    }
}
