//! Attribute flattening: nested JSON → dot-keyed leaf tags

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Leaf value of a flattened attribute tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TagValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<&str> for TagValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<Option<&str>> for TagValue {
    fn from(s: Option<&str>) -> Self {
        s.map_or(Self::Null, Self::from)
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Null => f.write_str("null"),
            TagValue::Bool(b) => write!(f, "{b}"),
            TagValue::Int(i) => write!(f, "{i}"),
            TagValue::Float(x) => write!(f, "{x}"),
            TagValue::Str(s) => f.write_str(s),
        }
    }
}

/// Flatten `value` into leaf tags keyed by their dot-joined path.
///
/// Objects and arrays are never tags themselves, only their leaves; array
/// indices become path segments. A scalar root yields a single tag with an
/// empty key.
pub fn flatten(value: &Value) -> BTreeMap<String, TagValue> {
    let mut tags = BTreeMap::new();
    flatten_into(&mut String::new(), value, &mut tags);
    tags
}

fn flatten_into(path: &mut String, value: &Value, tags: &mut BTreeMap<String, TagValue>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                descend(path, key, child, tags);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                descend(path, &index.to_string(), child, tags);
            }
        }
        leaf => {
            tags.insert(path.clone(), leaf_value(leaf));
        }
    }
}

fn descend(path: &mut String, segment: &str, child: &Value, tags: &mut BTreeMap<String, TagValue>) {
    let restore = path.len();
    if !path.is_empty() {
        path.push('.');
    }
    path.push_str(segment);
    flatten_into(path, child, tags);
    path.truncate(restore);
}

fn leaf_value(value: &Value) -> TagValue {
    match value {
        Value::Bool(b) => TagValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => TagValue::Int(i),
            None => TagValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => TagValue::Str(s.clone()),
        _ => TagValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_identity_shape() {
        let tags = flatten(&json!({
            "headers": {"correlationId": "a", "traceId": "b"},
            "key": {"recordId": "c"}
        }));

        let expected: BTreeMap<String, TagValue> = [
            ("headers.correlationId", "a"),
            ("headers.traceId", "b"),
            ("key.recordId", "c"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), TagValue::from(v)))
        .collect();

        assert_eq!(tags, expected);
    }

    #[test]
    fn test_empty_objects_contribute_nothing() {
        let tags = flatten(&json!({"a": {}, "b": {"c": {}}}));
        assert!(tags.is_empty());
    }

    #[test]
    fn test_arrays_use_index_segments() {
        let tags = flatten(&json!({"items": [{"id": 1}, "x"], "none": []}));
        assert_eq!(tags.len(), 2);
        assert_eq!(tags["items.0.id"], TagValue::Int(1));
        assert_eq!(tags["items.1"], TagValue::from("x"));
    }

    #[test]
    fn test_scalar_kinds() {
        let tags = flatten(&json!({
            "b": true,
            "f": 1.5,
            "i": -3,
            "n": null,
            "big": u64::MAX
        }));
        assert_eq!(tags["b"], TagValue::Bool(true));
        assert_eq!(tags["f"], TagValue::Float(1.5));
        assert_eq!(tags["i"], TagValue::Int(-3));
        assert_eq!(tags["n"], TagValue::Null);
        assert!(matches!(tags["big"], TagValue::Float(_)));
    }

    #[test]
    fn test_scalar_root() {
        let tags = flatten(&json!("alone"));
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[""], TagValue::from("alone"));
    }
}
