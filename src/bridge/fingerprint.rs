//! Structural fingerprints for change suppression.
//!
//! Upstream state objects are rebuilt on every update, often with their keys in a different
//! order. A fingerprint is the value's canonical JSON text: object keys sorted at every level,
//! array order kept. Two values get the same fingerprint exactly when they are structurally
//! equal.

use itertools::Itertools;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Fingerprint of an optional value. Absent values fingerprint to the empty string.
pub fn fingerprint<T: Serialize + ?Sized>(value: Option<&T>) -> String {
    let Some(value) = value else {
        return String::new();
    };

    match serde_json::to_value(value) {
        Ok(json) => canonical_json(&json),
        Err(e) => {
            warn!("Failed to serialize value for fingerprinting: {}", e);
            String::new()
        }
    }
}

/// Canonical JSON text of `value` with object keys sorted lexicographically.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) => out.push_str(&value.to_string()),
        // Display on a JSON string yields the quoted, escaped form
        Value::String(_) => out.push_str(&value.to_string()),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().sorted_by(|a, b| a.0.cmp(b.0)).enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_matter() {
        let a = json!({"a": 1, "b": 2});
        let b = json!({"b": 2, "a": 1});
        assert_eq!(fingerprint(Some(&a)), fingerprint(Some(&b)));
    }

    #[test]
    fn nested_keys_are_sorted_too() {
        let value = json!({"z": {"y": 1, "x": [{"b": true, "a": null}]}, "a": "s"});
        assert_eq!(
            canonical_json(&value),
            r#"{"a":"s","z":{"x":[{"a":null,"b":true}],"y":1}}"#
        );
    }

    #[test]
    fn any_scalar_change_is_visible() {
        let base = json!({"a": 1, "b": "x", "c": [1, 2]});
        for changed in [
            json!({"a": 2, "b": "x", "c": [1, 2]}),
            json!({"a": 1, "b": "y", "c": [1, 2]}),
            json!({"a": 1, "b": "x", "c": [2, 1]}),
            json!({"a": 1, "b": "x", "c": [1, 2], "d": null}),
        ] {
            assert_ne!(fingerprint(Some(&base)), fingerprint(Some(&changed)));
        }
    }

    #[test]
    fn absent_value_is_empty() {
        assert_eq!(fingerprint::<Value>(None), "");
    }

    #[test]
    fn strings_are_escaped() {
        let value = json!({"k\"ey": "line\nbreak"});
        assert_eq!(canonical_json(&value), r#"{"k\"ey":"line\nbreak"}"#);
    }
}
