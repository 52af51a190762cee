//! Flattening nested extraction results for CSV export

use serde_json::{Map, Value};

use crate::types::FlatContent;

/// Flatten a nested JSON object into one level.
///
/// Nested object keys are joined with `_`, arrays become newline-joined
/// strings and null becomes an empty string. Later writes to the same
/// flattened key win.
pub fn flatten_for_csv(data: &Map<String, Value>) -> FlatContent {
    let mut flat = FlatContent::new();
    flatten_into(data, "", &mut flat);
    flat
}

fn flatten_into(data: &Map<String, Value>, prefix: &str, out: &mut FlatContent) {
    for (key, value) in data {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}_{}", prefix, key)
        };

        match value {
            Value::Null => {
                out.insert(full_key, Value::String(String::new()));
            }
            Value::Array(items) => {
                let joined = items.iter().map(element_text).collect::<Vec<_>>().join("\n");
                out.insert(full_key, Value::String(joined));
            }
            Value::Object(nested) => flatten_into(nested, &full_key, out),
            scalar => {
                out.insert(full_key, scalar.clone());
            }
        }
    }
}

/// Text for one array element: strings raw, null empty, nested arrays
/// comma-joined, objects as compact JSON
fn element_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(element_text).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flatten(value: Value) -> Value {
        Value::Object(flatten_for_csv(value.as_object().unwrap()))
    }

    #[test]
    fn test_nested_objects_use_prefixed_keys() {
        let flat = flatten(json!({
            "Lage": {"Ort": "Berlin", "Details": {"Etage": 3}},
            "Kaufpreis": 350000,
            "Provision": true
        }));
        assert_eq!(
            flat,
            json!({
                "Lage_Ort": "Berlin",
                "Lage_Details_Etage": 3,
                "Kaufpreis": 350000,
                "Provision": true
            })
        );
    }

    #[test]
    fn test_null_and_arrays() {
        let flat = flatten(json!({
            "Hinweis": null,
            "AGB": ["1. Erste Klausel", "2. Zweite Klausel"],
            "Mixed": [1, null, "x", [2, 3], {"k": "v"}]
        }));
        assert_eq!(flat["Hinweis"], "");
        assert_eq!(flat["AGB"], "1. Erste Klausel\n2. Zweite Klausel");
        assert_eq!(flat["Mixed"], "1\n\nx\n2,3\n{\"k\":\"v\"}");
    }

    #[test]
    fn test_later_writes_win() {
        let flat = flatten(json!({"a_b": "first", "a": {"b": "second"}}));
        assert_eq!(flat, json!({"a_b": "second"}));
    }

    #[test]
    fn test_output_is_flat_and_idempotent() {
        let input = json!({
            "document_info": {"total_chunks": 2, "processing_note": "n"},
            "chunks": [{"a": 1}, {"a": 2}],
            "merged_data": {"a": 1, "a_chunk_2": 2, "list": [], "empty": {}}
        });
        let once = flatten_for_csv(input.as_object().unwrap());
        assert!(once.values().all(|v| !v.is_array() && !v.is_object() && !v.is_null()));

        let twice = flatten_for_csv(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_deep_nesting_is_flat_and_idempotent() {
        let mut value = json!({"leaf": "bottom", "tail": [null, {"x": 1}]});
        for depth in (0..50).rev() {
            let mut level = Map::new();
            level.insert(format!("k{}", depth), value);
            if depth % 10 == 0 {
                level.insert(format!("list{}", depth), json!([depth, [depth, "n"], {"d": depth}]));
            }
            if depth % 7 == 0 {
                level.insert(format!("empty{}", depth), json!({}));
                level.insert(format!("none{}", depth), Value::Null);
            }
            value = Value::Object(level);
        }

        let once = flatten_for_csv(value.as_object().unwrap());
        assert!(!once.is_empty());
        assert!(once.values().all(|v| v.is_string() || v.is_number() || v.is_boolean()));

        let deepest: String = (0..50).map(|d| format!("k{}_", d)).collect::<String>() + "leaf";
        assert_eq!(once[&deepest], "bottom");
        assert_eq!(once["k0_k1_k2_k3_k4_k5_k6_k7_k8_k9_list10"], "10\n10,n\n{\"d\":10}");

        let twice = flatten_for_csv(&once);
        assert_eq!(once, twice);
    }
}
