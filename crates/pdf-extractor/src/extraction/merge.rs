//! Combining per-chunk extraction results

use serde_json::{json, Map, Value};

/// Note attached to every chunked result
pub const PROCESSING_NOTE: &str = "Large document processed in multiple chunks";

/// Whether a merged value counts as unset and may be overwritten
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Entries of an array or object as object fields; array indices become keys
fn spread(value: &Value) -> Map<String, Value> {
    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| (i.to_string(), item.clone()))
            .collect(),
        Value::Object(fields) => fields.clone(),
        _ => Map::new(),
    }
}

fn is_container(value: &Value) -> bool {
    value.is_array() || value.is_object()
}

/// Merge chunk results in order.
///
/// Per key: unset or falsy slots take the incoming value, two arrays are
/// concatenated, two objects are shallow-merged with incoming keys winning,
/// and anything else lands under `<key>_chunk_<n>` (n is 1-based). An array
/// meeting an object is shallow-merged into an object keyed by index.
pub fn merge_chunks(chunks: &[Map<String, Value>]) -> Map<String, Value> {
    let mut merged = Map::new();

    for (index, chunk) in chunks.iter().enumerate() {
        for (key, incoming) in chunk {
            match merged.get_mut(key) {
                None => {
                    merged.insert(key.clone(), incoming.clone());
                }
                Some(existing) if is_falsy(existing) => {
                    *existing = incoming.clone();
                }
                Some(Value::Array(existing)) if incoming.is_array() => {
                    if let Value::Array(items) = incoming {
                        existing.extend(items.iter().cloned());
                    }
                }
                Some(Value::Object(existing)) if incoming.is_object() => {
                    if let Value::Object(fields) = incoming {
                        for (k, v) in fields {
                            existing.insert(k.clone(), v.clone());
                        }
                    }
                }
                Some(existing) if is_container(existing) && is_container(incoming) => {
                    let mut fields = spread(existing);
                    fields.extend(spread(incoming));
                    *existing = Value::Object(fields);
                }
                Some(_) => {
                    merged.insert(format!("{}_chunk_{}", key, index + 1), incoming.clone());
                }
            }
        }
    }

    merged
}

/// Build the result object for a chunked document
pub fn chunk_envelope(chunks: Vec<Map<String, Value>>) -> Map<String, Value> {
    let merged = merge_chunks(&chunks);
    let total = chunks.len();

    let envelope = json!({
        "document_info": {
            "total_chunks": total,
            "processing_note": PROCESSING_NOTE,
        },
        "chunks": chunks,
        "merged_data": merged,
    });

    match envelope {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
