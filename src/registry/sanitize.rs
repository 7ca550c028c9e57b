//! Input-schema sanitization
//!
//! The host's schema validator rejects the JSON Schema composition keywords
//! `allOf`, `oneOf` and `anyOf`, so backend schemas are flattened before
//! they reach the registry. The flattening is deliberately lossy: `allOf`
//! sub-schemas are merged rather than intersected, and for `oneOf`/`anyOf`
//! only the first variant survives. That approximation is accepted; the
//! alternative is a tool the host refuses to load at all.

use serde_json::{Map, Value};
use std::collections::HashSet;

/// Sanitize a schema node recursively, removing composition keywords
pub fn sanitize_schema(schema: Value) -> Value {
    match schema {
        Value::Object(node) => Value::Object(sanitize_object(node)),
        other => other,
    }
}

fn sanitize_object(mut node: Map<String, Value>) -> Map<String, Value> {
    // allOf: merge every sub-schema into the parent, then default the type
    if let Some(Value::Array(subs)) = node.remove("allOf") {
        for sub in subs {
            if let Value::Object(sub) = sub {
                merge_sub_schema(&mut node, sub);
            }
        }
        node.entry("type".to_string())
            .or_insert_with(|| Value::String("object".to_string()));
    }

    // oneOf/anyOf: only the first variant survives
    for keyword in ["oneOf", "anyOf"] {
        if let Some(Value::Array(mut variants)) = node.remove(keyword) {
            if !variants.is_empty() {
                if let Value::Object(first) = variants.swap_remove(0) {
                    merge_sub_schema(&mut node, first);
                }
            }
        }
    }

    // Recurse into nested property schemas
    if let Some(Value::Object(properties)) = node.get_mut("properties") {
        let keys: Vec<String> = properties.keys().cloned().collect();
        for key in keys {
            if let Some(child) = properties.remove(&key) {
                properties.insert(key, sanitize_schema(child));
            }
        }
    }

    node
}

/// Merge one sub-schema's properties into the parent and union the required
/// sets. Later entries win on a property-name clash.
fn merge_sub_schema(parent: &mut Map<String, Value>, mut sub: Map<String, Value>) {
    if let Some(Value::Object(sub_props)) = sub.remove("properties") {
        if !matches!(parent.get("properties"), Some(Value::Object(_))) {
            parent.insert("properties".to_string(), Value::Object(Map::new()));
        }
        if let Some(Value::Object(parent_props)) = parent.get_mut("properties") {
            for (key, value) in sub_props {
                parent_props.insert(key, value);
            }
        }
    }

    if let Some(Value::Array(sub_required)) = sub.remove("required") {
        let existing = match parent.remove("required") {
            Some(Value::Array(existing)) => existing,
            _ => Vec::new(),
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut merged: Vec<Value> = Vec::new();
        for value in existing.into_iter().chain(sub_required) {
            if let Value::String(name) = &value {
                if seen.insert(name.clone()) {
                    merged.push(value);
                }
            }
        }
        parent.insert("required".to_string(), Value::Array(merged));
    }
}
