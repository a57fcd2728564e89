//! Testing utilities for the stateup workspace
//!
//! Shared fixtures for stored resource action state.

#![allow(missing_docs)]

use serde_json::{json, Map, Value};
use stateup_value::DynamicValue;

pub const ACTION_TYPE: &str = "Microsoft.Foo/bar@2024-01-01";
pub const ACTION_RESOURCE_ID: &str = "/subscriptions/000/resourceGroups/rg/providers/Microsoft.Foo/bar/foo";

/// Stored version 0 action state
pub fn legacy_action_json() -> Value {
    json!({
        "id": "action-1",
        "type": ACTION_TYPE,
        "resource_id": ACTION_RESOURCE_ID,
        "action": "listKeys",
        "method": null,
        "body": "",
        "when": null,
        "locks": null,
        "response_export_values": ["a"],
        "output": "result",
        "timeouts": null,
    })
}

/// [`legacy_action_json`] with `overrides` merged over it; a null override
/// removes the attribute entirely
pub fn legacy_action_json_with(overrides: Value) -> Value {
    let mut state = legacy_action_json();
    if let (Value::Object(base), Value::Object(overrides)) = (&mut state, overrides) {
        for (key, value) in overrides {
            if value.is_null() {
                base.remove(&key);
            } else {
                base.insert(key, value);
            }
        }
    }
    state
}

pub fn legacy_action_state() -> Vec<u8> {
    to_bytes(&legacy_action_json())
}

pub fn legacy_action_state_with(overrides: Value) -> Vec<u8> {
    to_bytes(&legacy_action_json_with(overrides))
}

/// Document as read by the command line driver
pub fn state_document(version: u64, attributes: Value) -> Value {
    let mut document = Map::new();
    document.insert("schema_version".to_string(), json!(version));
    document.insert("attributes".to_string(), attributes);
    Value::Object(document)
}

/// Persisted form of a dynamic string
pub fn dynamic_string(value: &str) -> Value {
    DynamicValue::string(value).to_persisted()
}

/// Persisted form of a dynamic string list
pub fn dynamic_string_list(items: &[&str]) -> Value {
    DynamicValue::string_list(items.iter().map(|s| Some((*s).to_string())))
        .unwrap()
        .to_persisted()
}

pub fn to_bytes(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap()
}

pub fn from_bytes(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}
