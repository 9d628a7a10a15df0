//! Argument validation against a function's published JSON schema
//!
//! Only the subset of JSON schema that function specs actually use is
//! checked: `required`, primitive `type` of each declared property and
//! `enum` membership. Undeclared properties pass through untouched.

use super::protocol::{json_type_name, Arguments, FunctionSpec};
use crate::error::PluginError;
use serde_json::Value;

/// Validate decoded arguments against `spec.parameters`
pub fn validate_arguments(spec: &FunctionSpec, args: &Arguments) -> Result<(), PluginError> {
    let schema = &spec.parameters;

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for name in required.iter().filter_map(|n| n.as_str()) {
            match args.get(name) {
                None | Some(Value::Null) => {
                    return Err(PluginError::MissingArgument(name.to_string()))
                }
                _ => {}
            }
        }
    }

    let properties = match schema.get("properties").and_then(|p| p.as_object()) {
        Some(props) => props,
        None => return Ok(()),
    };

    for (name, value) in args.as_map() {
        let Some(property) = properties.get(name) else {
            continue;
        };
        // Optional parameters sent as null are treated as omitted
        if value.is_null() {
            continue;
        }

        if let Some(expected) = property.get("type").and_then(|t| t.as_str()) {
            if !matches_type(expected, value) {
                return Err(PluginError::invalid(
                    name,
                    format!("expected {}, got {}", expected, json_type_name(value)),
                ));
            }
        }

        if let Some(allowed) = property.get("enum").and_then(|e| e.as_array()) {
            if !allowed.contains(value) {
                let options: Vec<String> = allowed
                    .iter()
                    .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                    .collect();
                return Err(PluginError::invalid(
                    name,
                    format!("expected one of {}", options.join(", ")),
                ));
            }
        }
    }

    Ok(())
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        // Unknown type keywords are not ours to enforce
        _ => true,
    }
}
