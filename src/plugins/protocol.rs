//! Plugin protocol definitions
//!
//! Defines the model-facing function specs, the decoded argument bag handed
//! to capabilities, and the host-facing call result.

use crate::error::PluginError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Reserved result key signalling a rich-media payload
pub const DIRECT_RESULT_KEY: &str = "direct_result";

/// Reserved result key signalling a failed call
pub const ERROR_KEY: &str = "error";

/// Function declaration sent to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    /// Dispatch key, unique across active capabilities
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON-schema object describing the parameters
    pub parameters: Value,
}

impl FunctionSpec {
    /// Create a new function spec
    pub fn new(name: &str, description: &str, parameters: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }
}

/// Decoded keyword arguments for a single call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    /// Decode a raw JSON payload; anything but an object is rejected
    pub fn parse(raw: &str) -> Result<Self, PluginError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| PluginError::Decode(format!("invalid JSON arguments: {}", e)))?;

        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(PluginError::Decode(format!(
                "expected a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Get a string parameter; blank strings count as absent
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    /// Get a required string parameter
    pub fn require_str(&self, name: &str) -> Result<&str, PluginError> {
        self.get_str(name)
            .ok_or_else(|| PluginError::MissingArgument(name.to_string()))
    }

    /// Get an integer parameter
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(|v| v.as_i64())
    }

    /// Get a boolean parameter with default
    pub fn get_bool(&self, name: &str, default: bool) -> bool {
        self.0
            .get(name)
            .and_then(|v| v.as_bool())
            .unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Kind of rich-media payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectKind {
    Photo,
    Gif,
    Album,
    Voice,
    Reaction,
}

impl DirectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectKind::Photo => "photo",
            DirectKind::Gif => "gif",
            DirectKind::Album => "album",
            DirectKind::Voice => "voice",
            DirectKind::Reaction => "reaction",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "photo" => Some(DirectKind::Photo),
            "gif" => Some(DirectKind::Gif),
            "album" => Some(DirectKind::Album),
            "voice" => Some(DirectKind::Voice),
            "reaction" => Some(DirectKind::Reaction),
            _ => None,
        }
    }
}

impl fmt::Display for DirectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload carried by a direct result
#[derive(Debug, Clone, PartialEq)]
pub enum DirectPayload {
    /// Raw bytes (image, audio)
    Binary(Vec<u8>),
    /// A URL, file id or emoji
    Text(String),
    /// Several payloads, e.g. an album
    Sequence(Vec<DirectPayload>),
}

impl DirectPayload {
    /// Host-facing JSON; bytes travel as `{"base64": "..."}`
    pub fn to_json(&self) -> Value {
        match self {
            DirectPayload::Binary(bytes) => {
                serde_json::json!({ "base64": BASE64.encode(bytes) })
            }
            DirectPayload::Text(text) => Value::String(text.clone()),
            DirectPayload::Sequence(items) => {
                Value::Array(items.iter().map(DirectPayload::to_json).collect())
            }
        }
    }

    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(DirectPayload::Text(text.clone())),
            Value::Array(items) => items
                .iter()
                .map(DirectPayload::from_json)
                .collect::<Option<Vec<_>>>()
                .map(DirectPayload::Sequence),
            Value::Object(map) => {
                let encoded = map.get("base64")?.as_str()?;
                BASE64.decode(encoded).ok().map(DirectPayload::Binary)
            }
            _ => None,
        }
    }

    /// Total number of raw bytes carried
    pub fn byte_len(&self) -> usize {
        match self {
            DirectPayload::Binary(bytes) => bytes.len(),
            DirectPayload::Text(_) => 0,
            DirectPayload::Sequence(items) => items.iter().map(DirectPayload::byte_len).sum(),
        }
    }
}

/// Rich-media result the host renders directly
#[derive(Debug, Clone, PartialEq)]
pub struct DirectResult {
    pub kind: DirectKind,
    pub payload: DirectPayload,
}

/// Normalized outcome of a function call
#[derive(Debug, Clone, PartialEq)]
pub enum CallResult {
    /// Key/value data to be turned into text
    Structured(Map<String, Value>),
    /// Payload to render directly, bypassing text generation
    Direct(DirectResult),
    /// Human-readable failure message
    Error(String),
}

impl CallResult {
    /// Structured result from a JSON value; non-objects land under `result`
    pub fn structured(value: Value) -> Self {
        match value {
            Value::Object(map) => CallResult::Structured(map),
            other => {
                let mut map = Map::new();
                map.insert("result".to_string(), other);
                CallResult::Structured(map)
            }
        }
    }

    pub fn direct(kind: DirectKind, payload: DirectPayload) -> Self {
        CallResult::Direct(DirectResult { kind, payload })
    }

    pub fn error(message: impl Into<String>) -> Self {
        CallResult::Error(message.into())
    }

    /// Collapse a capability outcome into a result
    pub fn from_outcome(outcome: Result<CallResult, PluginError>) -> Self {
        outcome.unwrap_or_else(CallResult::from)
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, CallResult::Direct(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CallResult::Error(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            CallResult::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Host-facing JSON mapping
    pub fn to_json(&self) -> Value {
        match self {
            CallResult::Structured(map) => Value::Object(map.clone()),
            CallResult::Direct(direct) => serde_json::json!({
                DIRECT_RESULT_KEY: {
                    "kind": direct.kind.as_str(),
                    "value": direct.payload.to_json(),
                }
            }),
            CallResult::Error(message) => serde_json::json!({ ERROR_KEY: message }),
        }
    }

    /// Interpret a host-facing mapping by its reserved keys
    pub fn from_json(value: Value) -> Self {
        let map = match value {
            Value::Object(map) => map,
            other => return CallResult::structured(other),
        };

        if let Some(direct) = map.get(DIRECT_RESULT_KEY) {
            let kind = direct
                .get("kind")
                .and_then(|k| k.as_str())
                .and_then(DirectKind::parse);
            let payload = direct.get("value").and_then(DirectPayload::from_json);
            return match (kind, payload) {
                (Some(kind), Some(payload)) => CallResult::direct(kind, payload),
                _ => CallResult::error("Malformed direct result"),
            };
        }

        if let Some(error) = map.get(ERROR_KEY) {
            let message = match error {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return CallResult::Error(message);
        }

        CallResult::Structured(map)
    }

    /// Text to feed back into the conversation.
    ///
    /// Direct payloads are never rendered; only a placeholder is produced.
    pub fn to_text(&self) -> String {
        match self {
            CallResult::Structured(_) | CallResult::Error(_) => self.to_json().to_string(),
            CallResult::Direct(direct) => format!("[{} sent directly]", direct.kind),
        }
    }
}

impl From<PluginError> for CallResult {
    fn from(e: PluginError) -> Self {
        CallResult::Error(e.to_string())
    }
}

impl Serialize for CallResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CallResult {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(CallResult::from_json)
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
