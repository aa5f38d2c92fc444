//! JSON extraction from CLI output
//!
//! `firebase --json` may print update notices or warnings around the actual
//! payload, so the payload is located as the first balanced top-level
//! `{...}` in the captured text before parsing.

use crate::error::{BootstrapError, Result};
use serde_json::{Map, Value};

/// Return the first balanced top-level `{...}` substring of `text`.
///
/// Braces inside JSON string literals (including escaped quotes) are ignored.
pub fn find_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Locate and parse the JSON object in `text`. `source` names the command for
/// error messages.
pub fn parse_json_object(text: &str, source: &str) -> Result<Value> {
    let raw =
        find_json_object(text).ok_or_else(|| BootstrapError::JsonNotFound(source.to_string()))?;
    Ok(serde_json::from_str(raw)?)
}

/// The response shapes `apps:sdkconfig` is known to produce.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// `{"status": ..., "result": <payload>}`
    Result(Value),
    /// `{"fileName": ..., "sdkConfig": {...}}`
    SdkConfig(Value),
    /// Already the flat config object
    Flat(Map<String, Value>),
    /// Anything else; carries a short description for diagnostics
    Unrecognized(String),
}

impl Envelope {
    /// Classify one layer of a response.
    ///
    /// `result` is checked before `sdkConfig`, and an object that already
    /// carries config keys is flat even if it also has an `sdkConfig` field.
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Object(mut map) => {
                if let Some(inner) = map.remove("result") {
                    Envelope::Result(inner)
                } else if !looks_flat(&map) && map.contains_key("sdkConfig") {
                    Envelope::SdkConfig(map.remove("sdkConfig").unwrap_or(Value::Null))
                } else {
                    Envelope::Flat(map)
                }
            }
            Value::Null => Envelope::Unrecognized("null".to_string()),
            Value::Array(_) => Envelope::Unrecognized("array".to_string()),
            Value::String(_) => Envelope::Unrecognized("string".to_string()),
            Value::Bool(_) => Envelope::Unrecognized("boolean".to_string()),
            Value::Number(_) => Envelope::Unrecognized("number".to_string()),
        }
    }
}

fn looks_flat(map: &Map<String, Value>) -> bool {
    map.contains_key("apiKey") || map.contains_key("appId") || map.contains_key("projectId")
}

/// Unwrap a `result` envelope, then an `sdkConfig` envelope, down to the flat
/// config map.
pub fn unwrap_sdk_config(value: Value) -> Result<Map<String, Value>> {
    let value = match Envelope::classify(value) {
        Envelope::Result(inner) => inner,
        Envelope::SdkConfig(inner) => inner,
        Envelope::Flat(map) => return Ok(map),
        Envelope::Unrecognized(kind) => return Err(unrecognized(&kind)),
    };

    let value = match Envelope::classify(value) {
        Envelope::Result(inner) | Envelope::SdkConfig(inner) => inner,
        Envelope::Flat(map) => return Ok(map),
        Envelope::Unrecognized(kind) => return Err(unrecognized(&kind)),
    };

    match Envelope::classify(value) {
        Envelope::Flat(map) => Ok(map),
        Envelope::Result(_) | Envelope::SdkConfig(_) => Err(unrecognized("nested envelope")),
        Envelope::Unrecognized(kind) => Err(unrecognized(&kind)),
    }
}

fn unrecognized(kind: &str) -> BootstrapError {
    BootstrapError::JsonNotFound(format!("apps:sdkconfig (unexpected {} payload)", kind))
}

/// Return the `result` array of a `firebase --json` listing, or an empty list
/// when the key is missing.
pub fn result_array(value: &Value) -> Vec<Value> {
    value
        .get("result")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}
