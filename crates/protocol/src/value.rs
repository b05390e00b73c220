//! Transport-safe values carried in envelope arguments.
//!
//! A [`SerializedValue`] is what the producer's serializer emits: a finite,
//! acyclic tree with no live references. Kinds with no JSON equivalent
//! (big integers, symbols, functions, UI nodes, cycles) have already been
//! replaced by strings.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as Json};

use crate::constants::{ERROR_TYPE_KEY, ERROR_TYPE_MARKER};

/// Largest integer a JSON consumer can hold exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Portable description of an error: the live object never crosses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDescriptor {
    pub name: String,
    pub message: String,
    pub stack: Option<String>,
}

/// One serialized argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum SerializedValue {
    /// The absent value. Encodes as JSON `null`.
    Undefined,
    Null,
    Bool(bool),
    /// Non-finite numbers encode as JSON `null`.
    Number(f64),
    String(String),
    Error(ErrorDescriptor),
    Array(Vec<SerializedValue>),
    /// Keys in insertion order.
    Object(Vec<(String, SerializedValue)>),
}

impl SerializedValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SerializedValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Looks up an object field by key.
    pub fn get(&self, key: &str) -> Option<&SerializedValue> {
        match self {
            SerializedValue::Object(fields) => {
                fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    /// Looks up an array element.
    pub fn at(&self, index: usize) -> Option<&SerializedValue> {
        match self {
            SerializedValue::Array(items) => items.get(index),
            _ => None,
        }
    }

    /// Whether this is `null` or the absent value.
    pub fn is_nullish(&self) -> bool {
        matches!(self, SerializedValue::Null | SerializedValue::Undefined)
    }
}

impl From<&str> for SerializedValue {
    fn from(s: &str) -> Self {
        SerializedValue::String(s.to_owned())
    }
}

impl From<String> for SerializedValue {
    fn from(s: String) -> Self {
        SerializedValue::String(s)
    }
}

impl From<f64> for SerializedValue {
    fn from(n: f64) -> Self {
        SerializedValue::Number(n)
    }
}

impl From<bool> for SerializedValue {
    fn from(b: bool) -> Self {
        SerializedValue::Bool(b)
    }
}

impl From<SerializedValue> for Json {
    fn from(value: SerializedValue) -> Self {
        match value {
            SerializedValue::Undefined | SerializedValue::Null => Json::Null,
            SerializedValue::Bool(b) => Json::Bool(b),
            SerializedValue::Number(n) => number_to_json(n),
            SerializedValue::String(s) => Json::String(s),
            SerializedValue::Error(e) => {
                let mut map = Map::new();
                map.insert(ERROR_TYPE_KEY.into(), Json::String(ERROR_TYPE_MARKER.into()));
                map.insert("name".into(), Json::String(e.name));
                map.insert("message".into(), Json::String(e.message));
                if let Some(stack) = e.stack {
                    map.insert("stack".into(), Json::String(stack));
                }
                Json::Object(map)
            }
            SerializedValue::Array(items) => {
                Json::Array(items.into_iter().map(Json::from).collect())
            }
            SerializedValue::Object(fields) => Json::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Json::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Json> for SerializedValue {
    fn from(json: Json) -> Self {
        match json {
            Json::Null => SerializedValue::Null,
            Json::Bool(b) => SerializedValue::Bool(b),
            Json::Number(n) => SerializedValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => SerializedValue::String(s),
            Json::Array(items) => {
                SerializedValue::Array(items.into_iter().map(SerializedValue::from).collect())
            }
            Json::Object(map) => match error_descriptor(&map) {
                Some(descriptor) => SerializedValue::Error(descriptor),
                None => SerializedValue::Object(
                    map.into_iter()
                        .map(|(k, v)| (k, SerializedValue::from(v)))
                        .collect(),
                ),
            },
        }
    }
}

/// Encodes a number the way a JSON text encoder in the browser would:
/// integral values without a fraction, non-finite values as `null`.
fn number_to_json(n: f64) -> Json {
    if !n.is_finite() {
        return Json::Null;
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Json::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map(Json::Number).unwrap_or(Json::Null)
}

/// Recognises the `{"__type":"Error", ...}` record shape.
///
/// Only an exact record qualifies: string `name` and `message`, an optional
/// string `stack`, and no other keys. Anything else stays a plain object.
fn error_descriptor(map: &Map<String, Json>) -> Option<ErrorDescriptor> {
    if map.get(ERROR_TYPE_KEY).and_then(Json::as_str) != Some(ERROR_TYPE_MARKER) {
        return None;
    }
    let known = [ERROR_TYPE_KEY, "name", "message", "stack"];
    if map.keys().any(|k| !known.contains(&k.as_str())) {
        return None;
    }
    let stack = match map.get("stack") {
        None => None,
        Some(Json::String(s)) => Some(s.clone()),
        Some(_) => return None,
    };
    Some(ErrorDescriptor {
        name: map.get("name")?.as_str()?.to_owned(),
        message: map.get("message")?.as_str()?.to_owned(),
        stack,
    })
}
