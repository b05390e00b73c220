//! Conversion of runtime values into transport-safe values.
//!
//! [`serialize`] is total. Per kind:
//!
//! | Input | Output |
//! |---|---|
//! | undefined, null, bool, number, string | unchanged |
//! | big integer | decimal text + `n` |
//! | symbol | `Symbol(desc)` |
//! | function | `[Function name]` / `[Function anonymous]` |
//! | error | `{__type, name, message, stack}` record |
//! | UI node (`nodeType` + `nodeName`) | `[NODENAME]`, not descended |
//! | array | elements, recursively |
//! | object | own keys, recursively; failed keys → `[Unserializable]` |
//! | host value | JSON text round-trip, else display text |
//!
//! Arrays and objects are entered into an identity set before descent and
//! are never removed for the rest of the top-level call. A second encounter
//! yields `[Circular]`, whether or not the graph actually cycles: a shared
//! acyclic substructure is written once, then marked. The set holds a
//! reference to every entered value, so an identity cannot be reused by a
//! fresh value (say, one returned by a getter) before the call ends.

use std::collections::HashSet;

use framerelay_protocol::constants::{
    BIGINT_SUFFIX, CIRCULAR_MARKER, DEFAULT_NODE_NAME, UNSERIALIZABLE_MARKER,
};
use framerelay_protocol::{ErrorDescriptor, SerializedValue};

use crate::isolate::{Boundary, isolate};
use crate::value::{HostValue, ObjectRef, RefId, Value};

/// Nesting depth past which values degrade to `[Unserializable]`.
pub const MAX_DEPTH: usize = 256;

/// Identities of the arrays and objects entered during one top-level call.
///
/// Entered values are kept alive for as long as the set lives.
#[derive(Debug, Default)]
pub struct InProgress {
    seen: HashSet<RefId>,
    pinned: Vec<Value>,
}

impl InProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value` under `id`; returns `false` if it was already entered.
    fn enter(&mut self, id: RefId, value: &Value) -> bool {
        if !self.seen.insert(id) {
            return false;
        }
        self.pinned.push(value.clone());
        true
    }

    pub fn contains(&self, id: RefId) -> bool {
        self.seen.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Serializes one value with a fresh in-progress set.
pub fn serialize(value: &Value) -> SerializedValue {
    serialize_with(value, &mut InProgress::new())
}

/// Serializes one value, sharing `in_progress` with earlier calls.
pub fn serialize_with(value: &Value, in_progress: &mut InProgress) -> SerializedValue {
    walk(value, in_progress, 0)
}

fn walk(value: &Value, in_progress: &mut InProgress, depth: usize) -> SerializedValue {
    match value {
        Value::Undefined => SerializedValue::Undefined,
        Value::Null => SerializedValue::Null,
        Value::Bool(b) => SerializedValue::Bool(*b),
        Value::Number(n) => SerializedValue::Number(*n),
        Value::String(s) => SerializedValue::String(s.clone()),
        Value::BigInt(n) => SerializedValue::String(format!("{n}{BIGINT_SUFFIX}")),
        Value::Symbol(_) => SerializedValue::String(value.to_display_string()),
        Value::Function(f) => SerializedValue::String(format!("[Function {}]", f.display_name())),
        Value::Error(e) => SerializedValue::Error(ErrorDescriptor {
            name: e.name.clone(),
            message: e.message.clone(),
            stack: e.stack.clone(),
        }),
        Value::Array(arr) => {
            if !in_progress.enter(arr.id(), value) {
                return circular();
            }
            if depth >= MAX_DEPTH {
                return unserializable();
            }
            SerializedValue::Array(
                arr.snapshot()
                    .iter()
                    .map(|item| walk(item, in_progress, depth + 1))
                    .collect(),
            )
        }
        Value::Object(obj) => {
            if let Some(name) = node_name(obj) {
                return SerializedValue::String(format!("[{name}]"));
            }
            if !in_progress.enter(obj.id(), value) {
                return circular();
            }
            if depth >= MAX_DEPTH {
                return unserializable();
            }
            let mut fields = Vec::new();
            for (key, property) in obj.snapshot() {
                let serialized = isolate(Boundary::Field, || {
                    let v = property.read()?;
                    Ok(walk(&v, in_progress, depth + 1))
                })
                .unwrap_or_else(unserializable);
                fields.push((key, serialized));
            }
            SerializedValue::Object(fields)
        }
        Value::Host(host) => host_copy(host.as_ref()),
    }
}

/// Node name of a UI-node-like object: one that exposes both `nodeType` and
/// `nodeName`. Best-effort structural check, not a type test. Returns `None`
/// when the object does not look like a node or its name cannot be read.
fn node_name(obj: &ObjectRef) -> Option<String> {
    if !(obj.has("nodeType") && obj.has("nodeName")) {
        return None;
    }
    let name = isolate(Boundary::Field, || obj.get("nodeName"))?;
    Some(match name {
        Value::String(s) if !s.is_empty() => s,
        other if other.is_truthy() => other.to_display_string(),
        _ => DEFAULT_NODE_NAME.to_owned(),
    })
}

/// Structural copy through JSON text; display text when that fails.
fn host_copy(host: &dyn HostValue) -> SerializedValue {
    let copied = isolate(Boundary::Field, || host.to_json_text())
        .and_then(|text| serde_json::from_str::<serde_json::Value>(&text).ok());
    match copied {
        Some(json) => SerializedValue::from(json),
        None => isolate(Boundary::Field, || Ok(host.display()))
            .map(SerializedValue::String)
            .unwrap_or_else(unserializable),
    }
}

fn circular() -> SerializedValue {
    SerializedValue::String(CIRCULAR_MARKER.to_owned())
}

fn unserializable() -> SerializedValue {
    SerializedValue::String(UNSERIALIZABLE_MARKER.to_owned())
}
