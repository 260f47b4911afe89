//! Normalization of raw runtime output.
//!
//! The runtime interleaves elements in several wire shapes depending on
//! which modes were requested and whether subgraphs are active:
//!
//! 1. a bare state chunk (single mode, no subgraphs),
//! 2. a `(mode, chunk)` pair,
//! 3. a `(namespace_tuple, chunk)` pair (single mode with subgraphs),
//! 4. a `(namespace_tuple, mode, chunk)` triple,
//! 5. a `(message, metadata)` pair (single `messages` mode).
//!
//! [`parse_raw_element`] disambiguates structurally and produces a uniform
//! `(namespace, mode, chunk)` element. Anything that matches none of the
//! shapes is a fatal fault for the session.

use crate::error::ProcessError;
use crate::namespace::format_namespace;
use serde_json::Value;
use weir_contract::{RuntimeMessage, StreamMode, ROOT_NAMESPACE};

/// One normalized runtime element.
#[derive(Debug, Clone)]
pub struct RawElement {
    /// Display name of the emitting namespace.
    pub namespace: String,
    /// The stream mode this element belongs to.
    pub mode: StreamMode,
    /// The payload.
    pub chunk: RawChunk,
}

/// Payload of a normalized element.
#[derive(Debug, Clone)]
pub enum RawChunk {
    /// A state mapping (snapshot or per-node update).
    State(Value),
    /// A tokenized message with its metadata.
    Message { message: Value, metadata: Value },
}

/// Normalize one raw runtime element.
///
/// `requested_modes` provides the context needed for the single-mode wire
/// forms, which do not name their mode.
pub fn parse_raw_element(
    raw: &Value,
    requested_modes: &[StreamMode],
) -> Result<RawElement, ProcessError> {
    let (namespace, mode, payload) = match raw {
        Value::Array(items) if items.len() == 2 => {
            let (first, second) = (&items[0], &items[1]);
            if let Some(components) = as_string_sequence(first) {
                // (namespace_tuple, chunk): single-mode form with subgraphs.
                let mode = implied_single_mode(requested_modes);
                (format_namespace(&components), mode, second.clone())
            } else if let Value::String(name) = first {
                let mode = StreamMode::from_wire(name)
                    .ok_or_else(|| ProcessError::unknown_mode(name.clone()))?;
                (ROOT_NAMESPACE.to_string(), mode, second.clone())
            } else if RuntimeMessage::is_message_shaped(first) {
                // (message, metadata): single `messages` mode, no subgraphs.
                (
                    ROOT_NAMESPACE.to_string(),
                    StreamMode::Messages,
                    raw.clone(),
                )
            } else {
                return Err(ProcessError::unknown_shape(shape_of(raw)));
            }
        }
        Value::Array(items) if items.len() == 3 => {
            let components = as_string_sequence(&items[0])
                .ok_or_else(|| ProcessError::unknown_shape(shape_of(raw)))?;
            let mode_name = items[1]
                .as_str()
                .ok_or_else(|| ProcessError::unknown_shape(shape_of(raw)))?;
            let mode = StreamMode::from_wire(mode_name)
                .ok_or_else(|| ProcessError::unknown_mode(mode_name))?;
            (format_namespace(&components), mode, items[2].clone())
        }
        other => {
            // Bare chunk: single mode, no subgraphs.
            let mode = implied_single_mode(requested_modes);
            (ROOT_NAMESPACE.to_string(), mode, other.clone())
        }
    };

    let chunk = match mode {
        StreamMode::Messages => split_message_pair(payload)?,
        StreamMode::Values | StreamMode::Updates => RawChunk::State(payload),
    };

    Ok(RawElement {
        namespace,
        mode,
        chunk,
    })
}

/// The mode implied by a wire form that does not name one.
fn implied_single_mode(requested_modes: &[StreamMode]) -> StreamMode {
    if requested_modes.len() == 1 {
        return requested_modes[0];
    }
    // Ambiguous element under multiple modes; token elements always name
    // or imply theirs, so fall back to the first snapshot-bearing mode.
    requested_modes
        .iter()
        .copied()
        .find(|mode| *mode != StreamMode::Messages)
        .unwrap_or(StreamMode::Values)
}

/// Split a token-mode payload into its `(message, metadata)` halves.
fn split_message_pair(payload: Value) -> Result<RawChunk, ProcessError> {
    let items = match payload {
        Value::Array(items) => items,
        other => {
            return Err(ProcessError::unknown_shape(format!(
                "token element is not a (message, metadata) pair: {}",
                shape_of(&other)
            )))
        }
    };
    match <[Value; 2]>::try_from(items) {
        Ok([message, metadata]) => {
            if !RuntimeMessage::is_message_shaped(&message) {
                return Err(ProcessError::unknown_shape(
                    "token element head is not message-shaped",
                ));
            }
            Ok(RawChunk::Message { message, metadata })
        }
        Err(items) => Err(ProcessError::unknown_shape(format!(
            "token element pair has {} items",
            items.len()
        ))),
    }
}

/// Array whose elements are all strings, as owned components.
fn as_string_sequence(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

/// Compact structural description for error messages.
fn shape_of(value: &Value) -> String {
    match value {
        Value::Array(items) => {
            let heads: Vec<&str> = items.iter().map(type_name).collect();
            format!("array[{}]", heads.join(", "))
        }
        other => type_name(other).to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
