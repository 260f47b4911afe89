//! Message and tool-call shapes consumed from the runtime.
//!
//! The runtime delivers messages as loosely shaped JSON objects. These types
//! deserialize leniently: unknown fields are ignored and every field is
//! optional on the wire, so partial chunk objects parse the same way as
//! finalized messages.

use crate::event::ToolResultStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message object delivered by the runtime.
///
/// Covers all three shapes the processor meets: token-mode chunks (which may
/// carry `tool_call_chunks`), finalized messages on state channels (which may
/// carry complete `tool_calls`), and tool result messages (which carry a
/// `tool_call_id` plus a result payload).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeMessage {
    /// Stable id minted by the runtime. Used for chunk linkage and dedup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Message role discriminant.
    #[serde(rename = "type", default)]
    pub role: MessageRole,

    /// Content payload. Usually a string; some runtimes deliver block lists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,

    /// Finalized tool calls, present on complete assistant messages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<CompleteToolCall>,

    /// Partial tool call chunks, present on streamed assistant chunks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_call_chunks: Vec<ToolCallChunk>,

    /// The call this message is a result for (tool messages only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Execution outcome (tool messages only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ToolResultStatus>,

    /// Artifact attached to a tool result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Value>,

    /// Name carried on the message (tool results name the tool).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RuntimeMessage {
    /// Deserialize a raw runtime value, tolerating unknown fields.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }

    /// Structural test for message-shaped objects.
    ///
    /// A message object carries an `id` alongside content or a role marker;
    /// plain state mappings do not.
    pub fn is_message_shaped(value: &Value) -> bool {
        match value.as_object() {
            Some(obj) => {
                obj.contains_key("id")
                    && (obj.contains_key("content")
                        || obj.contains_key("type")
                        || obj.contains_key("tool_call_chunks"))
            }
            None => false,
        }
    }

    /// Content rendered as text.
    ///
    /// Strings pass through, nulls are absent, block-structured content is
    /// rendered as its JSON form.
    pub fn content_text(&self) -> Option<String> {
        match &self.content {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }

    /// Whether this message carries any tool call data, partial or complete.
    pub fn has_tool_call_data(&self) -> bool {
        !self.tool_calls.is_empty() || !self.tool_call_chunks.is_empty()
    }

    /// Ids of the finalized tool calls on this message.
    pub fn tool_call_ids(&self) -> Vec<String> {
        self.tool_calls
            .iter()
            .filter_map(|tc| tc.id.clone())
            .collect()
    }
}

/// Role of a runtime message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    Ai,
    Tool,
    Human,
    System,
}

impl Default for MessageRole {
    fn default() -> Self {
        MessageRole::Ai
    }
}

/// A finalized tool call on a complete assistant message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompleteToolCall {
    /// Stable call id. Entries without one are skipped by the tracker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Tool name. Entries without one are skipped by the tracker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Parsed arguments object.
    #[serde(default)]
    pub args: Value,
    /// Call type marker from the runtime, when present.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub call_type: Option<String>,
}

/// A partial piece of a tool call invocation.
///
/// `id` and `name` are non-null only on the first chunk of a
/// `(message_id, index)` sequence; later chunks carry only `index` and an
/// argument fragment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCallChunk {
    /// Chunk index of the call within the enclosing message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Argument text fragment, possibly empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<String>,
    /// Chunk type marker from the runtime, when present.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub chunk_type: Option<String>,
}

/// Metadata stamped on every token-mode element.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Namespace components of the emitting scope; empty means root.
    #[serde(default)]
    pub namespace: Vec<String>,
    /// Runtime tags on the message (used for tag filtering).
    #[serde(default)]
    pub tags: Vec<String>,
}

impl TokenMetadata {
    /// Deserialize metadata leniently; malformed metadata degrades to the
    /// root namespace with no tags.
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}
