//! The produced event taxonomy.
//!
//! One streaming session yields a single ordered sequence of these events.
//! Every data-bearing variant carries the originating namespace display name
//! and node name so heterogeneous consumers (UIs, telemetry, adapters) can
//! slice the stream per execution scope without extra bookkeeping.

use crate::message::MessageRole;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Demultiplexed streaming events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Token-by-token LLM output from one namespace.
    TokenStream {
        namespace: String,
        node_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
        /// The new content chunk.
        content_delta: String,
        /// Full content accumulated so far for this message.
        accumulated_content: String,
        /// Runtime tags stamped on the message, if any.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tags: Vec<String>,
    },

    /// A monitored channel changed value in a state snapshot.
    ChannelValue {
        namespace: String,
        node_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
        /// The state key being monitored.
        channel: String,
        /// The current value of the channel.
        value: Value,
        /// Change from the previous observation, when one exists.
        #[serde(skip_serializing_if = "Option::is_none")]
        delta: Option<Value>,
    },

    /// A runtime-delivered delta for a monitored channel.
    ChannelUpdate {
        namespace: String,
        /// The node that produced the update.
        node_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
        /// The state key being monitored.
        channel: String,
        /// The delta payload, exactly as delivered.
        update: Value,
    },

    /// A typed artifact observed on a channel.
    ///
    /// Artifacts re-emit on every observation; consumers dedup by artifact
    /// identity.
    Artifact {
        namespace: String,
        node_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
        /// The source channel key.
        channel: String,
        /// Artifact type tag from the channel configuration.
        artifact_type: String,
        /// The artifact content.
        payload: Value,
        /// Change from the previous observation, when one exists.
        #[serde(skip_serializing_if = "Option::is_none")]
        delta: Option<Value>,
        /// True when a previous value of this channel was observed.
        is_update: bool,
    },

    /// A finalized message appeared on a message channel.
    ///
    /// Emitted at most once per message id within a session; messages
    /// already streamed token-by-token are not re-emitted.
    MessageReceived {
        namespace: String,
        node_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
        /// Stable id of the message (empty when the runtime omitted one).
        message_id: String,
        /// The complete message object.
        message: Value,
        /// True when this message was already seen via token streaming.
        was_streamed: bool,
        /// Whether the message carries finalized tool calls.
        has_tool_calls: bool,
        /// Ids of the tool calls carried by the message, if any.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_call_ids: Vec<String>,
        /// Role of the message.
        role: MessageRole,
    },

    /// Tool call lifecycle: argument reconstruction and result linkage.
    ToolCall {
        namespace: String,
        node_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
        /// Stable tool call id from the first chunk.
        tool_call_id: String,
        /// Tool name; absent when only the result was observed.
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_name: Option<String>,
        /// Id of the message carrying the call.
        message_id: String,
        /// Chunk index of the call within the message.
        index: u32,
        status: ToolCallStatus,
        /// The newest argument fragment.
        #[serde(skip_serializing_if = "Option::is_none")]
        args_delta: Option<String>,
        /// All argument text accumulated so far.
        #[serde(skip_serializing_if = "Option::is_none")]
        accumulated_args: Option<String>,
        /// Parsed arguments once the buffer is valid JSON.
        #[serde(skip_serializing_if = "Option::is_none")]
        parsed_args: Option<Value>,
        /// Execution result, once linked.
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<ToolCallResult>,
        /// Error description for failed parses or failed executions.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Terminal error event, emitted once just before the stream ends.
    Error { kind: ErrorKind, message: String },
}

impl StreamEvent {
    /// Short name of the variant, for logging.
    pub fn kind_name(&self) -> &'static str {
        match self {
            StreamEvent::TokenStream { .. } => "token_stream",
            StreamEvent::ChannelValue { .. } => "channel_value",
            StreamEvent::ChannelUpdate { .. } => "channel_update",
            StreamEvent::Artifact { .. } => "artifact",
            StreamEvent::MessageReceived { .. } => "message_received",
            StreamEvent::ToolCall { .. } => "tool_call",
            StreamEvent::Error { .. } => "error",
        }
    }

    /// Namespace display name this event originated from, if any.
    pub fn namespace(&self) -> Option<&str> {
        match self {
            StreamEvent::TokenStream { namespace, .. }
            | StreamEvent::ChannelValue { namespace, .. }
            | StreamEvent::ChannelUpdate { namespace, .. }
            | StreamEvent::Artifact { namespace, .. }
            | StreamEvent::MessageReceived { namespace, .. }
            | StreamEvent::ToolCall { namespace, .. } => Some(namespace),
            StreamEvent::Error { .. } => None,
        }
    }
}

/// Tool call lifecycle stages surfaced to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    /// First chunk observed; id and name are known.
    ArgsStarted,
    /// An argument fragment was appended.
    ArgsStreaming,
    /// Arguments parsed as complete JSON.
    ArgsReady,
    /// The linked tool execution succeeded.
    ResultSuccess,
    /// Argument reconstruction or the linked execution failed.
    ResultError,
}

/// Result payload linked to a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// Result content from the tool message.
    pub content: Value,
    /// Optional artifact attached to the result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Value>,
    /// Whether the execution succeeded.
    pub status: ToolResultStatus,
}

/// Execution outcome carried on a tool result message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolResultStatus {
    Success,
    Error,
}

/// Fault categories surfaced as terminal [`StreamEvent::Error`] events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A raw runtime element matched none of the accepted shapes.
    RawShapeUnknown,
    /// The consumed runtime iterator failed.
    RuntimeFailure,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = StreamEvent::TokenStream {
            namespace: "main".to_string(),
            node_name: "main".to_string(),
            task_id: None,
            message_id: Some("m1".to_string()),
            content_delta: "Hello".to_string(),
            accumulated_content: "Hello".to_string(),
            tags: vec![],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "token_stream");
        assert_eq!(json["content_delta"], "Hello");
        // Absent options are skipped entirely.
        assert!(json.get("task_id").is_none());
    }

    #[test]
    fn test_error_event_round_trip() {
        let event = StreamEvent::Error {
            kind: ErrorKind::RawShapeUnknown,
            message: "triple with non-namespace head".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: StreamEvent = serde_json::from_str(&json).unwrap();
        match back {
            StreamEvent::Error { kind, .. } => assert_eq!(kind, ErrorKind::RawShapeUnknown),
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[test]
    fn test_kind_name_and_namespace() {
        let event = StreamEvent::ChannelValue {
            namespace: "clarify:t1".to_string(),
            node_name: "clarify".to_string(),
            task_id: Some("t1".to_string()),
            channel: "notes".to_string(),
            value: json!([1]),
            delta: None,
        };
        assert_eq!(event.kind_name(), "channel_value");
        assert_eq!(event.namespace(), Some("clarify:t1"));

        let error = StreamEvent::Error {
            kind: ErrorKind::RuntimeFailure,
            message: "boom".to_string(),
        };
        assert_eq!(error.namespace(), None);
    }

    #[test]
    fn test_tool_call_status_wire_names() {
        let json = serde_json::to_value(ToolCallStatus::ArgsReady).unwrap();
        assert_eq!(json, "args_ready");
        let status: ToolCallStatus = serde_json::from_value(json!("result_error")).unwrap();
        assert_eq!(status, ToolCallStatus::ResultError);
    }
}
