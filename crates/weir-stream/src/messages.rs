//! Message channel handling with cross-mode deduplication.
//!
//! Message channels hold whole message objects. New messages are found by
//! comparing against the previously observed value, emitted at most once
//! per message id, and their finalized tool calls and tool results are
//! forwarded to the tool call tracker for lifecycle and result linkage.

use crate::namespace::split_components;
use crate::tool_calls::ToolCallTracker;
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;
use weir_contract::{MessageRole, RuntimeMessage, StreamEvent};

/// Process a message channel observation.
///
/// `previous` is the last observed value for this `(namespace, channel)`
/// (absent on the first observation and in update mode, where the payload
/// already holds only new messages). A message that was already streamed
/// token-by-token is never re-emitted as `MessageReceived`; id comparison
/// against `seen_messages` is sufficient.
pub fn handle_message_values(
    namespace: &str,
    current: &Value,
    previous: Option<&Value>,
    tracker: &mut ToolCallTracker,
    seen_messages: &mut HashSet<String>,
) -> Vec<StreamEvent> {
    let mut events = Vec::new();

    for raw in weir_state::new_items(previous, current) {
        let message = match RuntimeMessage::from_value(&raw) {
            Ok(message) => message,
            Err(parse_err) => {
                warn!(%parse_err, "unparseable message on message channel; skipping");
                continue;
            }
        };

        let was_streamed = message
            .id
            .as_ref()
            .is_some_and(|id| seen_messages.contains(id));
        if let Some(id) = &message.id {
            if !was_streamed {
                seen_messages.insert(id.clone());
            }
        }

        match message.role {
            MessageRole::Ai => {
                let has_content = message
                    .content_text()
                    .is_some_and(|content| !content.is_empty());
                if has_content && !was_streamed {
                    let (node_name, task_id) = split_components(namespace);
                    events.push(StreamEvent::MessageReceived {
                        namespace: namespace.to_string(),
                        node_name,
                        task_id,
                        message_id: message.id.clone().unwrap_or_default(),
                        message: raw.clone(),
                        was_streamed,
                        has_tool_calls: !message.tool_calls.is_empty(),
                        tool_call_ids: message.tool_call_ids(),
                        role: message.role,
                    });
                }
                if !message.tool_calls.is_empty() {
                    events.extend(tracker.handle_complete_calls(&message, namespace));
                }
            }
            MessageRole::Tool => {
                events.extend(tracker.handle_result(&message, namespace));
            }
            MessageRole::Human | MessageRole::System => {}
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(
        current: Value,
        previous: Option<Value>,
        seen: &mut HashSet<String>,
    ) -> Vec<StreamEvent> {
        let mut tracker = ToolCallTracker::new();
        handle_message_values("main", &current, previous.as_ref(), &mut tracker, seen)
    }

    #[test]
    fn test_new_message_is_emitted_once() {
        let mut seen = HashSet::new();
        let current = json!([{"id": "m1", "type": "ai", "content": "Hello world!"}]);

        let events = run(current.clone(), None, &mut seen);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind_name(), "message_received");

        // Re-observing the same snapshot adds no new messages.
        let events = run(current.clone(), Some(current), &mut seen);
        assert!(events.is_empty());
    }

    #[test]
    fn test_streamed_message_is_not_reemitted() {
        let mut seen = HashSet::new();
        seen.insert("m1".to_string());

        let events = run(
            json!([{"id": "m1", "type": "ai", "content": "Hello world!"}]),
            None,
            &mut seen,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_only_tail_messages_are_processed() {
        let mut seen = HashSet::new();
        let previous = json!([{"id": "m1", "type": "ai", "content": "one"}]);
        let current = json!([
            {"id": "m1", "type": "ai", "content": "one"},
            {"id": "m2", "type": "ai", "content": "two"}
        ]);

        let events = run(current, Some(previous), &mut seen);
        assert_eq!(events.len(), 1);
        match &events[0] {
            StreamEvent::MessageReceived { message_id, .. } => assert_eq!(message_id, "m2"),
            other => panic!("expected MessageReceived, got {other:?}"),
        }
    }

    #[test]
    fn test_human_messages_are_ignored() {
        let mut seen = HashSet::new();
        let events = run(
            json!([{"id": "u1", "type": "human", "content": "hi"}]),
            None,
            &mut seen,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_tool_result_links_through_tracker() {
        let mut tracker = ToolCallTracker::new();
        let mut seen = HashSet::new();
        let current = json!([{
            "id": "tr1",
            "type": "tool",
            "content": "42",
            "tool_call_id": "c9",
            "status": "success"
        }]);

        let events =
            handle_message_values("main", &current, None, &mut tracker, &mut seen);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind_name(), "tool_call");
        assert!(tracker.has_call("c9"));
    }

    #[test]
    fn test_tool_call_only_message_emits_args_ready_not_received() {
        let mut tracker = ToolCallTracker::new();
        let mut seen = HashSet::new();
        let current = json!([{
            "id": "m3",
            "type": "ai",
            "content": "",
            "tool_calls": [{"id": "c1", "name": "search", "args": {"q": "rust"}}]
        }]);

        let events =
            handle_message_values("main", &current, None, &mut tracker, &mut seen);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind_name(), "tool_call");
    }
}
