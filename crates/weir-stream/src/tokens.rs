//! Token-by-token streaming of LLM output.

use crate::namespace::{format_namespace, should_stream_tokens, split_components};
use crate::tool_calls::ToolCallTracker;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::warn;
use weir_contract::{
    MessageRole, RuntimeMessage, StreamEvent, TokenMetadata, TokenStreamingConfig,
    ROOT_NAMESPACE,
};

/// Streams message content token-by-token from eligible namespaces.
///
/// Content accumulates per `(namespace, task, message)` buffer, so two
/// messages interleaving on the same namespace keep independent
/// accumulated content.
#[derive(Debug, Default)]
pub struct TokenStreamer {
    accumulators: HashMap<String, String>,
}

impl TokenStreamer {
    /// Create an empty streamer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one token-mode `(message, metadata)` element.
    ///
    /// `seen_messages` collects every streamed message id so message
    /// channels can avoid re-emitting finalized messages that were already
    /// delivered token-by-token.
    pub fn handle(
        &mut self,
        parsed_namespace: &str,
        message: &Value,
        metadata: &Value,
        config: &TokenStreamingConfig,
        tracker: &mut ToolCallTracker,
        seen_messages: &mut HashSet<String>,
    ) -> Vec<StreamEvent> {
        let metadata = TokenMetadata::from_value(metadata);
        let namespace = resolve_namespace(parsed_namespace, &metadata);

        if !should_stream_tokens(&namespace, config) {
            return Vec::new();
        }

        if let Some(required_tags) = config.message_tags() {
            if !metadata.tags.iter().any(|tag| required_tags.contains(tag)) {
                return Vec::new();
            }
        }

        let message = match RuntimeMessage::from_value(message) {
            Ok(message) => message,
            Err(parse_err) => {
                warn!(%parse_err, "unparseable token-mode message; skipping");
                return Vec::new();
            }
        };

        if let Some(id) = &message.id {
            seen_messages.insert(id.clone());
        }

        let mut events = Vec::new();

        if config.include_tool_calls() {
            match message.role {
                MessageRole::Ai if message.has_tool_call_data() => {
                    if !message.tool_call_chunks.is_empty() {
                        events.extend(tracker.handle_stream_chunks(&message, &namespace));
                    } else {
                        events.extend(tracker.handle_complete_calls(&message, &namespace));
                    }
                }
                MessageRole::Tool => {
                    events.extend(tracker.handle_result(&message, &namespace));
                }
                _ => {}
            }
        }

        // Content streaming applies to assistant chunks only.
        if message.role == MessageRole::Ai {
            if let Some(content_delta) = message.content_text() {
                if !content_delta.is_empty() {
                    let (node_name, task_id) = split_components(&namespace);
                    let accumulated = self.accumulate(
                        &namespace,
                        task_id.as_deref(),
                        message.id.as_deref(),
                        &content_delta,
                    );
                    events.push(StreamEvent::TokenStream {
                        namespace: namespace.clone(),
                        node_name,
                        task_id,
                        message_id: message.id.clone(),
                        content_delta,
                        accumulated_content: accumulated,
                        tags: metadata.tags,
                    });
                }
            }
        }

        events
    }

    /// Append a delta to its buffer and return the accumulated content.
    fn accumulate(
        &mut self,
        namespace: &str,
        task_id: Option<&str>,
        message_id: Option<&str>,
        delta: &str,
    ) -> String {
        let key = format!(
            "{namespace}:{}:{}",
            task_id.unwrap_or("default"),
            message_id.unwrap_or("anonymous"),
        );
        let buffer = self.accumulators.entry(key).or_default();
        buffer.push_str(delta);
        buffer.clone()
    }

    /// Drop all accumulated content.
    pub fn reset(&mut self) {
        self.accumulators.clear();
    }

    /// Whether no content has accumulated.
    pub fn is_empty(&self) -> bool {
        self.accumulators.is_empty()
    }
}

/// Token-mode namespace resolution: metadata wins when it names a scope,
/// the element wrapper otherwise.
fn resolve_namespace(parsed_namespace: &str, metadata: &TokenMetadata) -> String {
    if !metadata.namespace.is_empty() {
        format_namespace(&metadata.namespace)
    } else if parsed_namespace.is_empty() {
        ROOT_NAMESPACE.to_string()
    } else {
        parsed_namespace.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn handle(
        streamer: &mut TokenStreamer,
        config: &TokenStreamingConfig,
        namespace: &str,
        message: Value,
        metadata: Value,
    ) -> Vec<StreamEvent> {
        let mut tracker = ToolCallTracker::new();
        let mut seen = HashSet::new();
        streamer.handle(namespace, &message, &metadata, config, &mut tracker, &mut seen)
    }

    #[test]
    fn test_content_accumulates_per_message() {
        let mut streamer = TokenStreamer::new();
        let config = TokenStreamingConfig::default();

        for (delta, expected) in [("Hello ", "Hello "), ("world", "Hello world")] {
            let events = handle(
                &mut streamer,
                &config,
                "main",
                json!({"id": "m1", "type": "ai", "content": delta}),
                json!({}),
            );
            assert_eq!(events.len(), 1);
            match &events[0] {
                StreamEvent::TokenStream {
                    accumulated_content,
                    ..
                } => assert_eq!(accumulated_content, expected),
                other => panic!("expected TokenStream, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_interleaved_messages_keep_independent_buffers() {
        let mut streamer = TokenStreamer::new();
        let config = TokenStreamingConfig::default();

        handle(
            &mut streamer,
            &config,
            "main",
            json!({"id": "m1", "type": "ai", "content": "abc"}),
            json!({}),
        );
        let events = handle(
            &mut streamer,
            &config,
            "main",
            json!({"id": "m2", "type": "ai", "content": "xyz"}),
            json!({}),
        );
        match &events[0] {
            StreamEvent::TokenStream {
                accumulated_content,
                ..
            } => assert_eq!(accumulated_content, "xyz"),
            other => panic!("expected TokenStream, got {other:?}"),
        }
    }

    #[test]
    fn test_ineligible_namespace_is_dropped() {
        let mut streamer = TokenStreamer::new();
        let config = TokenStreamingConfig::new(["clarify:*"]).unwrap();

        let events = handle(
            &mut streamer,
            &config,
            "other:t4",
            json!({"id": "m1", "type": "ai", "content": "x"}),
            json!({}),
        );
        assert!(events.is_empty());
        assert!(streamer.is_empty());
    }

    #[test]
    fn test_metadata_namespace_wins() {
        let mut streamer = TokenStreamer::new();
        let config = TokenStreamingConfig::new(["clarify:*"]).unwrap();

        let events = handle(
            &mut streamer,
            &config,
            "main",
            json!({"id": "m1", "type": "ai", "content": "x"}),
            json!({"namespace": ["clarify", "t1"]}),
        );
        assert_eq!(events.len(), 1);
        match &events[0] {
            StreamEvent::TokenStream {
                namespace,
                node_name,
                task_id,
                ..
            } => {
                assert_eq!(namespace, "clarify:t1");
                assert_eq!(node_name, "clarify");
                assert_eq!(task_id.as_deref(), Some("t1"));
            }
            other => panic!("expected TokenStream, got {other:?}"),
        }
    }

    #[test]
    fn test_tag_filter() {
        let mut streamer = TokenStreamer::new();
        let config = TokenStreamingConfig::default().with_message_tags(["agent_a"]);

        let dropped = handle(
            &mut streamer,
            &config,
            "main",
            json!({"id": "m1", "type": "ai", "content": "x"}),
            json!({"tags": ["agent_b"]}),
        );
        assert!(dropped.is_empty());

        let kept = handle(
            &mut streamer,
            &config,
            "main",
            json!({"id": "m1", "type": "ai", "content": "x"}),
            json!({"tags": ["agent_a", "other"]}),
        );
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_empty_content_emits_nothing() {
        let mut streamer = TokenStreamer::new();
        let config = TokenStreamingConfig::default();

        let events = handle(
            &mut streamer,
            &config,
            "main",
            json!({"id": "m1", "type": "ai", "content": ""}),
            json!({}),
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_streamed_ids_are_recorded_even_without_content() {
        let mut streamer = TokenStreamer::new();
        let config = TokenStreamingConfig::default();
        let mut tracker = ToolCallTracker::new();
        let mut seen = HashSet::new();

        streamer.handle(
            "main",
            &json!({"id": "m1", "type": "ai", "content": ""}),
            &json!({}),
            &config,
            &mut tracker,
            &mut seen,
        );
        assert!(seen.contains("m1"));
    }

    #[test]
    fn test_tool_call_chunks_require_opt_in() {
        let mut streamer = TokenStreamer::new();
        let without = TokenStreamingConfig::default();
        let message = json!({
            "id": "m2",
            "type": "ai",
            "content": "",
            "tool_call_chunks": [
                {"index": 0, "id": "c1", "name": "think", "args": ""}
            ]
        });

        let events = handle(&mut streamer, &without, "main", message.clone(), json!({}));
        assert!(events.is_empty());

        let with = TokenStreamingConfig::default().with_tool_calls(true);
        let events = handle(&mut streamer, &with, "main", message, json!({}));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind_name(), "tool_call");
    }
}
