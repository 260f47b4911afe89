//! Channel monitoring over state snapshots and per-node updates.

use crate::messages::handle_message_values;
use crate::namespace::split_components;
use crate::tool_calls::ToolCallTracker;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use weir_contract::{ChannelConfig, ChannelKind, DeliveryMode, StreamEvent};
use weir_state::diff_values;

/// Watches configured channels for changes across namespaces.
///
/// Snapshot mode keeps the last observed value per `(namespace, channel)`
/// and computes deltas locally; update mode passes runtime-computed deltas
/// through without touching previous state. Within one chunk, events come
/// out in channel configuration order.
#[derive(Debug, Default)]
pub struct ChannelMonitor {
    /// `namespace:channel` -> last observed value.
    previous: HashMap<String, Value>,
}

impl ChannelMonitor {
    /// Create an empty monitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a full state snapshot for one namespace.
    ///
    /// Serves only channels with full-value delivery; delta-only channels
    /// are fed by [`handle_update`](Self::handle_update).
    pub fn handle_snapshot(
        &mut self,
        namespace: &str,
        chunk: &Value,
        channels: &[ChannelConfig],
        tracker: &mut ToolCallTracker,
        seen_messages: &mut HashSet<String>,
    ) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        let Some(state) = chunk.as_object() else {
            debug!(namespace, "snapshot chunk is not a state mapping; ignoring");
            return events;
        };

        for config in channels {
            if config.delivery() != DeliveryMode::FullValue {
                continue;
            }
            let Some(current) = state.get(config.key()) else {
                continue;
            };

            let state_key = format!("{namespace}:{}", config.key());
            let previous = self.previous.get(&state_key).cloned();

            // Artifacts re-emit on every observation; other kinds skip
            // unchanged values.
            if previous.as_ref() == Some(current) && config.kind() != ChannelKind::Artifact {
                continue;
            }
            self.previous.insert(state_key, current.clone());

            if !config.accepts(current) {
                debug!(
                    namespace,
                    channel = config.key(),
                    "value rejected by channel filter"
                );
                continue;
            }

            match config.kind() {
                ChannelKind::Message => {
                    events.extend(handle_message_values(
                        namespace,
                        current,
                        previous.as_ref(),
                        tracker,
                        seen_messages,
                    ));
                }
                ChannelKind::Artifact => {
                    if let Some(event) =
                        artifact_event(namespace, config, current, previous.as_ref())
                    {
                        events.push(event);
                    }
                }
                ChannelKind::Generic => {
                    let (node_name, task_id) = split_components(namespace);
                    events.push(StreamEvent::ChannelValue {
                        namespace: namespace.to_string(),
                        node_name,
                        task_id,
                        channel: config.key().to_string(),
                        value: current.clone(),
                        delta: diff_values(previous.as_ref(), current),
                    });
                }
            }
        }

        events
    }

    /// Process a runtime-delivered update chunk for one namespace.
    ///
    /// Update chunks map the producing node to its channel deltas:
    /// `{node_name: {channel: delta}}`.
    pub fn handle_update(
        &mut self,
        namespace: &str,
        chunk: &Value,
        channels: &[ChannelConfig],
        tracker: &mut ToolCallTracker,
        seen_messages: &mut HashSet<String>,
    ) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        let Some(nodes) = chunk.as_object() else {
            debug!(namespace, "update chunk is not a node mapping; ignoring");
            return events;
        };

        for (node_name, update) in nodes {
            let Some(update) = update.as_object() else {
                continue;
            };

            for config in channels {
                if config.delivery() != DeliveryMode::DeltaOnly {
                    continue;
                }
                let Some(delta) = update.get(config.key()) else {
                    continue;
                };
                if !config.accepts(delta) {
                    continue;
                }

                match config.kind() {
                    ChannelKind::Message => {
                        // Updates carry only the newly appended messages.
                        events.extend(handle_message_values(
                            namespace,
                            delta,
                            None,
                            tracker,
                            seen_messages,
                        ));
                    }
                    ChannelKind::Artifact => {
                        if is_empty_value(delta) {
                            continue;
                        }
                        let (_, task_id) = split_components(namespace);
                        events.push(StreamEvent::Artifact {
                            namespace: namespace.to_string(),
                            node_name: node_name.clone(),
                            task_id,
                            channel: config.key().to_string(),
                            artifact_type: config
                                .artifact_type()
                                .unwrap_or_default()
                                .to_string(),
                            payload: delta.clone(),
                            delta: Some(delta.clone()),
                            is_update: true,
                        });
                    }
                    ChannelKind::Generic => {
                        let (_, task_id) = split_components(namespace);
                        events.push(StreamEvent::ChannelUpdate {
                            namespace: namespace.to_string(),
                            node_name: node_name.clone(),
                            task_id,
                            channel: config.key().to_string(),
                            update: delta.clone(),
                        });
                    }
                }
            }
        }

        events
    }

    /// Drop all previous-value state.
    pub fn reset(&mut self) {
        self.previous.clear();
    }

    /// Whether no previous values are held.
    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }
}

/// Build an artifact event for a snapshot observation.
///
/// Artifacts re-emit on every observation by policy; empty payloads are
/// skipped.
fn artifact_event(
    namespace: &str,
    config: &ChannelConfig,
    current: &Value,
    previous: Option<&Value>,
) -> Option<StreamEvent> {
    if is_empty_value(current) {
        return None;
    }
    let (node_name, task_id) = split_components(namespace);
    Some(StreamEvent::Artifact {
        namespace: namespace.to_string(),
        node_name,
        task_id,
        channel: config.key().to_string(),
        artifact_type: config.artifact_type().unwrap_or_default().to_string(),
        payload: current.clone(),
        delta: diff_values(previous, current),
        is_update: previous.is_some(),
    })
}

/// Null, empty string, empty array, empty object.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
