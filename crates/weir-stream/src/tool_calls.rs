//! Tool call lifecycle tracking.
//!
//! Streamed tool calls arrive in pieces: the first chunk carries the call id
//! and tool name, every later chunk carries only an argument fragment and
//! the chunk index. Chunks of one call are linked by `(message_id, index)`.
//! The tracker reconstructs the argument JSON incrementally, watches for the
//! buffer to become structurally complete, and links execution results back
//! to the call by `tool_call_id`, even when the call's start was never
//! observed (e.g. token streaming was disabled for that namespace).

use crate::namespace::split_components;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};
use weir_contract::{
    RuntimeMessage, StreamEvent, ToolCallResult, ToolCallStatus, ToolResultStatus,
};

/// Linkage key for streamed chunks.
type CallKey = (String, u32);

/// Argument-construction phase of one tracked call.
///
/// This tracks how the call's *arguments* came to be, not whether the tool
/// ran; execution outcomes arrive separately through result linkage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgPhase {
    /// First chunk observed, no argument content yet.
    Initializing,
    /// Argument fragments are accumulating.
    Streaming,
    /// Arguments parsed as complete JSON.
    Completed,
    /// The buffer closed structurally but did not parse.
    Error,
    /// Arguments arrived complete on a finalized message; awaiting result.
    ResultPending,
    /// A successful result was linked.
    ResultSuccess,
    /// A failed result was linked.
    ResultError,
}

impl ArgPhase {
    /// Whether argument construction has reached a terminal outcome.
    pub fn is_finalized(&self) -> bool {
        !matches!(self, ArgPhase::Initializing | ArgPhase::Streaming)
    }
}

/// State of one tracked tool call.
#[derive(Debug, Clone)]
pub struct ToolCallState {
    /// Stable call id from the first chunk (or from the result message for
    /// synthetic entries).
    pub tool_call_id: String,
    /// Tool name; absent for synthetic result-only entries.
    pub tool_name: Option<String>,
    /// Id of the message the call arrived on.
    pub message_id: String,
    /// Chunk index of the call within that message.
    pub index: u32,
    /// Namespace the call was observed in.
    pub namespace: String,
    /// Argument text accumulated so far.
    pub accumulated_args: String,
    /// Parsed arguments, once the buffer is valid JSON.
    pub parsed_args: Option<Value>,
    /// Current phase.
    pub phase: ArgPhase,
    /// Parse error description, if construction failed.
    pub error: Option<String>,
    /// Linked execution result, if observed.
    pub result: Option<ToolCallResult>,
    balance: JsonBalance,
}

impl ToolCallState {
    fn new(
        tool_call_id: &str,
        tool_name: Option<&str>,
        message_id: &str,
        index: u32,
        namespace: &str,
    ) -> Self {
        Self {
            tool_call_id: tool_call_id.to_string(),
            tool_name: tool_name.map(str::to_string),
            message_id: message_id.to_string(),
            index,
            namespace: namespace.to_string(),
            accumulated_args: String::new(),
            parsed_args: None,
            phase: ArgPhase::Initializing,
            error: None,
            result: None,
            balance: JsonBalance::default(),
        }
    }
}

/// A finalized call rolled into the tracker's history.
#[derive(Debug, Clone)]
pub struct CompletedToolCall {
    pub id: String,
    pub name: String,
    pub args: Value,
    /// Iteration the call completed in.
    pub iteration: u32,
}

/// Tracks tool call lifecycle across one streaming session.
#[derive(Debug, Default)]
pub struct ToolCallTracker {
    /// All tracked calls, keyed by `(message_id, index)`.
    calls: HashMap<CallKey, ToolCallState>,
    /// Fast lookup from call id to linkage key, for result messages.
    by_id: HashMap<String, CallKey>,
    /// Calls completed in the current iteration.
    completed: Vec<CallKey>,
    /// Completed calls from earlier iterations.
    history: Vec<CompletedToolCall>,
    iteration: u32,
}

impl ToolCallTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process the tool call chunks of a streamed message.
    ///
    /// The first chunk of a call (carrying id and name) registers it and
    /// yields an `args_started` event; argument fragments yield
    /// `args_streaming`, and the fragment that closes the JSON structurally
    /// yields `args_ready` (or `result_error` when the closed buffer does
    /// not parse). Fragments without a registered call are dropped with a
    /// warning.
    pub fn handle_stream_chunks(
        &mut self,
        message: &RuntimeMessage,
        namespace: &str,
    ) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        let Some(message_id) = message.id.as_deref() else {
            warn!("tool call chunks arrived on a message without an id; dropping");
            return events;
        };

        for (position, chunk) in message.tool_call_chunks.iter().enumerate() {
            let index = chunk.index.unwrap_or(position as u32);
            let key = (message_id.to_string(), index);

            if let (Some(call_id), Some(name)) = (chunk.id.as_deref(), chunk.name.as_deref()) {
                // First chunk: complete metadata.
                let state = ToolCallState::new(call_id, Some(name), message_id, index, namespace);
                debug!(call_id, name, message_id, index, "tool call initialized");
                self.by_id.insert(call_id.to_string(), key.clone());
                events.push(tool_call_event(
                    &state,
                    ToolCallStatus::ArgsStarted,
                    None,
                    None,
                    None,
                    None,
                    None,
                ));
                self.calls.insert(key.clone(), state);

                if let Some(args) = chunk.args.as_deref() {
                    if !args.is_empty() {
                        events.extend(self.feed_fragment(&key, args));
                    }
                }
                continue;
            }

            // Argument fragment: must link to a registered call.
            let Some(state) = self.calls.get(&key) else {
                warn!(
                    message_id,
                    index, "argument fragment without a registered tool call; ignoring"
                );
                continue;
            };
            if state.phase.is_finalized() {
                warn!(
                    call_id = %state.tool_call_id,
                    message_id,
                    index,
                    "argument fragment after finalization; ignoring"
                );
                continue;
            }

            let args = chunk.args.as_deref().unwrap_or("");
            if args.is_empty() {
                continue;
            }
            events.extend(self.feed_fragment(&key, args));
        }

        events
    }

    /// Register complete tool calls from a finalized message.
    ///
    /// Arguments are already parsed, so the streaming lifecycle is skipped
    /// and `args_ready` is emitted directly. A call that already finalized
    /// via streaming emits nothing; only its linkage state is refreshed.
    pub fn handle_complete_calls(
        &mut self,
        message: &RuntimeMessage,
        namespace: &str,
    ) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        let message_id = message.id.clone().unwrap_or_default();

        for (position, call) in message.tool_calls.iter().enumerate() {
            let (Some(call_id), Some(name)) = (call.id.as_deref(), call.name.as_deref()) else {
                warn!("finalized tool call without id or name; skipping");
                continue;
            };

            let previous = self
                .by_id
                .get(call_id)
                .and_then(|key| self.calls.get(key))
                .cloned();
            let already_finalized = previous
                .as_ref()
                .is_some_and(|state| state.phase.is_finalized());

            let key = previous
                .as_ref()
                .map(|state| (state.message_id.clone(), state.index))
                .unwrap_or_else(|| (message_id.clone(), position as u32));

            let args_present = !call.args.is_null();
            let mut state =
                ToolCallState::new(call_id, Some(name), &key.0, key.1, namespace);
            state.accumulated_args = if args_present {
                call.args.to_string()
            } else {
                String::new()
            };
            state.parsed_args = args_present.then(|| call.args.clone());
            state.phase = if args_present {
                ArgPhase::ResultPending
            } else {
                ArgPhase::Error
            };
            if let Some(previous) = &previous {
                state.result = previous.result.clone();
                if state.result.is_some() {
                    state.phase = match state.result.as_ref().map(|r| r.status) {
                        Some(ToolResultStatus::Error) => ArgPhase::ResultError,
                        _ => ArgPhase::ResultSuccess,
                    };
                }
            }

            self.by_id.insert(call_id.to_string(), key.clone());
            let emitted_state = state.clone();
            self.calls.insert(key.clone(), state);

            if already_finalized {
                debug!(call_id, "tool call already finalized; skipping emission");
                continue;
            }

            if args_present {
                self.completed.push(key);
                events.push(tool_call_event(
                    &emitted_state,
                    ToolCallStatus::ArgsReady,
                    None,
                    Some(emitted_state.accumulated_args.clone()),
                    emitted_state.parsed_args.clone(),
                    None,
                    None,
                ));
            } else {
                events.push(tool_call_event(
                    &emitted_state,
                    ToolCallStatus::ResultError,
                    None,
                    None,
                    None,
                    None,
                    Some("finalized tool call carries no arguments".to_string()),
                ));
            }
        }

        events
    }

    /// Link a tool execution result back to its call.
    ///
    /// When no call state exists (streaming was disabled for that
    /// namespace), a synthetic entry is created so the result is still
    /// surfaced; its event carries no tool name unless the result message
    /// names one.
    pub fn handle_result(
        &mut self,
        message: &RuntimeMessage,
        namespace: &str,
    ) -> Vec<StreamEvent> {
        let Some(call_id) = message.tool_call_id.as_deref() else {
            return Vec::new();
        };

        if let Some(state) = self.by_id.get(call_id).and_then(|key| self.calls.get(key)) {
            if state.result.is_some() {
                warn!(call_id, "tool call result already processed; ignoring");
                return Vec::new();
            }
        }

        let key = match self.by_id.get(call_id) {
            Some(key) => key.clone(),
            None => {
                warn!(
                    call_id,
                    "result for an unobserved tool call; creating synthetic entry"
                );
                let key = (message.id.clone().unwrap_or_default(), 0);
                let mut state = ToolCallState::new(
                    call_id,
                    message.name.as_deref(),
                    &key.0,
                    key.1,
                    namespace,
                );
                state.phase = ArgPhase::ResultPending;
                self.by_id.insert(call_id.to_string(), key.clone());
                self.calls.insert(key.clone(), state);
                key
            }
        };

        let status = message.status.unwrap_or(ToolResultStatus::Success);
        let result = ToolCallResult {
            content: message.content.clone().unwrap_or(Value::Null),
            artifact: message.artifact.clone(),
            status,
        };

        let Some(state) = self.calls.get_mut(&key) else {
            return Vec::new();
        };
        state.result = Some(result.clone());
        state.phase = match status {
            ToolResultStatus::Success => ArgPhase::ResultSuccess,
            ToolResultStatus::Error => ArgPhase::ResultError,
        };

        let event_status = match status {
            ToolResultStatus::Success => ToolCallStatus::ResultSuccess,
            ToolResultStatus::Error => ToolCallStatus::ResultError,
        };
        let error = match status {
            ToolResultStatus::Error => Some(
                message
                    .content_text()
                    .unwrap_or_else(|| "tool execution failed".to_string()),
            ),
            ToolResultStatus::Success => None,
        };

        vec![tool_call_event(
            state,
            event_status,
            None,
            None,
            state.parsed_args.clone(),
            Some(result),
            error,
        )]
    }

    /// Append one argument fragment and run the completion check.
    fn feed_fragment(&mut self, key: &CallKey, fragment: &str) -> Vec<StreamEvent> {
        let Some(state) = self.calls.get_mut(key) else {
            return Vec::new();
        };

        state.phase = ArgPhase::Streaming;
        state.accumulated_args.push_str(fragment);
        state.balance.feed(fragment);

        let mut events = vec![tool_call_event(
            state,
            ToolCallStatus::ArgsStreaming,
            Some(fragment.to_string()),
            Some(state.accumulated_args.clone()),
            None,
            None,
            None,
        )];

        if !state.accumulated_args.trim().is_empty() && state.balance.is_closed() {
            match serde_json::from_str::<Value>(&state.accumulated_args) {
                Ok(parsed) => {
                    state.parsed_args = Some(parsed.clone());
                    state.phase = ArgPhase::Completed;
                    debug!(call_id = %state.tool_call_id, "tool call arguments ready");
                    events.push(tool_call_event(
                        state,
                        ToolCallStatus::ArgsReady,
                        None,
                        Some(state.accumulated_args.clone()),
                        Some(parsed),
                        None,
                        None,
                    ));
                    self.completed.push(key.clone());
                }
                Err(parse_err) => {
                    let description = format!("invalid tool call arguments: {parse_err}");
                    state.phase = ArgPhase::Error;
                    state.error = Some(description.clone());
                    warn!(
                        call_id = %state.tool_call_id,
                        accumulated = %state.accumulated_args,
                        "tool call arguments closed but failed to parse"
                    );
                    events.push(tool_call_event(
                        state,
                        ToolCallStatus::ResultError,
                        None,
                        Some(state.accumulated_args.clone()),
                        None,
                        None,
                        Some(description),
                    ));
                }
            }
        }

        events
    }

    /// Calls still accumulating arguments.
    pub fn active_calls(&self) -> Vec<&ToolCallState> {
        self.calls
            .values()
            .filter(|state| !state.phase.is_finalized())
            .collect()
    }

    /// Calls completed in the current iteration.
    pub fn completed_calls(&self) -> Vec<&ToolCallState> {
        self.completed
            .iter()
            .filter_map(|key| self.calls.get(key))
            .collect()
    }

    /// All completed calls, including earlier iterations.
    pub fn completed_history(&self) -> Vec<CompletedToolCall> {
        let mut all = self.history.clone();
        all.extend(self.current_completed_summaries());
        all
    }

    /// Roll the current iteration's completed calls into history.
    pub fn start_new_iteration(&mut self) {
        let summaries = self.current_completed_summaries();
        self.history.extend(summaries);
        self.completed.clear();
        self.iteration += 1;
        debug!(iteration = self.iteration, "started tool call iteration");
    }

    /// Whether a call with this id has been observed.
    pub fn has_call(&self, tool_call_id: &str) -> bool {
        self.by_id.contains_key(tool_call_id)
    }

    /// Drop all tracked state.
    pub fn reset(&mut self) {
        self.calls.clear();
        self.by_id.clear();
        self.completed.clear();
        self.history.clear();
        self.iteration = 0;
    }

    /// Whether the tracker holds no state.
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.by_id.is_empty() && self.history.is_empty()
    }

    fn current_completed_summaries(&self) -> Vec<CompletedToolCall> {
        self.completed
            .iter()
            .filter_map(|key| self.calls.get(key))
            .filter_map(|state| {
                let args = state.parsed_args.clone()?;
                Some(CompletedToolCall {
                    id: state.tool_call_id.clone(),
                    name: state.tool_name.clone().unwrap_or_default(),
                    args,
                    iteration: self.iteration,
                })
            })
            .collect()
    }
}

/// Build a `ToolCall` event from tracked state.
fn tool_call_event(
    state: &ToolCallState,
    status: ToolCallStatus,
    args_delta: Option<String>,
    accumulated_args: Option<String>,
    parsed_args: Option<Value>,
    result: Option<ToolCallResult>,
    error: Option<String>,
) -> StreamEvent {
    let (node_name, task_id) = split_components(&state.namespace);
    StreamEvent::ToolCall {
        namespace: state.namespace.clone(),
        node_name,
        task_id,
        tool_call_id: state.tool_call_id.clone(),
        tool_name: state.tool_name.clone(),
        message_id: state.message_id.clone(),
        index: state.index,
        status,
        args_delta,
        accumulated_args,
        parsed_args,
        result,
        error,
    }
}

/// Structural balance of a JSON buffer under construction.
///
/// Counts brace and bracket depth outside string literals, honoring escape
/// sequences, so a strict parse is only attempted once the buffer could
/// plausibly be complete.
#[derive(Debug, Clone, Default)]
struct JsonBalance {
    depth: i64,
    in_string: bool,
    escaped: bool,
    seen_content: bool,
}

impl JsonBalance {
    fn feed(&mut self, fragment: &str) {
        for c in fragment.chars() {
            if !c.is_whitespace() {
                self.seen_content = true;
            }
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if c == '\\' {
                    self.escaped = true;
                } else if c == '"' {
                    self.in_string = false;
                }
                continue;
            }
            match c {
                '"' => self.in_string = true,
                '{' | '[' => self.depth += 1,
                '}' | ']' => self.depth -= 1,
                _ => {}
            }
        }
    }

    /// Whether the buffer is structurally closed.
    fn is_closed(&self) -> bool {
        self.seen_content && self.depth <= 0 && !self.in_string
    }
}
