//! Shared test support: scripted runtimes and event collection.
#![allow(dead_code)]

use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use std::sync::Mutex;
use weir_contract::{GraphRuntime, RuntimeError, StreamEvent, StreamMode};
use weir_stream::StreamProcessor;

/// A runtime that replays a fixed script of raw elements.
///
/// Records the modes it was asked for so tests can assert mode selection.
pub struct ScriptedRuntime {
    elements: Vec<Result<Value, RuntimeError>>,
    requested_modes: Mutex<Vec<StreamMode>>,
}

impl ScriptedRuntime {
    pub fn new(elements: Vec<Value>) -> Self {
        Self::with_results(elements.into_iter().map(Ok).collect())
    }

    pub fn with_results(elements: Vec<Result<Value, RuntimeError>>) -> Self {
        Self {
            elements,
            requested_modes: Mutex::new(Vec::new()),
        }
    }

    /// The modes requested on the most recent invocation.
    pub fn requested_modes(&self) -> Vec<StreamMode> {
        self.requested_modes.lock().unwrap().clone()
    }
}

impl GraphRuntime for ScriptedRuntime {
    fn stream(
        &self,
        _input: Value,
        _config: Value,
        modes: &[StreamMode],
    ) -> BoxStream<'static, Result<Value, RuntimeError>> {
        *self.requested_modes.lock().unwrap() = modes.to_vec();
        futures::stream::iter(self.elements.clone()).boxed()
    }
}

/// A runtime whose stream never produces an element.
pub struct PendingRuntime;

impl GraphRuntime for PendingRuntime {
    fn stream(
        &self,
        _input: Value,
        _config: Value,
        _modes: &[StreamMode],
    ) -> BoxStream<'static, Result<Value, RuntimeError>> {
        futures::stream::pending().boxed()
    }
}

/// Drive one session to completion and collect every event.
pub async fn collect_events(
    processor: &StreamProcessor,
    runtime: &dyn GraphRuntime,
) -> Vec<StreamEvent> {
    processor
        .stream(runtime, serde_json::json!({}), serde_json::json!({}))
        .collect()
        .await
}

/// Events of one kind, by `kind_name`.
pub fn events_of<'a>(events: &'a [StreamEvent], kind: &str) -> Vec<&'a StreamEvent> {
    events
        .iter()
        .filter(|event| event.kind_name() == kind)
        .collect()
}
