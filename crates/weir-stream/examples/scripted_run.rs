//! Demultiplex a scripted runtime session.
//!
//! Run with:
//! ```bash
//! cargo run --example scripted_run
//! ```

use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::{json, Value};
use weir_contract::{GraphRuntime, RuntimeError, StreamEvent, StreamMode};
use weir_stream::presets;

/// A runtime that replays a canned transcript: a token-streamed answer, a
/// tool call reconstructed from chunks, its result, and an artifact.
struct ScriptedRuntime;

impl GraphRuntime for ScriptedRuntime {
    fn stream(
        &self,
        _input: Value,
        _config: Value,
        modes: &[StreamMode],
    ) -> BoxStream<'static, Result<Value, RuntimeError>> {
        println!("runtime asked for modes: {modes:?}\n");

        let token = |message: Value| json!(["messages", [message, {"namespace": []}]]);
        let elements = vec![
            token(json!({"id": "m1", "type": "ai", "content": "Let me look that up. "})),
            token(json!({
                "id": "m1",
                "type": "ai",
                "content": "",
                "tool_call_chunks": [
                    {"index": 0, "id": "call_1", "name": "search", "args": ""}
                ]
            })),
            token(json!({
                "id": "m1",
                "type": "ai",
                "content": "",
                "tool_call_chunks": [{"index": 0, "args": "{\"query\": \"weir"}]
            })),
            token(json!({
                "id": "m1",
                "type": "ai",
                "content": "",
                "tool_call_chunks": [{"index": 0, "args": "s\"}"}]
            })),
            json!([
                "values",
                {"messages": [{
                    "id": "tr1",
                    "type": "tool",
                    "content": "A weir is a low dam that regulates flow.",
                    "tool_call_id": "call_1",
                    "status": "success"
                }]}
            ]),
            token(json!({"id": "m2", "type": "ai", "content": "A weir regulates river flow."})),
            json!([
                "values",
                {"notes": [{"title": "Weirs", "body": "Low dams that regulate flow."}]}
            ]),
        ];

        futures::stream::iter(elements.into_iter().map(Ok)).boxed()
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weir_stream=debug".into()),
        )
        .init();

    let processor =
        presets::simple_processor(["main"], true).expect("preset configuration is valid");

    let mut events = processor.stream(&ScriptedRuntime, json!({"messages": []}), json!({}));
    while let Some(event) = events.next().await {
        match &event {
            StreamEvent::TokenStream {
                content_delta,
                accumulated_content,
                ..
            } => {
                println!("token   | {content_delta:?} (so far: {accumulated_content:?})");
            }
            StreamEvent::ToolCall {
                status,
                tool_call_id,
                accumulated_args,
                result,
                ..
            } => {
                println!(
                    "tool    | {tool_call_id} {status:?} args={:?} result={}",
                    accumulated_args.as_deref().unwrap_or(""),
                    result.is_some()
                );
            }
            StreamEvent::Artifact {
                artifact_type,
                payload,
                ..
            } => {
                println!("artifact| {artifact_type}: {payload}");
            }
            other => println!("event   | {}", other.kind_name()),
        }
    }
}
