//! Streaming demultiplexer for graph-based agent runtimes.
//!
//! A graph runtime emits interleaved updates in several modes (full state
//! snapshots, per-node deltas, tokenized LLM messages) across a hierarchy
//! of concurrently running namespaces. [`StreamProcessor`] turns
//! that raw, shape-variable firehose into one ordered stream of typed
//! [`StreamEvent`](weir_contract::StreamEvent)s:
//!
//! - **Channel monitoring**: per-namespace diffing of configured state keys,
//!   routed by channel kind (message / artifact / generic).
//! - **Token streaming**: per-namespace, pattern-filtered token deltas with
//!   accumulated content.
//! - **Tool call tracking**: reconstruction of tool call arguments from
//!   chunks linked by `(message_id, index)`, with result linkage.
//!
//! # Quick start
//!
//! ```no_run
//! use weir_contract::{ChannelConfig, GraphRuntime, TokenStreamingConfig};
//! use weir_stream::StreamProcessor;
//! use futures::StreamExt;
//! use serde_json::json;
//!
//! # async fn run(runtime: &dyn GraphRuntime) -> Result<(), weir_contract::ConfigError> {
//! let processor = StreamProcessor::new(
//!     vec![
//!         ChannelConfig::message("messages")?,
//!         ChannelConfig::artifact("notes", "Document")?,
//!     ],
//!     TokenStreamingConfig::new(["main"])?.with_tool_calls(true),
//! )?;
//!
//! let mut events = processor.stream(runtime, json!({"messages": []}), json!({}));
//! while let Some(event) = events.next().await {
//!     println!("{}", event.kind_name());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! One processor instance serves one session at a time; concurrent sessions
//! need independent instances. All session state is dropped when the event
//! stream ends or is cancelled.

mod channels;
mod error;
mod messages;
mod processor;
mod tokens;

pub mod namespace;
pub mod parser;
pub mod presets;
pub mod tool_calls;

pub use channels::ChannelMonitor;
pub use error::ProcessError;
pub use processor::StreamProcessor;
pub use tokens::TokenStreamer;
pub use tool_calls::{ArgPhase, CompletedToolCall, ToolCallState, ToolCallTracker};

pub use weir_contract as contract;
