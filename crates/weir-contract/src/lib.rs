//! Shared contracts for the weir stream demultiplexer.
//!
//! This crate holds the vocabulary the processor, the runtime and downstream
//! consumers agree on:
//!
//! - **Events** ([`StreamEvent`]): the typed, tagged event taxonomy one
//!   streaming session produces.
//! - **Messages** ([`RuntimeMessage`]): the lenient message and tool-call
//!   shapes the runtime delivers.
//! - **Configuration** ([`ChannelConfig`], [`TokenStreamingConfig`]):
//!   immutable, validated-up-front processor configuration.
//! - **The runtime seam** ([`GraphRuntime`], [`StreamMode`]): the lazy async
//!   producer the processor consumes.
//!
//! No engine logic lives here; see `weir-stream` for the processor itself.

mod config;
mod error;
mod event;
mod message;
mod runtime;

pub use config::{
    ChannelConfig, ChannelKind, DeliveryMode, TokenStreamingConfig, ValueFilter, ALL_NAMESPACES,
    ROOT_NAMESPACE,
};
pub use error::{ConfigError, RuntimeError};
pub use event::{ErrorKind, StreamEvent, ToolCallResult, ToolCallStatus, ToolResultStatus};
pub use message::{CompleteToolCall, MessageRole, RuntimeMessage, TokenMetadata, ToolCallChunk};
pub use runtime::{GraphRuntime, StreamMode};

// Re-export serde_json::Value for convenience
pub use serde_json::Value;
