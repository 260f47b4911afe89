//! The consumed runtime seam.

use crate::error::RuntimeError;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Streaming modes a graph runtime can be asked to produce.
///
/// The processor computes the minimum set it needs from its configuration
/// and requests exactly that set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamMode {
    /// Full state snapshot after each step.
    Values,
    /// Per-node state deltas only.
    Updates,
    /// Tokenized messages as `(message, metadata)` pairs.
    Messages,
}

impl StreamMode {
    /// Wire name of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamMode::Values => "values",
            StreamMode::Updates => "updates",
            StreamMode::Messages => "messages",
        }
    }

    /// Parse a wire mode name. Returns `None` for unknown names.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "values" => Some(StreamMode::Values),
            "updates" => Some(StreamMode::Updates),
            "messages" => Some(StreamMode::Messages),
            _ => None,
        }
    }
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A graph execution runtime the processor can stream from.
///
/// The runtime is a lazy async producer: it is only pulled when the consumer
/// pulls the event stream, which gives natural backpressure. Elements are
/// raw JSON values in any of the accepted output shapes; the processor
/// normalizes them.
pub trait GraphRuntime: Send + Sync {
    /// Start one graph invocation.
    ///
    /// `input` is the initial state value, `config` an opaque runtime
    /// configuration value, and `modes` the streaming modes the caller
    /// needs. The returned stream ends when the invocation completes, and
    /// dropping it cancels the invocation.
    fn stream(
        &self,
        input: Value,
        config: Value,
        modes: &[StreamMode],
    ) -> BoxStream<'static, Result<Value, RuntimeError>>;
}
