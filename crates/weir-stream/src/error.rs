//! Internal processing faults.

use thiserror::Error;
use weir_contract::ErrorKind;

/// Faults raised while normalizing raw runtime output.
///
/// These never cross the public event stream as errors; the orchestrator
/// converts them into one terminal `Error` event followed by a clean end.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessError {
    /// A raw element matched none of the accepted output shapes.
    #[error("unrecognized raw output shape: {detail}")]
    UnknownShape {
        /// What the element looked like.
        detail: String,
    },

    /// A raw element named a stream mode this processor does not know.
    #[error("unknown stream mode in raw output: {mode:?}")]
    UnknownMode {
        /// The offending mode name.
        mode: String,
    },
}

impl ProcessError {
    /// Create an unknown shape error.
    #[inline]
    pub fn unknown_shape(detail: impl Into<String>) -> Self {
        ProcessError::UnknownShape {
            detail: detail.into(),
        }
    }

    /// Create an unknown mode error.
    #[inline]
    pub fn unknown_mode(mode: impl Into<String>) -> Self {
        ProcessError::UnknownMode { mode: mode.into() }
    }

    /// The error kind surfaced on the terminal event.
    pub fn error_kind(&self) -> ErrorKind {
        match self {
            ProcessError::UnknownShape { .. } | ProcessError::UnknownMode { .. } => {
                ErrorKind::RawShapeUnknown
            }
        }
    }
}
