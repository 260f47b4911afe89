//! Error types shared across the weir crates.

use thiserror::Error;

/// Errors detected while validating processor configuration.
///
/// All of these are surfaced before a stream is started; a constructed
/// processor never fails with a configuration error mid-stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Two channel configurations share the same key.
    #[error("duplicate channel key: {key}")]
    DuplicateChannelKey {
        /// The offending key.
        key: String,
    },

    /// A channel was configured with an empty key.
    #[error("channel key cannot be empty")]
    EmptyChannelKey,

    /// An artifact channel was configured without an artifact type.
    #[error("artifact channel {key} requires an artifact type")]
    MissingArtifactType {
        /// The channel key missing its type tag.
        key: String,
    },

    /// Token streaming was configured with no enabled namespace patterns.
    #[error("token streaming requires at least one enabled namespace")]
    NoEnabledNamespaces,

    /// A namespace pattern is empty or contains an empty segment.
    #[error("malformed namespace pattern: {pattern:?}")]
    MalformedPattern {
        /// The pattern that failed validation.
        pattern: String,
    },
}

impl ConfigError {
    /// Create a duplicate channel key error.
    #[inline]
    pub fn duplicate_channel_key(key: impl Into<String>) -> Self {
        ConfigError::DuplicateChannelKey { key: key.into() }
    }

    /// Create a missing artifact type error.
    #[inline]
    pub fn missing_artifact_type(key: impl Into<String>) -> Self {
        ConfigError::MissingArtifactType { key: key.into() }
    }

    /// Create a malformed pattern error.
    #[inline]
    pub fn malformed_pattern(pattern: impl Into<String>) -> Self {
        ConfigError::MalformedPattern {
            pattern: pattern.into(),
        }
    }
}

/// Errors produced by the consumed runtime stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The runtime iterator failed mid-stream.
    #[error("runtime stream failure: {message}")]
    Failure {
        /// Human-readable description from the runtime.
        message: String,
    },

    /// The runtime gave up waiting on an operation.
    #[error("runtime timed out: {message}")]
    Timeout {
        /// Human-readable description from the runtime.
        message: String,
    },
}

impl RuntimeError {
    /// Create a stream failure error.
    #[inline]
    pub fn failure(message: impl Into<String>) -> Self {
        RuntimeError::Failure {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    #[inline]
    pub fn timeout(message: impl Into<String>) -> Self {
        RuntimeError::Timeout {
            message: message.into(),
        }
    }
}
