//! Processor configuration: monitored channels and token streaming.
//!
//! Configuration is immutable after construction and validated up front, so
//! a constructed processor can never hit a configuration fault mid-stream.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Display name reserved for the root scope (the empty namespace).
pub const ROOT_NAMESPACE: &str = "main";

/// Sentinel pattern enabling token streaming from every namespace.
pub const ALL_NAMESPACES: &str = "all";

/// How a channel's values are delivered by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Full state snapshot after each step; the processor diffs.
    FullValue,
    /// Runtime-computed deltas only; no previous-state tracking.
    DeltaOnly,
}

/// Semantics of a monitored channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// The channel holds message objects; whole messages are emitted with
    /// dedup and tool-call integration.
    Message,
    /// The channel holds presentation-oriented artifacts; values are
    /// emitted as typed artifact events.
    Artifact,
    /// Any other channel; values and deltas are emitted as-is.
    Generic,
}

/// Predicate deciding whether a channel value is emitted.
pub type ValueFilter = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Configuration for one monitored state channel.
#[derive(Clone)]
pub struct ChannelConfig {
    key: String,
    delivery: DeliveryMode,
    kind: ChannelKind,
    artifact_type: Option<String>,
    filter: Option<ValueFilter>,
}

impl ChannelConfig {
    /// Monitor a generic channel with full-value delivery.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigError::EmptyChannelKey);
        }
        Ok(Self {
            key,
            delivery: DeliveryMode::FullValue,
            kind: ChannelKind::Generic,
            artifact_type: None,
            filter: None,
        })
    }

    /// Monitor a message channel with full-value delivery.
    pub fn message(key: impl Into<String>) -> Result<Self, ConfigError> {
        let mut config = Self::new(key)?;
        config.kind = ChannelKind::Message;
        Ok(config)
    }

    /// Monitor an artifact channel. The artifact type tags every emitted
    /// artifact event for downstream display.
    pub fn artifact(
        key: impl Into<String>,
        artifact_type: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::new(key)?;
        let artifact_type = artifact_type.into();
        if artifact_type.is_empty() {
            return Err(ConfigError::missing_artifact_type(config.key));
        }
        config.kind = ChannelKind::Artifact;
        config.artifact_type = Some(artifact_type);
        Ok(config)
    }

    /// Switch this channel to delta-only delivery.
    pub fn with_delivery(mut self, delivery: DeliveryMode) -> Self {
        self.delivery = delivery;
        self
    }

    /// Attach a value filter. Values failing the predicate are dropped
    /// before any event is emitted.
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// The monitored state key.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// How this channel's values are delivered.
    #[inline]
    pub fn delivery(&self) -> DeliveryMode {
        self.delivery
    }

    /// Channel semantics.
    #[inline]
    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Artifact type tag, for artifact channels.
    #[inline]
    pub fn artifact_type(&self) -> Option<&str> {
        self.artifact_type.as_deref()
    }

    /// Apply the configured filter. Values pass when no filter is set.
    pub fn accepts(&self, value: &Value) -> bool {
        match &self.filter {
            Some(filter) => filter(value),
            None => true,
        }
    }
}

impl fmt::Debug for ChannelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelConfig")
            .field("key", &self.key)
            .field("delivery", &self.delivery)
            .field("kind", &self.kind)
            .field("artifact_type", &self.artifact_type)
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

/// Configuration for token-by-token streaming from namespaces.
///
/// Enablement is pattern-based: patterns are matched against the namespace
/// pattern (the node-name components of the scope). Exclusion always wins
/// over enablement, and the [`ALL_NAMESPACES`] sentinel enables everything
/// not explicitly excluded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenStreamingConfig {
    enabled_namespaces: BTreeSet<String>,
    #[serde(default)]
    excluded_namespaces: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message_tags: Option<BTreeSet<String>>,
    #[serde(default)]
    include_tool_calls: bool,
}

impl TokenStreamingConfig {
    /// Enable token streaming for the given namespace patterns.
    pub fn new<I, S>(enabled: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let enabled: BTreeSet<String> = enabled.into_iter().map(Into::into).collect();
        if enabled.is_empty() {
            return Err(ConfigError::NoEnabledNamespaces);
        }
        for pattern in &enabled {
            validate_pattern(pattern)?;
        }
        Ok(Self {
            enabled_namespaces: enabled,
            excluded_namespaces: BTreeSet::new(),
            message_tags: None,
            include_tool_calls: false,
        })
    }

    /// A configuration with token streaming turned off entirely.
    pub fn disabled() -> Self {
        Self {
            enabled_namespaces: BTreeSet::new(),
            excluded_namespaces: BTreeSet::new(),
            message_tags: None,
            include_tool_calls: false,
        }
    }

    /// Exclude namespace patterns. Exclusion wins over enablement.
    pub fn exclude<I, S>(mut self, excluded: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for pattern in excluded {
            let pattern = pattern.into();
            validate_pattern(&pattern)?;
            self.excluded_namespaces.insert(pattern);
        }
        Ok(self)
    }

    /// Only stream messages carrying at least one of these tags.
    pub fn with_message_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.message_tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Enable tool call lifecycle events.
    pub fn with_tool_calls(mut self, include: bool) -> Self {
        self.include_tool_calls = include;
        self
    }

    /// Whether any namespace is enabled for token streaming.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        !self.enabled_namespaces.is_empty()
    }

    /// Enabled namespace patterns, deduplicated.
    #[inline]
    pub fn enabled_namespaces(&self) -> &BTreeSet<String> {
        &self.enabled_namespaces
    }

    /// Excluded namespace patterns, deduplicated.
    #[inline]
    pub fn excluded_namespaces(&self) -> &BTreeSet<String> {
        &self.excluded_namespaces
    }

    /// Configured message tag filter, if any.
    #[inline]
    pub fn message_tags(&self) -> Option<&BTreeSet<String>> {
        self.message_tags.as_ref()
    }

    /// Whether tool call lifecycle events are enabled.
    #[inline]
    pub fn include_tool_calls(&self) -> bool {
        self.include_tool_calls
    }
}

impl Default for TokenStreamingConfig {
    /// Stream from the root namespace only, without tool call events.
    fn default() -> Self {
        Self {
            enabled_namespaces: BTreeSet::from([ROOT_NAMESPACE.to_string()]),
            excluded_namespaces: BTreeSet::new(),
            message_tags: None,
            include_tool_calls: false,
        }
    }
}

/// Validate one namespace pattern: non-empty, no empty segments.
fn validate_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() || pattern.split(':').any(str::is_empty) {
        return Err(ConfigError::malformed_pattern(pattern));
    }
    Ok(())
}
