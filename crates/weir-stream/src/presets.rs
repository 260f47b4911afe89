//! Preset processor configurations for common setups.
//!
//! Each preset is a pure constructor; nothing is shared between the
//! processors it builds.

use crate::processor::StreamProcessor;
use weir_contract::{ChannelConfig, ConfigError, DeliveryMode, TokenStreamingConfig};

/// The default channel set: a message channel plus the common artifact
/// channels.
pub fn default_channels() -> Result<Vec<ChannelConfig>, ConfigError> {
    Ok(vec![
        ChannelConfig::message("messages")?,
        ChannelConfig::artifact("notes", "Document")?,
        ChannelConfig::artifact("questions", "UserClarification")?,
        ChannelConfig::artifact("artifacts", "GeneratedArtifact")?,
    ])
}

/// A processor with the default channel set and token streaming from the
/// given namespaces.
pub fn simple_processor<I, S>(
    token_namespaces: I,
    include_tool_calls: bool,
) -> Result<StreamProcessor, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    StreamProcessor::new(
        default_channels()?,
        TokenStreamingConfig::new(token_namespaces)?.with_tool_calls(include_tool_calls),
    )
}

/// A lightweight processor monitoring only the message channel.
pub fn message_only_processor<I, S>(
    token_namespaces: I,
    include_tool_calls: bool,
) -> Result<StreamProcessor, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    StreamProcessor::new(
        vec![ChannelConfig::message("messages")?],
        TokenStreamingConfig::new(token_namespaces)?.with_tool_calls(include_tool_calls),
    )
}

/// A processor monitoring the message channel plus caller-named artifact
/// channels, given as `(channel_key, artifact_type)` pairs.
pub fn artifact_processor<I, K, T>(
    artifact_channels: I,
    include_tool_calls: bool,
) -> Result<StreamProcessor, ConfigError>
where
    I: IntoIterator<Item = (K, T)>,
    K: Into<String>,
    T: Into<String>,
{
    let mut channels = vec![ChannelConfig::message("messages")?];
    for (key, artifact_type) in artifact_channels {
        channels.push(ChannelConfig::artifact(key, artifact_type)?);
    }
    StreamProcessor::new(
        channels,
        TokenStreamingConfig::default().with_tool_calls(include_tool_calls),
    )
}

/// A processor tuned for multi-agent graphs: token and tool-call streaming
/// from every agent namespace, with supervisor traffic delivered as deltas.
pub fn multi_agent_processor<I, S>(agent_namespaces: I) -> Result<StreamProcessor, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    StreamProcessor::new(
        vec![
            ChannelConfig::message("messages")?,
            ChannelConfig::message("supervisor_messages")?
                .with_delivery(DeliveryMode::DeltaOnly),
            ChannelConfig::artifact("notes", "Document")?,
            ChannelConfig::artifact("questions", "UserClarification")?,
            ChannelConfig::artifact("artifacts", "GeneratedArtifact")?,
        ],
        TokenStreamingConfig::new(agent_namespaces)?.with_tool_calls(true),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use weir_contract::StreamMode;

    #[test]
    fn test_simple_processor_modes() {
        let processor = simple_processor(["main"], false).unwrap();
        assert_eq!(processor.channels().len(), 4);
        assert_eq!(
            processor.stream_modes(),
            vec![StreamMode::Values, StreamMode::Messages]
        );
    }

    #[test]
    fn test_message_only_processor() {
        let processor = message_only_processor(["main"], true).unwrap();
        assert_eq!(processor.channels().len(), 1);
        assert!(processor.token_streaming().include_tool_calls());
    }

    #[test]
    fn test_artifact_processor_channels() {
        let processor = artifact_processor(
            [("documents", "Document"), ("clarifications", "UserClarification")],
            false,
        )
        .unwrap();
        assert_eq!(processor.channels().len(), 3);
    }

    #[test]
    fn test_multi_agent_processor_requests_all_modes() {
        let processor = multi_agent_processor(["clarify:*", "research:*"]).unwrap();
        assert_eq!(
            processor.stream_modes(),
            vec![
                StreamMode::Values,
                StreamMode::Updates,
                StreamMode::Messages
            ]
        );
    }
}
