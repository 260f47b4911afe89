//! The stream processor orchestrator.

use crate::channels::ChannelMonitor;
use crate::parser::{parse_raw_element, RawChunk, RawElement};
use crate::tokens::TokenStreamer;
use crate::tool_calls::ToolCallTracker;
use async_stream::stream;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use weir_contract::{
    ChannelConfig, ConfigError, DeliveryMode, ErrorKind, GraphRuntime, StreamEvent, StreamMode,
    TokenStreamingConfig,
};

/// Demultiplexes one graph invocation's raw output into typed events.
///
/// The processor owns its configuration; all per-session state lives inside
/// the stream returned by [`stream`](Self::stream) and is dropped when that
/// stream ends or is cancelled. One processor serves one session at a time;
/// run concurrent sessions on independent instances.
///
/// Faults never cross the event stream as panics or errors: any internal
/// fault becomes one terminal [`StreamEvent::Error`] followed by a clean
/// end of stream.
#[derive(Debug)]
pub struct StreamProcessor {
    channels: Vec<ChannelConfig>,
    token_streaming: TokenStreamingConfig,
}

impl StreamProcessor {
    /// Build a processor from channel and token-streaming configuration.
    ///
    /// Fails when two channels share a key; per-channel and per-pattern
    /// validation already happened when the configs were constructed.
    pub fn new(
        channels: Vec<ChannelConfig>,
        token_streaming: TokenStreamingConfig,
    ) -> Result<Self, ConfigError> {
        let mut keys = HashSet::new();
        for channel in &channels {
            if !keys.insert(channel.key().to_string()) {
                return Err(ConfigError::duplicate_channel_key(channel.key()));
            }
        }
        Ok(Self {
            channels,
            token_streaming,
        })
    }

    /// The configured channels, in configuration order.
    pub fn channels(&self) -> &[ChannelConfig] {
        &self.channels
    }

    /// The token streaming configuration.
    pub fn token_streaming(&self) -> &TokenStreamingConfig {
        &self.token_streaming
    }

    /// The minimum set of runtime modes this configuration needs.
    pub fn stream_modes(&self) -> Vec<StreamMode> {
        let mut modes = Vec::new();
        if self
            .channels
            .iter()
            .any(|channel| channel.delivery() == DeliveryMode::FullValue)
        {
            modes.push(StreamMode::Values);
        }
        if self
            .channels
            .iter()
            .any(|channel| channel.delivery() == DeliveryMode::DeltaOnly)
        {
            modes.push(StreamMode::Updates);
        }
        if self.token_streaming.is_enabled() {
            modes.push(StreamMode::Messages);
        }
        modes
    }

    /// Stream one graph invocation, yielding typed events lazily.
    ///
    /// The runtime is only pulled when the consumer pulls this stream.
    /// Dropping the stream cancels the invocation and releases all session
    /// state.
    pub fn stream(
        &self,
        runtime: &dyn GraphRuntime,
        input: Value,
        config: Value,
    ) -> BoxStream<'static, StreamEvent> {
        self.stream_inner(runtime, input, config, None)
    }

    /// Like [`stream`](Self::stream), with an external cancellation token.
    ///
    /// Cancellation ends the stream at the next pull boundary without a
    /// terminal event; events already yielded are not retracted.
    pub fn stream_with_cancellation(
        &self,
        runtime: &dyn GraphRuntime,
        input: Value,
        config: Value,
        cancellation: CancellationToken,
    ) -> BoxStream<'static, StreamEvent> {
        self.stream_inner(runtime, input, config, Some(cancellation))
    }

    fn stream_inner(
        &self,
        runtime: &dyn GraphRuntime,
        input: Value,
        config: Value,
        cancellation: Option<CancellationToken>,
    ) -> BoxStream<'static, StreamEvent> {
        let modes = self.stream_modes();
        let raw_stream = runtime.stream(input, config, &modes);
        let channels = self.channels.clone();
        let token_streaming = self.token_streaming.clone();
        debug!(?modes, "starting streaming session");

        Box::pin(stream! {
            let mut session = SessionState::new();
            let mut raw_stream = raw_stream;

            loop {
                let next = match &cancellation {
                    Some(token) => tokio::select! {
                        _ = token.cancelled() => {
                            debug!("session cancelled");
                            break;
                        }
                        element = raw_stream.next() => element,
                    },
                    None => raw_stream.next().await,
                };
                let Some(element) = next else {
                    break;
                };

                match element {
                    Ok(raw) => match parse_raw_element(&raw, &modes) {
                        Ok(parsed) => {
                            for event in session.process(parsed, &channels, &token_streaming) {
                                trace!(event_type = event.kind_name(), "emit event");
                                yield event;
                            }
                        }
                        Err(process_err) => {
                            yield StreamEvent::Error {
                                kind: process_err.error_kind(),
                                message: process_err.to_string(),
                            };
                            break;
                        }
                    },
                    Err(runtime_err) => {
                        yield StreamEvent::Error {
                            kind: ErrorKind::RuntimeFailure,
                            message: runtime_err.to_string(),
                        };
                        break;
                    }
                }
            }

            session.reset();
            debug!("streaming session ended");
        })
    }
}

/// Mutable state of one streaming session.
///
/// Owned by the event stream; reset when the session ends and dropped with
/// the stream on cancellation.
#[derive(Debug, Default)]
struct SessionState {
    monitor: ChannelMonitor,
    streamer: TokenStreamer,
    tracker: ToolCallTracker,
    seen_messages: HashSet<String>,
}

impl SessionState {
    fn new() -> Self {
        Self::default()
    }

    /// Route one normalized element through the matching stage.
    fn process(
        &mut self,
        element: RawElement,
        channels: &[ChannelConfig],
        token_streaming: &TokenStreamingConfig,
    ) -> Vec<StreamEvent> {
        let RawElement {
            namespace,
            mode,
            chunk,
        } = element;
        trace!(%namespace, %mode, "processing chunk");

        match (mode, chunk) {
            (StreamMode::Messages, RawChunk::Message { message, metadata }) => {
                self.streamer.handle(
                    &namespace,
                    &message,
                    &metadata,
                    token_streaming,
                    &mut self.tracker,
                    &mut self.seen_messages,
                )
            }
            (StreamMode::Values, RawChunk::State(chunk)) => self.monitor.handle_snapshot(
                &namespace,
                &chunk,
                channels,
                &mut self.tracker,
                &mut self.seen_messages,
            ),
            (StreamMode::Updates, RawChunk::State(chunk)) => self.monitor.handle_update(
                &namespace,
                &chunk,
                channels,
                &mut self.tracker,
                &mut self.seen_messages,
            ),
            (mode, _) => {
                debug!(%mode, "element payload does not match its mode; ignoring");
                Vec::new()
            }
        }
    }

    /// Drop all session state.
    fn reset(&mut self) {
        self.monitor.reset();
        self.streamer.reset();
        self.tracker.reset();
        self.seen_messages.clear();
    }
}
