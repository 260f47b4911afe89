//! Channel monitoring across snapshot and update modes.

mod common;

use common::{collect_events, events_of, ScriptedRuntime};
use serde_json::json;
use weir_contract::{
    ChannelConfig, DeliveryMode, StreamEvent, StreamMode, TokenStreamingConfig,
};
use weir_stream::StreamProcessor;

fn monitor_processor(channels: Vec<ChannelConfig>) -> StreamProcessor {
    StreamProcessor::new(channels, TokenStreamingConfig::disabled()).unwrap()
}

// ============================================================================
// Artifact channels
// ============================================================================

#[tokio::test]
async fn artifacts_reemit_for_identical_snapshots() {
    let runtime = ScriptedRuntime::new(vec![
        json!({"notes": ["d1"]}),
        json!({"notes": ["d1"]}),
    ]);
    let processor = monitor_processor(vec![
        ChannelConfig::artifact("notes", "Document").unwrap()
    ]);

    let events = collect_events(&processor, &runtime).await;
    assert_eq!(events.len(), 2, "re-emission is the documented policy");
    for event in &events {
        match event {
            StreamEvent::Artifact {
                namespace,
                artifact_type,
                payload,
                ..
            } => {
                assert_eq!(namespace, "main");
                assert_eq!(artifact_type, "Document");
                assert_eq!(payload, &json!(["d1"]));
            }
            other => panic!("expected Artifact, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn artifact_growth_carries_the_tail_as_delta() {
    let runtime = ScriptedRuntime::new(vec![
        json!({"notes": ["d1"]}),
        json!({"notes": ["d1", "d2"]}),
    ]);
    let processor = monitor_processor(vec![
        ChannelConfig::artifact("notes", "Document").unwrap()
    ]);

    let events = collect_events(&processor, &runtime).await;
    match &events[1] {
        StreamEvent::Artifact {
            delta, is_update, ..
        } => {
            assert_eq!(delta, &Some(json!(["d2"])));
            assert!(is_update);
        }
        other => panic!("expected Artifact, got {other:?}"),
    }
}

// ============================================================================
// Generic channels
// ============================================================================

#[tokio::test]
async fn channel_value_tracks_the_latest_observation() {
    let runtime = ScriptedRuntime::new(vec![
        json!({"progress": {"step": 1, "total": 3}}),
        json!({"progress": {"step": 2, "total": 3}}),
    ]);
    let processor = monitor_processor(vec![ChannelConfig::new("progress").unwrap()]);

    let events = collect_events(&processor, &runtime).await;
    assert_eq!(events.len(), 2);
    match &events[1] {
        StreamEvent::ChannelValue { value, delta, .. } => {
            assert_eq!(value, &json!({"step": 2, "total": 3}));
            // Object deltas hold only changed keys.
            assert_eq!(delta, &Some(json!({"step": 2})));
        }
        other => panic!("expected ChannelValue, got {other:?}"),
    }
}

#[tokio::test]
async fn unchanged_generic_values_stay_silent() {
    let runtime = ScriptedRuntime::new(vec![
        json!({"progress": 1}),
        json!({"progress": 1}),
        json!({"progress": 2}),
    ]);
    let processor = monitor_processor(vec![ChannelConfig::new("progress").unwrap()]);

    let events = collect_events(&processor, &runtime).await;
    assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn filter_suppresses_all_channel_events() {
    let runtime = ScriptedRuntime::new(vec![
        json!({"progress": 1}),
        json!({"progress": 2}),
        json!({"progress": 3}),
    ]);
    let processor = monitor_processor(vec![ChannelConfig::new("progress")
        .unwrap()
        .with_filter(|_| false)]);

    let events = collect_events(&processor, &runtime).await;
    assert!(events.is_empty(), "a rejecting filter silences the channel");
}

#[tokio::test]
async fn events_preserve_channel_configuration_order() {
    let runtime = ScriptedRuntime::new(vec![json!({
        "alpha": 1,
        "beta": 2,
        "gamma": 3
    })]);
    let processor = monitor_processor(vec![
        ChannelConfig::new("gamma").unwrap(),
        ChannelConfig::new("alpha").unwrap(),
        ChannelConfig::new("beta").unwrap(),
    ]);

    let events = collect_events(&processor, &runtime).await;
    let channels: Vec<&str> = events
        .iter()
        .map(|event| match event {
            StreamEvent::ChannelValue { channel, .. } => channel.as_str(),
            other => panic!("expected ChannelValue, got {other:?}"),
        })
        .collect();
    assert_eq!(channels, vec!["gamma", "alpha", "beta"]);
}

// ============================================================================
// Update mode
// ============================================================================

#[tokio::test]
async fn delta_only_channels_pass_updates_through() {
    let runtime = ScriptedRuntime::new(vec![json!([
        "updates",
        {"writer": {"progress": 0.5}}
    ])]);
    let processor = monitor_processor(vec![ChannelConfig::new("progress")
        .unwrap()
        .with_delivery(DeliveryMode::DeltaOnly)]);
    assert_eq!(processor.stream_modes(), vec![StreamMode::Updates]);

    let events = collect_events(&processor, &runtime).await;
    assert_eq!(events.len(), 1);
    match &events[0] {
        StreamEvent::ChannelUpdate {
            node_name, update, ..
        } => {
            assert_eq!(node_name, "writer");
            assert_eq!(update, &json!(0.5));
        }
        other => panic!("expected ChannelUpdate, got {other:?}"),
    }
}

#[tokio::test]
async fn mixed_deliveries_request_both_modes_and_route_separately() {
    let runtime = ScriptedRuntime::new(vec![
        json!(["values", {"notes": ["d1"], "progress": 0.1}]),
        json!(["updates", {"writer": {"progress": 0.5, "notes": ["ignored"]}}]),
    ]);
    let processor = monitor_processor(vec![
        ChannelConfig::artifact("notes", "Document").unwrap(),
        ChannelConfig::new("progress")
            .unwrap()
            .with_delivery(DeliveryMode::DeltaOnly),
    ]);
    assert_eq!(
        processor.stream_modes(),
        vec![StreamMode::Values, StreamMode::Updates]
    );

    let events = collect_events(&processor, &runtime).await;
    // The snapshot serves only the artifact channel; the update serves only
    // the delta-only channel.
    assert_eq!(events_of(&events, "artifact").len(), 1);
    assert_eq!(events_of(&events, "channel_update").len(), 1);
    assert!(events_of(&events, "channel_value").is_empty());
}

#[tokio::test]
async fn namespaces_keep_independent_previous_state() {
    let runtime = ScriptedRuntime::new(vec![
        json!([["clarify", "t1"], {"progress": 1}]),
        json!([["research", "t2"], {"progress": 1}]),
    ]);
    let processor = monitor_processor(vec![ChannelConfig::new("progress").unwrap()]);

    let events = collect_events(&processor, &runtime).await;
    // The same value is a first observation in each namespace.
    assert_eq!(events.len(), 2);
    let namespaces: Vec<_> = events.iter().filter_map(StreamEvent::namespace).collect();
    assert_eq!(namespaces, vec!["clarify:t1", "research:t2"]);
}
