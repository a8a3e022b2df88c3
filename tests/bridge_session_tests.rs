//! Bridge Session Tests
//!
//! Drives a [`SessionCoordinator`] over in-memory channels and checks
//! forwarding, ordering, failure isolation and teardown.

mod mock_channels;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use canvas_bridge::core::realtime::openai::ConversationItem;
use canvas_bridge::core::realtime::{ClientEvent, ServerEvent};
use canvas_bridge::errors::ChannelError;
use canvas_bridge::handlers::realtime::{
    BridgeConfig, ClientMessage, SessionCoordinator, SessionOutcome,
};

use mock_channels::*;

struct Harness {
    client: Arc<MockClient>,
    client_io: MockClientHandle,
    upstream: Arc<MockUpstream>,
    upstream_io: MockUpstreamHandle,
    close_log: CloseLog,
    cancel: CancellationToken,
    session: JoinHandle<SessionOutcome>,
}

/// Start a session and consume the configuration handshake.
async fn start_session(config: BridgeConfig) -> Harness {
    let (client, client_io, upstream, mut upstream_io, close_log) = channel_pair();
    let cancel = CancellationToken::new();

    let coordinator = SessionCoordinator::new(Arc::new(config));
    let session = {
        let client = client.clone();
        let upstream = upstream.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { coordinator.run(client, upstream, cancel).await })
    };

    match next_outbound(&mut upstream_io.outbound).await {
        ClientEvent::SessionUpdate { .. } => {}
        other => panic!("Expected session.update first, got {other:?}"),
    }

    Harness {
        client,
        client_io,
        upstream,
        upstream_io,
        close_log,
        cancel,
        session,
    }
}

async fn finish(session: JoinHandle<SessionOutcome>) -> SessionOutcome {
    tokio::time::timeout(Duration::from_secs(3), session)
        .await
        .expect("session did not finish")
        .expect("session task panicked")
}

fn audio(payload: &str) -> ClientMessage {
    ClientMessage::Audio {
        audio: payload.to_string(),
    }
}

fn command_result(call_id: &str, name: &str, output: &str) -> ClientMessage {
    ClientMessage::CommandResult {
        call_id: call_id.to_string(),
        name: name.to_string(),
        output: output.to_string(),
    }
}

fn assert_append(event: ClientEvent, expected: &str) {
    match event {
        ClientEvent::InputAudioBufferAppend { audio } => assert_eq!(audio, expected),
        other => panic!("Expected input_audio_buffer.append, got {other:?}"),
    }
}

fn assert_function_output(event: ClientEvent, expected_call_id: &str, expected_output: &str) {
    match event {
        ClientEvent::ConversationItemCreate {
            item: ConversationItem::FunctionCallOutput { call_id, output },
        } => {
            assert_eq!(call_id, expected_call_id);
            assert_eq!(output, expected_output);
        }
        other => panic!("Expected conversation.item.create, got {other:?}"),
    }
}

#[tokio::test]
async fn test_configuration_sent_before_traffic() {
    let (client, client_io, upstream, mut upstream_io, _log) = channel_pair();

    // Queue audio before the session starts; it must still follow the handshake
    client_io.inbound.send(Ok(audio("QUJD"))).unwrap();

    let coordinator = SessionCoordinator::new(Arc::new(test_bridge_config()));
    let cancel = CancellationToken::new();
    let session = tokio::spawn({
        let client = client.clone();
        let upstream = upstream.clone();
        async move { coordinator.run(client, upstream, cancel).await }
    });

    match next_outbound(&mut upstream_io.outbound).await {
        ClientEvent::SessionUpdate { session } => {
            assert_eq!(session.instructions, "You are a test painter.");
            assert_eq!(session.tools.len(), 3);
            assert_eq!(session.tool_choice.as_deref(), Some("auto"));
        }
        other => panic!("Expected session.update, got {other:?}"),
    }
    assert_append(next_outbound(&mut upstream_io.outbound).await, "QUJD");

    drop(client_io);
    assert!(finish(session).await.is_completed());
}

#[tokio::test]
async fn test_client_audio_forwarded_in_order() {
    let mut h = start_session(test_bridge_config()).await;

    for payload in ["QUJD", "REVG", "R0hJ"] {
        h.client_io.inbound.send(Ok(audio(payload))).unwrap();
    }

    for payload in ["QUJD", "REVG", "R0hJ"] {
        assert_append(next_outbound(&mut h.upstream_io.outbound).await, payload);
    }

    h.cancel.cancel();
    finish(h.session).await;
}

#[tokio::test]
async fn test_audio_delta_forwarded_to_client() {
    let mut h = start_session(test_bridge_config()).await;

    h.upstream_io.inbound.send(Ok(audio_delta("UENN"))).unwrap();

    assert_eq!(
        next_outbound(&mut h.client_io.outbound).await,
        ClientMessage::Audio {
            audio: "UENN".to_string()
        }
    );

    h.cancel.cancel();
    finish(h.session).await;
}

#[tokio::test]
async fn test_function_call_becomes_command_invoke() {
    let mut h = start_session(test_bridge_config()).await;

    h.upstream_io
        .inbound
        .send(Ok(function_call("call_1", "clearCanvas", "{}")))
        .unwrap();

    let invoke = next_outbound(&mut h.client_io.outbound).await;
    assert_eq!(
        invoke,
        ClientMessage::CommandInvoke {
            call_id: "call_1".to_string(),
            name: "clearCanvas".to_string(),
            args: "{}".to_string(),
        }
    );
    assert_eq!(
        invoke.encode().unwrap(),
        r#"{"type":"command.invoke","call_id":"call_1","name":"clearCanvas","args":"{}"}"#
    );

    h.cancel.cancel();
    finish(h.session).await;
}

#[tokio::test]
async fn test_command_result_creates_item_then_response() {
    let mut h = start_session(test_bridge_config()).await;

    h.upstream_io
        .inbound
        .send(Ok(function_call("call_1", "clearCanvas", "{}")))
        .unwrap();
    next_outbound(&mut h.client_io.outbound).await;

    h.client_io
        .inbound
        .send(Ok(command_result("call_1", "clearCanvas", "ok")))
        .unwrap();

    assert_function_output(next_outbound(&mut h.upstream_io.outbound).await, "call_1", "ok");
    assert_eq!(
        next_outbound(&mut h.upstream_io.outbound).await,
        ClientEvent::ResponseCreate
    );

    h.cancel.cancel();
    finish(h.session).await;
}

#[tokio::test]
async fn test_unknown_call_id_dropped_when_strict() {
    let mut h = start_session(test_bridge_config()).await;

    h.client_io
        .inbound
        .send(Ok(command_result("call_404", "paintCanvas", "ok")))
        .unwrap();
    h.client_io.inbound.send(Ok(audio("QUJD"))).unwrap();

    // The result is dropped; the audio behind it still flows
    assert_append(next_outbound(&mut h.upstream_io.outbound).await, "QUJD");

    h.cancel.cancel();
    finish(h.session).await;
}

#[tokio::test]
async fn test_unknown_call_id_forwarded_when_lenient() {
    let mut config = test_bridge_config();
    config.strict_tool_calls = false;
    let mut h = start_session(config).await;

    h.client_io
        .inbound
        .send(Ok(command_result("call_404", "paintCanvas", "done")))
        .unwrap();

    assert_function_output(
        next_outbound(&mut h.upstream_io.outbound).await,
        "call_404",
        "done",
    );
    assert_eq!(
        next_outbound(&mut h.upstream_io.outbound).await,
        ClientEvent::ResponseCreate
    );

    h.cancel.cancel();
    finish(h.session).await;
}

#[tokio::test]
async fn test_result_answers_call_only_once() {
    let mut h = start_session(test_bridge_config()).await;

    h.upstream_io
        .inbound
        .send(Ok(function_call("call_1", "getCanvasSize", "{}")))
        .unwrap();
    next_outbound(&mut h.client_io.outbound).await;

    // A mismatched name is still forwarded for a known call
    h.client_io
        .inbound
        .send(Ok(command_result("call_1", "clearCanvas", "800x600")))
        .unwrap();
    assert_function_output(
        next_outbound(&mut h.upstream_io.outbound).await,
        "call_1",
        "800x600",
    );
    assert_eq!(
        next_outbound(&mut h.upstream_io.outbound).await,
        ClientEvent::ResponseCreate
    );

    // A second result for the same call is no longer pending
    h.client_io
        .inbound
        .send(Ok(command_result("call_1", "getCanvasSize", "800x600")))
        .unwrap();
    assert_no_outbound(&mut h.upstream_io.outbound).await;

    h.cancel.cancel();
    finish(h.session).await;
}

#[tokio::test]
async fn test_send_failure_does_not_stop_pumps() {
    let mut h = start_session(test_bridge_config()).await;

    // Downstream: first append fails, second goes through
    h.upstream.fail_next_sends(1);
    h.client_io.inbound.send(Ok(audio("AAAA"))).unwrap();
    h.client_io.inbound.send(Ok(audio("BBBB"))).unwrap();
    assert_append(next_outbound(&mut h.upstream_io.outbound).await, "BBBB");

    // Upstream: first delta fails, second goes through
    h.client.fail_next_sends(1);
    h.upstream_io.inbound.send(Ok(audio_delta("CCCC"))).unwrap();
    h.upstream_io.inbound.send(Ok(audio_delta("DDDD"))).unwrap();
    assert_eq!(
        next_outbound(&mut h.client_io.outbound).await,
        ClientMessage::Audio {
            audio: "DDDD".to_string()
        }
    );

    h.cancel.cancel();
    finish(h.session).await;
}

#[tokio::test]
async fn test_failed_item_create_still_requests_response() {
    let mut config = test_bridge_config();
    config.strict_tool_calls = false;
    let mut h = start_session(config).await;

    h.upstream.fail_next_sends(1);
    h.client_io
        .inbound
        .send(Ok(command_result("call_1", "clearCanvas", "ok")))
        .unwrap();

    assert_eq!(
        next_outbound(&mut h.upstream_io.outbound).await,
        ClientEvent::ResponseCreate
    );

    h.cancel.cancel();
    finish(h.session).await;
}

#[tokio::test]
async fn test_failed_invoke_is_not_pending() {
    let mut h = start_session(test_bridge_config()).await;

    h.client.fail_next_sends(1);
    h.upstream_io
        .inbound
        .send(Ok(function_call("call_1", "clearCanvas", "{}")))
        .unwrap();
    // Flush the upstream pump with a delta that does reach the client
    h.upstream_io.inbound.send(Ok(audio_delta("QUJD"))).unwrap();
    next_outbound(&mut h.client_io.outbound).await;

    h.client_io
        .inbound
        .send(Ok(command_result("call_1", "clearCanvas", "ok")))
        .unwrap();
    assert_no_outbound(&mut h.upstream_io.outbound).await;

    h.cancel.cancel();
    finish(h.session).await;
}

#[tokio::test]
async fn test_upstream_read_error_tears_down_session() {
    let h = start_session(test_bridge_config()).await;
    let started = Instant::now();

    h.upstream_io
        .inbound
        .send(Err(ChannelError::Transport("connection reset".to_string())))
        .unwrap();

    // The client side is idle; its pump must still stop
    let outcome = finish(h.session).await;
    assert!(matches!(
        outcome,
        SessionOutcome::Completed {
            forced_shutdown: false
        }
    ));
    assert!(started.elapsed() < Duration::from_millis(500));

    assert_eq!(h.client.close_calls(), 1);
    assert_eq!(h.upstream.close_calls(), 1);
    assert_eq!(*h.close_log.lock().unwrap(), vec!["client", "upstream"]);
}

#[tokio::test]
async fn test_client_disconnect_tears_down_session() {
    let h = start_session(test_bridge_config()).await;

    drop(h.client_io);

    let outcome = finish(h.session).await;
    assert!(matches!(
        outcome,
        SessionOutcome::Completed {
            forced_shutdown: false
        }
    ));
    assert_eq!(h.client.close_calls(), 1);
    assert_eq!(h.upstream.close_calls(), 1);
    assert_eq!(*h.close_log.lock().unwrap(), vec!["client", "upstream"]);
}

#[tokio::test]
async fn test_malformed_client_frame_is_fatal() {
    let h = start_session(test_bridge_config()).await;

    h.client_io
        .inbound
        .send(Err(ChannelError::Decode("expected value".to_string())))
        .unwrap();

    assert!(finish(h.session).await.is_completed());
    assert_eq!(h.upstream.close_calls(), 1);
}

#[tokio::test]
async fn test_unknown_client_type_is_skipped() {
    let mut h = start_session(test_bridge_config()).await;

    h.client_io
        .inbound
        .send(Err(ChannelError::UnknownMessageType("ping".to_string())))
        .unwrap();
    h.client_io.inbound.send(Ok(audio("QUJD"))).unwrap();

    assert_append(next_outbound(&mut h.upstream_io.outbound).await, "QUJD");
    assert!(!h.session.is_finished());

    h.cancel.cancel();
    finish(h.session).await;
}

#[tokio::test]
async fn test_observational_events_are_not_forwarded() {
    let mut h = start_session(test_bridge_config()).await;

    for event in [
        ServerEvent::AudioTranscriptDone {
            response_id: "resp_1".to_string(),
            item_id: "item_1".to_string(),
            transcript: "Drawing a circle".to_string(),
        },
        ServerEvent::TranscriptionCompleted {
            item_id: "item_0".to_string(),
            transcript: "Draw a circle".to_string(),
        },
        ServerEvent::RateLimitsUpdated {
            rate_limits: Vec::new(),
        },
        ServerEvent::Unknown {
            event_type: "response.output_item.added".to_string(),
        },
    ] {
        h.upstream_io.inbound.send(Ok(event)).unwrap();
    }

    assert_no_outbound(&mut h.client_io.outbound).await;
    assert!(!h.session.is_finished());

    h.cancel.cancel();
    finish(h.session).await;
}

#[tokio::test]
async fn test_external_cancel_interrupts_blocked_reads() {
    let mut config = test_bridge_config();
    config.session_grace = Duration::from_secs(5);
    let h = start_session(config).await;
    let started = Instant::now();

    // Both pumps are parked in recv with nothing to read
    h.cancel.cancel();

    let outcome = finish(h.session).await;
    assert!(matches!(
        outcome,
        SessionOutcome::Completed {
            forced_shutdown: false
        }
    ));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(h.client.close_calls(), 1);
    assert_eq!(h.upstream.close_calls(), 1);
}

#[tokio::test]
async fn test_hung_send_is_aborted_after_grace() {
    let mut config = test_bridge_config();
    config.session_grace = Duration::from_millis(100);
    let h = start_session(config).await;

    h.client.hang_sends();
    h.upstream_io.inbound.send(Ok(audio_delta("QUJD"))).unwrap();
    // Let the upstream pump enter the hanging send
    tokio::time::sleep(Duration::from_millis(50)).await;

    drop(h.client_io);

    let outcome = finish(h.session).await;
    assert!(matches!(
        outcome,
        SessionOutcome::Completed {
            forced_shutdown: true
        }
    ));
    assert_eq!(h.client.close_calls(), 1);
    assert_eq!(h.upstream.close_calls(), 1);
    assert_eq!(*h.close_log.lock().unwrap(), vec!["client", "upstream"]);
}

#[tokio::test]
async fn test_configuration_failure_skips_pumps() {
    let (client, mut client_io, upstream, mut upstream_io, close_log) = channel_pair();
    upstream.fail_next_sends(1);

    // Traffic waiting on both sides must never be consumed
    client_io.inbound.send(Ok(audio("QUJD"))).unwrap();
    upstream_io.inbound.send(Ok(audio_delta("UENN"))).unwrap();

    let coordinator = SessionCoordinator::new(Arc::new(test_bridge_config()));
    let outcome = coordinator
        .run(client.clone(), upstream.clone(), CancellationToken::new())
        .await;

    assert!(matches!(
        outcome,
        SessionOutcome::ConfigurationFailed(ChannelError::Transport(_))
    ));
    assert_no_outbound(&mut client_io.outbound).await;
    assert_no_outbound(&mut upstream_io.outbound).await;
    assert_eq!(client.close_calls(), 1);
    assert_eq!(upstream.close_calls(), 1);
    assert_eq!(*close_log.lock().unwrap(), vec!["client", "upstream"]);
}

#[tokio::test]
async fn test_parent_shutdown_reaches_session() {
    let server_shutdown = CancellationToken::new();
    let (client, _client_io, upstream, mut upstream_io, _log) = channel_pair();

    let coordinator = SessionCoordinator::new(Arc::new(test_bridge_config()));
    let session = tokio::spawn({
        let token = server_shutdown.child_token();
        async move { coordinator.run(client, upstream, token).await }
    });
    next_outbound(&mut upstream_io.outbound).await;

    server_shutdown.cancel();
    assert!(finish(session).await.is_completed());
}
