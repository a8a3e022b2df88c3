//! In-memory channel doubles for bridge session tests
//!
//! A [`MockChannel`] is fed inbound items through its [`MockHandle`] and
//! reports every successfully sent item back through the same handle.
//! Dropping the handle's `inbound` sender ends the stream with
//! [`ChannelError::Closed`].
//!
//! Failure injection:
//! - `fail_next_sends(n)` makes the next `n` sends return a transport error
//! - `hang_sends()` makes every later send block forever
//!
//! `close()` calls are counted and, when a close log is attached, recorded in
//! order across channels.

// Allow dead code in test infrastructure - not every test uses every helper
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::{Mutex, mpsc};

use canvas_bridge::core::realtime::{ClientEvent, ServerEvent, UpstreamChannel};
use canvas_bridge::core::tools::ToolCatalog;
use canvas_bridge::errors::{ChannelError, ChannelResult};
use canvas_bridge::handlers::realtime::{BridgeConfig, ClientChannel, ClientMessage};

/// Default wait for an expected item
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Order in which channels were closed
pub type CloseLog = Arc<StdMutex<Vec<&'static str>>>;

pub struct MockChannel<In, Out> {
    incoming: Mutex<mpsc::UnboundedReceiver<ChannelResult<In>>>,
    outgoing: mpsc::UnboundedSender<Out>,
    failing_sends: AtomicUsize,
    hang_sends: AtomicBool,
    close_calls: AtomicUsize,
    close_log: Option<(CloseLog, &'static str)>,
}

/// Test-side ends of a [`MockChannel`].
pub struct MockHandle<In, Out> {
    pub inbound: mpsc::UnboundedSender<ChannelResult<In>>,
    pub outbound: mpsc::UnboundedReceiver<Out>,
}

pub type MockClient = MockChannel<ClientMessage, ClientMessage>;
pub type MockClientHandle = MockHandle<ClientMessage, ClientMessage>;
pub type MockUpstream = MockChannel<ServerEvent, ClientEvent>;
pub type MockUpstreamHandle = MockHandle<ServerEvent, ClientEvent>;

pub fn mock_channel<In, Out>(
    close_log: Option<(CloseLog, &'static str)>,
) -> (Arc<MockChannel<In, Out>>, MockHandle<In, Out>) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

    let channel = MockChannel {
        incoming: Mutex::new(inbound_rx),
        outgoing: outbound_tx,
        failing_sends: AtomicUsize::new(0),
        hang_sends: AtomicBool::new(false),
        close_calls: AtomicUsize::new(0),
        close_log,
    };

    (
        Arc::new(channel),
        MockHandle {
            inbound: inbound_tx,
            outbound: outbound_rx,
        },
    )
}

impl<In, Out> MockChannel<In, Out> {
    pub fn fail_next_sends(&self, count: usize) {
        self.failing_sends.store(count, Ordering::SeqCst);
    }

    pub fn hang_sends(&self) {
        self.hang_sends.store(true, Ordering::SeqCst);
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    async fn do_send(&self, item: Out) -> ChannelResult<()> {
        if self.hang_sends.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let failed = self
            .failing_sends
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(ChannelError::Transport("injected send failure".to_string()));
        }

        // The test may have stopped listening; that is not a channel failure
        let _ = self.outgoing.send(item);
        Ok(())
    }

    async fn do_recv(&self) -> ChannelResult<In> {
        self.incoming
            .lock()
            .await
            .recv()
            .await
            .unwrap_or(Err(ChannelError::Closed))
    }

    fn do_close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        if let Some((log, label)) = &self.close_log {
            log.lock().unwrap().push(label);
        }
    }
}

#[async_trait]
impl ClientChannel for MockClient {
    async fn send(&self, message: ClientMessage) -> ChannelResult<()> {
        self.do_send(message).await
    }

    async fn recv(&self) -> ChannelResult<ClientMessage> {
        self.do_recv().await
    }

    async fn close(&self) {
        self.do_close();
    }
}

#[async_trait]
impl UpstreamChannel for MockUpstream {
    async fn send(&self, event: ClientEvent) -> ChannelResult<()> {
        self.do_send(event).await
    }

    async fn recv(&self) -> ChannelResult<ServerEvent> {
        self.do_recv().await
    }

    async fn close(&self) {
        self.do_close();
    }
}

/// Client and upstream mocks sharing one close log.
pub fn channel_pair() -> (
    Arc<MockClient>,
    MockClientHandle,
    Arc<MockUpstream>,
    MockUpstreamHandle,
    CloseLog,
) {
    let log: CloseLog = Arc::new(StdMutex::new(Vec::new()));
    let (client, client_handle) = mock_channel(Some((log.clone(), "client")));
    let (upstream, upstream_handle) = mock_channel(Some((log.clone(), "upstream")));
    (client, client_handle, upstream, upstream_handle, log)
}

/// Bridge configuration with a short grace period.
pub fn test_bridge_config() -> BridgeConfig {
    let schema = json!({
        "type": "object",
        "properties": {"commands": {"type": "array"}}
    });
    let mut config = BridgeConfig::new("You are a test painter.", ToolCatalog::canvas(schema));
    config.session_grace = Duration::from_millis(500);
    config
}

/// Wait for the next outbound item, failing the test on timeout or stream end.
pub async fn next_outbound<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for outbound message")
        .expect("outbound stream ended")
}

/// Assert nothing is sent within a short window.
pub async fn assert_no_outbound<T: std::fmt::Debug>(rx: &mut mpsc::UnboundedReceiver<T>) {
    if let Ok(Some(item)) = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await {
        panic!("unexpected outbound message: {item:?}");
    }
}

pub fn audio_delta(delta: &str) -> ServerEvent {
    ServerEvent::AudioDelta {
        response_id: "resp_1".to_string(),
        item_id: "item_1".to_string(),
        delta: delta.to_string(),
    }
}

pub fn function_call(call_id: &str, name: &str, arguments: &str) -> ServerEvent {
    ServerEvent::FunctionCallArgumentsDone {
        response_id: "resp_1".to_string(),
        item_id: "item_2".to_string(),
        call_id: call_id.to_string(),
        name: name.to_string(),
        arguments: arguments.to_string(),
    }
}
