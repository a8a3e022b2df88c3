//! Client channel over the browser WebSocket.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::ws::{CloseFrame, Message, WebSocket, close_code};
use base64::prelude::*;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::messages::ClientMessage;
use crate::errors::{ChannelError, ChannelResult};

/// Upper bound on the close handshake with the browser.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Typed duplex connection to the browser client.
///
/// One task may be parked in [`ClientChannel::recv`] while another calls
/// [`ClientChannel::send`].
#[async_trait]
pub trait ClientChannel: Send + Sync {
    /// Encode and send one message.
    async fn send(&self, message: ClientMessage) -> ChannelResult<()>;

    /// Wait for and decode the next message. Must be cancel-safe.
    async fn recv(&self) -> ChannelResult<ClientMessage>;

    /// Close the connection. Calling it more than once is a no-op.
    async fn close(&self);
}

/// [`ClientChannel`] backed by an axum WebSocket.
pub struct WebSocketClientChannel {
    sink: Mutex<SplitSink<WebSocket, Message>>,
    stream: Mutex<SplitStream<WebSocket>>,
    closed: AtomicBool,
}

impl WebSocketClientChannel {
    pub fn new(socket: WebSocket) -> Self {
        let (sink, stream) = socket.split();
        Self {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            closed: AtomicBool::new(false),
        }
    }

    /// Close with an explicit close code and reason.
    pub async fn close_with(&self, code: u16, reason: &str) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let frame = CloseFrame {
            code,
            reason: reason.to_string().into(),
        };
        let close = async {
            let mut sink = self.sink.lock().await;
            sink.send(Message::Close(Some(frame))).await?;
            sink.close().await
        };

        match tokio::time::timeout(CLOSE_TIMEOUT, close).await {
            Ok(Ok(())) => debug!(code, "Client WebSocket closed"),
            Ok(Err(e)) => debug!("Client WebSocket close failed: {}", e),
            Err(_) => warn!("Timed out closing client WebSocket"),
        }
    }
}

#[async_trait]
impl ClientChannel for WebSocketClientChannel {
    async fn send(&self, message: ClientMessage) -> ChannelResult<()> {
        let json = message.encode()?;
        self.sink
            .lock()
            .await
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))
    }

    async fn recv(&self) -> ChannelResult<ClientMessage> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => return ClientMessage::decode(text.as_str()),
                // Raw PCM from clients that skip the JSON wrapper
                Some(Ok(Message::Binary(data))) => {
                    return Ok(ClientMessage::Audio {
                        audio: BASE64_STANDARD.encode(&data),
                    });
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "Client WebSocket closed by peer");
                    return Err(ChannelError::Closed);
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                Some(Err(e)) => return Err(ChannelError::Transport(e.to_string())),
                None => return Err(ChannelError::Closed),
            }
        }
    }

    async fn close(&self) {
        self.close_with(close_code::NORMAL, "").await;
    }
}
