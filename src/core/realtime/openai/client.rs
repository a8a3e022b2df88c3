//! OpenAI Realtime API upstream channel.
//!
//! # API Reference
//!
//! - Endpoint: `wss://api.openai.com/v1/realtime?model=<model>`
//! - Protocol: WebSocket with JSON events
//! - Audio: PCM 16-bit, 24kHz, mono, little-endian, base64 encoded
//!
//! The socket is split once at connect time. The write half and the read half
//! sit behind separate locks so the downstream pump can send while the
//! upstream pump is parked in [`UpstreamChannel::recv`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::config::{OPENAI_REALTIME_URL, OpenAIRealtimeModel};
use super::messages::{ClientEvent, ServerEvent};
use crate::core::realtime::base::{RealtimeError, RealtimeResult, UpstreamChannel};
use crate::errors::{ChannelError, ChannelResult};

/// Upper bound on the close handshake so teardown never hangs on a dead peer.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection parameters for the OpenAI Realtime endpoint.
#[derive(Debug, Clone)]
pub struct OpenAIConnectConfig {
    /// API key sent as a bearer token
    pub api_key: String,
    /// Base WebSocket URL, without the `model` query parameter
    pub url: String,
    /// Realtime model
    pub model: OpenAIRealtimeModel,
}

impl Default for OpenAIConnectConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            url: OPENAI_REALTIME_URL.to_string(),
            model: OpenAIRealtimeModel::default(),
        }
    }
}

impl OpenAIConnectConfig {
    /// Build the WebSocket URL with model parameter.
    pub fn ws_url(&self) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}model={}", self.url, separator, self.model.as_str())
    }
}

/// Typed channel over a live OpenAI Realtime WebSocket.
pub struct OpenAIRealtimeChannel {
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
    closed: AtomicBool,
}

impl OpenAIRealtimeChannel {
    /// Open the vendor WebSocket and wrap it.
    pub async fn connect(config: &OpenAIConnectConfig) -> RealtimeResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(RealtimeError::AuthenticationFailed(
                "API key is required".to_string(),
            ));
        }

        let url = config.ws_url();
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| RealtimeError::InvalidConfiguration(e.to_string()))?;

        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|e| RealtimeError::InvalidConfiguration(e.to_string()))?;
        let headers = request.headers_mut();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert("openai-beta", HeaderValue::from_static("realtime=v1"));

        let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| match e {
                tungstenite::Error::Http(response) if response.status().as_u16() == 401 => {
                    RealtimeError::AuthenticationFailed("Upstream rejected the API key".to_string())
                }
                other => RealtimeError::ConnectionFailed(other.to_string()),
            })?;

        tracing::info!(model = %config.model, "Connected to OpenAI Realtime API");

        Ok(Self::from_stream(ws_stream))
    }

    /// Wrap an already-established WebSocket.
    pub fn from_stream(ws_stream: WsStream) -> Self {
        let (sink, stream) = ws_stream.split();
        Self {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl UpstreamChannel for OpenAIRealtimeChannel {
    async fn send(&self, event: ClientEvent) -> ChannelResult<()> {
        tracing::trace!(event_type = event.event_type(), "Sending upstream event");
        let json = serde_json::to_string(&event)
            .map_err(|e| ChannelError::Serialization(e.to_string()))?;

        self.sink
            .lock()
            .await
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))
    }

    async fn recv(&self) -> ChannelResult<ServerEvent> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return ServerEvent::from_json(&text)
                        .map_err(|e| ChannelError::Decode(e.to_string()));
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(?frame, "OpenAI Realtime WebSocket closed by server");
                    return Err(ChannelError::Closed);
                }
                // Pongs are queued by tungstenite itself
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(ChannelError::Transport(e.to_string())),
                None => return Err(ChannelError::Closed),
            }
        }
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let close = async { self.sink.lock().await.close().await };
        match tokio::time::timeout(CLOSE_TIMEOUT, close).await {
            Ok(Ok(())) => tracing::debug!("OpenAI Realtime WebSocket closed"),
            Ok(Err(e)) => tracing::debug!("OpenAI Realtime WebSocket close failed: {}", e),
            Err(_) => tracing::warn!("Timed out closing OpenAI Realtime WebSocket"),
        }
    }
}
