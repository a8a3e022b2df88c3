//! Realtime WebSocket handler
//!
//! Upgrades `/ws`, opens the upstream OpenAI Realtime connection and runs one
//! [`SessionCoordinator`] until either side goes away.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{WebSocket, WebSocketUpgrade, close_code},
    },
    response::Response,
};
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use super::channel::WebSocketClientChannel;
use super::session::{SessionCoordinator, SessionOutcome};
use crate::core::realtime::OpenAIRealtimeChannel;
use crate::state::AppState;

/// Maximum WebSocket frame size (10 MB)
const MAX_WS_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Maximum WebSocket message size (10 MB)
const MAX_WS_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Close reason sent to the browser when the vendor connection cannot be opened
pub const UPSTREAM_CONNECT_FAILED_REASON: &str = "Failed to connect to OpenAI";

/// Realtime WebSocket handler
///
/// Upgrades the HTTP connection to WebSocket and bridges it to the OpenAI
/// Realtime API.
pub async fn realtime_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!("Realtime WebSocket connection upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| {
            let session_id = Uuid::new_v4();
            let sessions = state.sessions.clone();
            sessions.track_future(
                handle_realtime_socket(socket, state)
                    .instrument(info_span!("session", %session_id)),
            )
        })
}

/// Handle the realtime WebSocket connection
async fn handle_realtime_socket(socket: WebSocket, state: Arc<AppState>) {
    info!("Client connected");
    let client = Arc::new(WebSocketClientChannel::new(socket));

    let upstream = match OpenAIRealtimeChannel::connect(&state.config.connect_config()).await {
        Ok(upstream) => Arc::new(upstream),
        Err(e) => {
            error!(error = %e, "Failed to connect to OpenAI Realtime API");
            client
                .close_with(close_code::ERROR, UPSTREAM_CONNECT_FAILED_REASON)
                .await;
            return;
        }
    };

    let coordinator = SessionCoordinator::new(state.bridge.clone());
    match coordinator
        .run(client, upstream, state.shutdown.child_token())
        .await
    {
        SessionOutcome::Completed { forced_shutdown } => {
            info!(forced_shutdown, "Client disconnected");
        }
        SessionOutcome::ConfigurationFailed(e) => {
            warn!(error = %e, "Session ended before configuration completed");
        }
    }
}
