//! Realtime WebSocket route configuration

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::realtime::realtime_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the Realtime WebSocket router
///
/// # Endpoint
///
/// `GET /ws` - WebSocket upgrade bridged to the OpenAI Realtime API
///
/// # Example
///
/// ```json
/// // Client streams microphone audio
/// {"type": "audio", "audio": "<base64 pcm16>"}
///
/// // Server asks the client to run a tool
/// {"type": "command.invoke", "call_id": "call_1", "name": "clearCanvas", "args": "{}"}
///
/// // Client reports the result
/// {"type": "command.result", "call_id": "call_1", "name": "clearCanvas", "output": "ok"}
/// ```
pub fn create_realtime_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ws", get(realtime_handler))
        .layer(TraceLayer::new_for_http())
}
