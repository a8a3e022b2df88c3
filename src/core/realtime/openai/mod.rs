//! OpenAI Realtime API module.
//!
//! Provides the upstream side of a bridge session: the typed event protocol
//! and a WebSocket-backed [`UpstreamChannel`](crate::core::realtime::UpstreamChannel).
//!
//! # Supported Voices
//!
//! alloy, ash, ballad, coral, echo, sage, shimmer, verse

mod client;
mod config;
mod messages;

pub use client::{OpenAIConnectConfig, OpenAIRealtimeChannel};
pub use config::{
    Modality, OPENAI_REALTIME_URL, OpenAIRealtimeModel, OpenAIRealtimeVoice, TOOL_CHOICE_AUTO,
};
pub use messages::{
    ApiError, ClientEvent, ConversationItem, InputAudioTranscription, RateLimit, ResponseInfo,
    ServerEvent, SessionConfig, SessionInfo, ToolDef, TurnDetection, Usage,
};
