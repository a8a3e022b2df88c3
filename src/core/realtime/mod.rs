//! Realtime voice provider module.
//!
//! # Architecture
//!
//! - `UpstreamChannel` trait: the typed duplex connection a bridge session
//!   reads vendor events from and writes client events to
//! - `openai`: the OpenAI Realtime API implementation
//!
//! # Audio Format
//!
//! PCM 16-bit signed little-endian at 24kHz, base64 encoded on the wire.
//! The bridge never decodes audio; payloads pass through as opaque strings.

mod base;
pub mod openai;

pub use base::{RealtimeError, RealtimeResult, UpstreamChannel};
pub use openai::{
    ClientEvent, Modality, OPENAI_REALTIME_URL, OpenAIConnectConfig, OpenAIRealtimeChannel,
    OpenAIRealtimeModel, OpenAIRealtimeVoice, ServerEvent,
};
