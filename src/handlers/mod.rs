//! HTTP and WebSocket request handlers
//!
//! - `realtime` - Canvas client ↔ OpenAI Realtime bridge

pub mod realtime;

pub use realtime::realtime_handler;
