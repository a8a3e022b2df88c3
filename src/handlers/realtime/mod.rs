//! Realtime bridge between the browser canvas client and OpenAI Realtime
//!
//! # Protocol
//!
//! ## Client → Server
//!
//! - **audio**: base64 PCM16 chunk, appended to the model's input buffer
//! - **command.result**: output of a tool the model asked the client to run
//! - **Binary frames**: raw PCM16, treated like `audio`
//!
//! ## Server → Client
//!
//! - **audio**: base64 PCM16 chunk of the model's spoken reply
//! - **command.invoke**: tool call requested by the model
//!
//! The connection closes when either side goes away; there is no resume.

mod channel;
mod config;
mod downstream_pump;
mod handler;
pub mod messages;
mod pending;
mod session;
mod upstream_pump;

pub use channel::{ClientChannel, WebSocketClientChannel};
pub use config::BridgeConfig;
pub use handler::{UPSTREAM_CONNECT_FAILED_REASON, realtime_handler};
pub use messages::{ClientMessage, MessageType};
pub use pending::PendingCalls;
pub use session::{PumpExit, SessionCoordinator, SessionOutcome};
