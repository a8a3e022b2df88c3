//! Error types shared across the bridge.
//!
//! - `channel_error`: read/write failures on either side of a session

pub mod channel_error;

pub use channel_error::{ChannelError, ChannelResult};
