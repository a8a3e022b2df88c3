//! Base traits and types for the upstream realtime connection.
//!
//! The bridge talks to the vendor through [`UpstreamChannel`], a typed duplex
//! channel: one task may be blocked in [`UpstreamChannel::recv`] while another
//! calls [`UpstreamChannel::send`].

use async_trait::async_trait;
use thiserror::Error;

use super::openai::{ClientEvent, ServerEvent};
use crate::errors::ChannelResult;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while establishing the upstream connection.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Connection to the provider failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for realtime operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;

// =============================================================================
// Upstream Channel
// =============================================================================

/// Typed duplex connection to the realtime vendor.
#[async_trait]
pub trait UpstreamChannel: Send + Sync {
    /// Encode and send one client event.
    async fn send(&self, event: ClientEvent) -> ChannelResult<()>;

    /// Wait for and decode the next server event.
    ///
    /// Must be cancel-safe: dropping the future before it resolves loses no
    /// event that a later call would have returned.
    async fn recv(&self) -> ChannelResult<ServerEvent>;

    /// Close the connection. Calling it more than once is a no-op.
    async fn close(&self);
}
