use thiserror::Error;

/// Errors produced by a client or upstream channel.
///
/// A read that returns one of these ends the pump that issued it, except for
/// [`ChannelError::UnknownMessageType`], which only drops the offending frame.
/// A write that returns one of these drops that single message.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The peer closed the connection or the stream ended
    #[error("Channel closed")]
    Closed,

    /// The underlying transport failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// A frame could not be decoded into a typed message
    #[error("Decode error: {0}")]
    Decode(String),

    /// A well-formed envelope carried a `type` this side does not know
    #[error("Unknown message type: {0}")]
    UnknownMessageType(String),

    /// A typed message could not be encoded for the wire
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ChannelError {
    /// Whether a read that failed with this error must end the session.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ChannelError::UnknownMessageType(_))
    }
}

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;
