//! Client-facing WebSocket message types
//!
//! Every frame is a JSON object carrying a `type` discriminator. The
//! discriminator is decoded first so that an unknown `type` can be told
//! apart from a malformed frame.
//!
//! ```json
//! {"type": "audio", "audio": "QUJD"}
//! {"type": "command.invoke", "call_id": "call_1", "name": "clearCanvas", "args": "{}"}
//! {"type": "command.result", "call_id": "call_1", "name": "clearCanvas", "output": "ok"}
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{ChannelError, ChannelResult};

// =============================================================================
// Messages
// =============================================================================

/// Messages exchanged with the browser client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Audio chunk, base64-encoded PCM16. Flows in both directions.
    #[serde(rename = "audio")]
    Audio {
        /// Opaque audio payload, forwarded verbatim
        audio: String,
    },

    /// Request for the client to run a tool (server -> client)
    #[serde(rename = "command.invoke")]
    CommandInvoke {
        /// Call ID issued by the model
        call_id: String,
        /// Tool name
        name: String,
        /// JSON-encoded arguments, passed through as the model produced them
        args: String,
    },

    /// Result of a tool run (client -> server)
    #[serde(rename = "command.result")]
    CommandResult {
        /// Call ID being answered
        call_id: String,
        /// Tool name
        name: String,
        /// Tool output
        output: String,
    },

    /// Reserved for error reporting; the bridge does not act on it
    #[serde(rename = "error")]
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

/// Discriminator values of [`ClientMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Audio,
    CommandInvoke,
    CommandResult,
    Error,
}

impl MessageType {
    /// Wire value of this discriminator.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Audio => "audio",
            MessageType::CommandInvoke => "command.invoke",
            MessageType::CommandResult => "command.result",
            MessageType::Error => "error",
        }
    }

    /// Look up a discriminator by its wire value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "audio" => Some(MessageType::Audio),
            "command.invoke" => Some(MessageType::CommandInvoke),
            "command.result" => Some(MessageType::CommandResult),
            "error" => Some(MessageType::Error),
            _ => None,
        }
    }
}

/// The part of a frame read before the variant is known.
#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    message_type: String,
}

impl ClientMessage {
    /// Decode one text frame.
    ///
    /// # Errors
    /// - [`ChannelError::UnknownMessageType`] if the envelope is well formed
    ///   but its `type` is not one of [`MessageType`]
    /// - [`ChannelError::Decode`] if the frame is not a JSON object with a
    ///   string `type`, or the body does not match the variant's shape
    pub fn decode(text: &str) -> ChannelResult<Self> {
        let envelope: Envelope = serde_json::from_str(text)
            .map_err(|e| ChannelError::Decode(format!("invalid envelope: {e}")))?;

        let message_type = MessageType::parse(&envelope.message_type)
            .ok_or(ChannelError::UnknownMessageType(envelope.message_type))?;

        serde_json::from_str(text).map_err(|e| {
            ChannelError::Decode(format!("invalid {} message: {e}", message_type.as_str()))
        })
    }

    /// Encode to a JSON text frame.
    pub fn encode(&self) -> ChannelResult<String> {
        serde_json::to_string(self).map_err(|e| ChannelError::Serialization(e.to_string()))
    }

    /// Discriminator of this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            ClientMessage::Audio { .. } => MessageType::Audio,
            ClientMessage::CommandInvoke { .. } => MessageType::CommandInvoke,
            ClientMessage::CommandResult { .. } => MessageType::CommandResult,
            ClientMessage::Error { .. } => MessageType::Error,
        }
    }
}
