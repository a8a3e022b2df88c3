//! OpenAI Realtime API WebSocket message types.
//!
//! Only the part of the vendor protocol the bridge interprets is typed here.
//! Every other server event decodes to [`ServerEvent::Unknown`], keeping its
//! `type` tag, so new vendor events never break a session.
//!
//! Client events (sent to server):
//! - session.update - Configure instructions, voice, turn detection and tools
//! - input_audio_buffer.append - Append audio to buffer
//! - conversation.item.create - Attach a function call output
//! - response.create - Ask the model for a new turn
//!
//! Server events (received from server):
//! - error - Vendor-reported error
//! - session.created / session.updated - Session lifecycle
//! - response.audio.delta - Audio data chunk
//! - response.audio_transcript.done - Assistant transcript complete
//! - conversation.item.input_audio_transcription.completed - User transcript
//! - response.function_call_arguments.done - Tool call request
//! - response.done - Response complete
//! - rate_limits.updated - Rate limit snapshot

use serde::{Deserialize, Serialize};

use super::config::Modality;

// =============================================================================
// Session Configuration
// =============================================================================

/// Session configuration sent with `session.update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// System instructions for the assistant
    pub instructions: String,

    /// Response modalities (text, audio)
    pub modalities: Vec<Modality>,

    /// Voice for audio output
    pub voice: String,

    /// Input audio transcription configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<InputAudioTranscription>,

    /// Turn detection configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<TurnDetection>,

    /// Tool definitions
    #[serde(default)]
    pub tools: Vec<ToolDef>,

    /// Tool choice strategy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
}

/// Input audio transcription configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputAudioTranscription {
    /// Transcription model (e.g., "whisper-1")
    pub model: String,
}

/// Turn detection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TurnDetection {
    /// Server-side VAD with vendor defaults
    #[serde(rename = "server_vad")]
    ServerVad {
        #[serde(skip_serializing_if = "Option::is_none")]
        threshold: Option<f32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        prefix_padding_ms: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        silence_duration_ms: Option<u32>,
    },
}

impl TurnDetection {
    /// Server VAD with every tuning knob left to the vendor.
    pub fn server_vad() -> Self {
        TurnDetection::ServerVad {
            threshold: None,
            prefix_padding_ms: None,
            silence_duration_ms: None,
        }
    }
}

/// Tool definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDef {
    /// Tool type (always "function")
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function name
    pub name: String,
    /// Function description
    pub description: String,
    /// Function parameters JSON schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

// =============================================================================
// Conversation Items
// =============================================================================

/// Conversation item attached with `conversation.item.create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConversationItem {
    /// Output of a function call executed by the client
    #[serde(rename = "function_call_output")]
    FunctionCallOutput {
        /// Call ID the output answers
        call_id: String,
        /// Output reported by the client
        output: String,
    },
}

// =============================================================================
// Client Events (sent to server)
// =============================================================================

/// Client events sent to the OpenAI Realtime API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Update session configuration
    #[serde(rename = "session.update")]
    SessionUpdate {
        /// Session configuration
        session: SessionConfig,
    },

    /// Append audio to input buffer
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend {
        /// Base64-encoded audio data
        audio: String,
    },

    /// Create a conversation item
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate {
        /// Item to create
        item: ConversationItem,
    },

    /// Create a response with the session defaults
    #[serde(rename = "response.create")]
    ResponseCreate,
}

impl ClientEvent {
    /// Create the item carrying a function call's output.
    pub fn function_call_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        ClientEvent::ConversationItemCreate {
            item: ConversationItem::FunctionCallOutput {
                call_id: call_id.into(),
                output: output.into(),
            },
        }
    }

    /// Wire tag of this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            ClientEvent::SessionUpdate { .. } => "session.update",
            ClientEvent::InputAudioBufferAppend { .. } => "input_audio_buffer.append",
            ClientEvent::ConversationItemCreate { .. } => "conversation.item.create",
            ClientEvent::ResponseCreate => "response.create",
        }
    }
}

// =============================================================================
// Server Events (received from server)
// =============================================================================

/// Server events received from the OpenAI Realtime API.
///
/// Fields beyond the ones the bridge reads are defaulted so a vendor-side
/// shape change on an event the bridge only logs does not end the session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Error occurred
    #[serde(rename = "error")]
    Error {
        /// Error details
        error: ApiError,
    },

    /// Session created
    #[serde(rename = "session.created")]
    SessionCreated {
        /// Session information
        session: SessionInfo,
    },

    /// Session updated
    #[serde(rename = "session.updated")]
    SessionUpdated {
        /// Session information
        session: SessionInfo,
    },

    /// Audio delta (audio data chunk)
    #[serde(rename = "response.audio.delta")]
    AudioDelta {
        #[serde(default)]
        response_id: String,
        #[serde(default)]
        item_id: String,
        /// Base64-encoded audio delta
        delta: String,
    },

    /// Audio transcript done
    #[serde(rename = "response.audio_transcript.done")]
    AudioTranscriptDone {
        #[serde(default)]
        response_id: String,
        #[serde(default)]
        item_id: String,
        /// Full transcript
        #[serde(default)]
        transcript: String,
    },

    /// Input audio transcription completed
    #[serde(rename = "conversation.item.input_audio_transcription.completed")]
    TranscriptionCompleted {
        #[serde(default)]
        item_id: String,
        /// Transcript text
        #[serde(default)]
        transcript: String,
    },

    /// Function call arguments done
    #[serde(rename = "response.function_call_arguments.done")]
    FunctionCallArgumentsDone {
        #[serde(default)]
        response_id: String,
        #[serde(default)]
        item_id: String,
        /// Call ID
        call_id: String,
        /// Function name
        #[serde(default)]
        name: String,
        /// Full arguments, JSON-encoded
        arguments: String,
    },

    /// Response done
    #[serde(rename = "response.done")]
    ResponseDone {
        /// Response information
        response: ResponseInfo,
    },

    /// Rate limits updated
    #[serde(rename = "rate_limits.updated")]
    RateLimitsUpdated {
        /// Rate limit information
        #[serde(default)]
        rate_limits: Vec<RateLimit>,
    },

    /// Any event the bridge does not interpret
    #[serde(skip_deserializing)]
    Unknown {
        /// Wire tag as the vendor sent it
        event_type: String,
    },
}

/// The part of a server frame read before the variant is known.
#[derive(Deserialize)]
struct EventEnvelope {
    #[serde(rename = "type")]
    event_type: String,
}

/// Wire tags decoded into a typed [`ServerEvent`] variant.
const HANDLED_EVENT_TYPES: &[&str] = &[
    "error",
    "session.created",
    "session.updated",
    "response.audio.delta",
    "response.audio_transcript.done",
    "conversation.item.input_audio_transcription.completed",
    "response.function_call_arguments.done",
    "response.done",
    "rate_limits.updated",
];

impl ServerEvent {
    /// Decode a server event from a text frame.
    ///
    /// The `type` tag is read first. A tag the bridge does not handle yields
    /// [`ServerEvent::Unknown`] whatever the rest of the frame holds; a
    /// handled tag must match its variant's shape.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let envelope: EventEnvelope = serde_json::from_str(text)?;
        if !HANDLED_EVENT_TYPES.contains(&envelope.event_type.as_str()) {
            return Ok(ServerEvent::Unknown {
                event_type: envelope.event_type,
            });
        }
        serde_json::from_str(text)
    }

    /// Wire tag of this event.
    pub fn event_type(&self) -> &str {
        match self {
            ServerEvent::Error { .. } => "error",
            ServerEvent::SessionCreated { .. } => "session.created",
            ServerEvent::SessionUpdated { .. } => "session.updated",
            ServerEvent::AudioDelta { .. } => "response.audio.delta",
            ServerEvent::AudioTranscriptDone { .. } => "response.audio_transcript.done",
            ServerEvent::TranscriptionCompleted { .. } => {
                "conversation.item.input_audio_transcription.completed"
            }
            ServerEvent::FunctionCallArgumentsDone { .. } => {
                "response.function_call_arguments.done"
            }
            ServerEvent::ResponseDone { .. } => "response.done",
            ServerEvent::RateLimitsUpdated { .. } => "rate_limits.updated",
            ServerEvent::Unknown { event_type } => event_type,
        }
    }
}

// =============================================================================
// Supporting Types
// =============================================================================

/// API error information.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiError {
    /// Error type
    #[serde(rename = "type", default)]
    pub error_type: String,
    /// Error code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Error message
    #[serde(default)]
    pub message: String,
    /// Parameter that caused the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    /// Event ID that caused the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

/// Session information.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct SessionInfo {
    pub id: String,
    pub model: String,
    pub voice: Option<String>,
}

/// Response information.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ResponseInfo {
    pub id: String,
    pub status: String,
    pub usage: Option<Usage>,
}

/// Usage information.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Usage {
    pub total_tokens: u32,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Rate limit information.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct RateLimit {
    /// Rate limit name
    pub name: String,
    /// Limit value
    pub limit: u64,
    /// Remaining value
    pub remaining: u64,
    /// Seconds until reset
    pub reset_seconds: f64,
}
