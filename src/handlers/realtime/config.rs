//! Per-session bridge configuration.
//!
//! Built once at startup from [`ServerConfig`] plus the instruction and tool
//! schema files, then shared by every session.

use std::time::Duration;

use serde_json::Value;

use crate::config::{ConfigError, ConfigResult, ServerConfig};
use crate::core::realtime::openai::{
    ClientEvent, InputAudioTranscription, Modality, OpenAIRealtimeVoice, SessionConfig,
    TOOL_CHOICE_AUTO, TurnDetection,
};
use crate::core::tools::{ToolCatalog, load_tool_schema};

/// Everything a session needs besides its two channels.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// System prompt injected into the session configuration
    pub instructions: String,
    pub voice: OpenAIRealtimeVoice,
    pub modalities: Vec<Modality>,
    pub turn_detection: Option<TurnDetection>,
    pub input_transcription_model: Option<String>,
    pub tools: ToolCatalog,
    pub tool_choice: String,
    /// How long pumps may take to drain after cancellation
    pub session_grace: Duration,
    /// Drop command results whose call_id was never issued
    pub strict_tool_calls: bool,
}

impl BridgeConfig {
    /// Configuration with the default voice, modalities and turn detection.
    pub fn new(instructions: impl Into<String>, tools: ToolCatalog) -> Self {
        Self {
            instructions: instructions.into(),
            voice: OpenAIRealtimeVoice::default(),
            modalities: vec![Modality::Text, Modality::Audio],
            turn_detection: Some(TurnDetection::server_vad()),
            input_transcription_model: None,
            tools,
            tool_choice: TOOL_CHOICE_AUTO.to_string(),
            session_grace: Duration::from_millis(5000),
            strict_tool_calls: true,
        }
    }

    /// Combine server settings with already-loaded instruction text and tool schema.
    pub fn from_server_config(
        config: &ServerConfig,
        instructions: String,
        paint_schema: Value,
    ) -> Self {
        let mut bridge = Self::new(instructions, ToolCatalog::canvas(paint_schema));
        bridge.voice = OpenAIRealtimeVoice::parse(&config.voice).unwrap_or_default();
        bridge.input_transcription_model = config.input_transcription_model.clone();
        bridge.session_grace = config.session_grace();
        bridge.strict_tool_calls = config.strict_tool_calls;
        bridge
    }

    /// Read the instruction and schema files named by `config`.
    ///
    /// # Errors
    /// [`ConfigError::Io`] if either file cannot be read and
    /// [`ConfigError::InvalidSchema`] if the schema is not a JSON object.
    pub fn load(config: &ServerConfig) -> ConfigResult<Self> {
        let instructions =
            std::fs::read_to_string(&config.instructions_path).map_err(|source| ConfigError::Io {
                path: config.instructions_path.clone(),
                source,
            })?;
        let paint_schema = load_tool_schema(&config.tool_schema_path)?;

        Ok(Self::from_server_config(config, instructions, paint_schema))
    }

    /// Session configuration advertised to the model.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            instructions: self.instructions.clone(),
            modalities: self.modalities.clone(),
            voice: self.voice.as_str().to_string(),
            input_audio_transcription: self
                .input_transcription_model
                .as_ref()
                .map(|model| InputAudioTranscription {
                    model: model.clone(),
                }),
            turn_detection: self.turn_detection.clone(),
            tools: self.tools.definitions().to_vec(),
            tool_choice: Some(self.tool_choice.clone()),
        }
    }

    /// The `session.update` event sent once at the start of every session.
    pub fn session_update_event(&self) -> ClientEvent {
        ClientEvent::SessionUpdate {
            session: self.session_config(),
        }
    }
}
