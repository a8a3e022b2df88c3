use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::{ConfigError, ConfigResult, ServerConfig};

/// Complete YAML configuration structure
///
/// This structure represents the full configuration that can be loaded from a YAML file.
/// All fields are optional to allow partial configuration. Values present here override
/// the environment.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 8080
///   assets_dir: "assets"
///
/// openai:
///   api_key: "sk-..."
///   realtime_url: "wss://api.openai.com/v1/realtime"
///   model: "gpt-4o-realtime-preview"
///   voice: "ash"
///   input_transcription_model: "whisper-1"
///
/// files:
///   instructions_path: "instructions.txt"
///   tool_schema_path: "schema.json"
///
/// session:
///   shutdown_timeout_secs: 15
///   session_grace_ms: 5000
///   strict_tool_calls: true
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub openai: Option<OpenAIYaml>,
    pub files: Option<FilesYaml>,
    pub session: Option<SessionYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub assets_dir: Option<String>,
}

/// OpenAI Realtime settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct OpenAIYaml {
    pub api_key: Option<String>,
    pub realtime_url: Option<String>,
    pub model: Option<String>,
    pub voice: Option<String>,
    pub input_transcription_model: Option<String>,
}

/// Startup file locations from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FilesYaml {
    pub instructions_path: Option<String>,
    pub tool_schema_path: Option<String>,
}

/// Session lifecycle settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SessionYaml {
    pub shutdown_timeout_secs: Option<u64>,
    pub session_grace_ms: Option<u64>,
    pub strict_tool_calls: Option<bool>,
}

impl YamlConfig {
    /// Load YAML configuration from a file
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Yaml`] if its contents are not valid YAML for this structure.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Yaml(e.to_string()))
    }

    /// Overlay every value present in this file onto `config`.
    pub fn apply(self, config: &mut ServerConfig) {
        if let Some(server) = self.server {
            if let Some(host) = server.host {
                config.host = host;
            }
            if let Some(port) = server.port {
                config.port = port;
            }
            if let Some(dir) = server.assets_dir {
                config.assets_dir = PathBuf::from(dir);
            }
        }

        if let Some(openai) = self.openai {
            if let Some(api_key) = openai.api_key {
                config.openai_api_key = api_key;
            }
            if let Some(url) = openai.realtime_url {
                config.realtime_url = url;
            }
            if let Some(model) = openai.model {
                config.realtime_model = model;
            }
            if let Some(voice) = openai.voice {
                config.voice = voice;
            }
            if let Some(model) = openai.input_transcription_model {
                config.input_transcription_model = Some(model).filter(|m| !m.is_empty());
            }
        }

        if let Some(files) = self.files {
            if let Some(path) = files.instructions_path {
                config.instructions_path = PathBuf::from(path);
            }
            if let Some(path) = files.tool_schema_path {
                config.tool_schema_path = PathBuf::from(path);
            }
        }

        if let Some(session) = self.session {
            if let Some(secs) = session.shutdown_timeout_secs {
                config.shutdown_timeout_secs = secs;
            }
            if let Some(ms) = session.session_grace_ms {
                config.session_grace_ms = ms;
            }
            if let Some(strict) = session.strict_tool_calls {
                config.strict_tool_calls = strict;
            }
        }
    }
}
