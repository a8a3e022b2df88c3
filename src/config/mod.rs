//! Configuration module for the Canvas Bridge server
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `env`: Environment variable loading
//! - `yaml`: YAML configuration file loading and overrides
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use canvas_bridge::config::ServerConfig;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable base
//! let config = ServerConfig::from_file(Path::new("config.yaml"))?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::realtime::{OPENAI_REALTIME_URL, OpenAIConnectConfig, OpenAIRealtimeModel};

mod env;
mod validation;
mod yaml;

pub use yaml::YamlConfig;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting is absent
    #[error("{0} is not set")]
    MissingVariable(String),

    /// A setting is present but cannot be used
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// A referenced file could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The YAML configuration file is malformed
    #[error("Failed to parse YAML config: {0}")]
    Yaml(String),

    /// The tool schema document is unusable
    #[error("Invalid tool schema: {0}")]
    InvalidSchema(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Server configuration
///
/// Contains all configuration needed to run the bridge server, including:
/// - Server settings (host, port, static assets)
/// - OpenAI Realtime settings (API key, endpoint, model, voice)
/// - Files loaded once at startup (instructions, tool schema)
/// - Shutdown and session teardown timing
/// - Tool-call correlation policy
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,
    /// Directory served for every non-WebSocket path
    pub assets_dir: PathBuf,

    // OpenAI Realtime settings
    pub openai_api_key: String,
    pub realtime_url: String,
    pub realtime_model: String,
    pub voice: String,
    /// Transcription model for user audio; transcription is off when unset
    pub input_transcription_model: Option<String>,

    // Startup files
    pub instructions_path: PathBuf,
    pub tool_schema_path: PathBuf,

    // Timing
    /// Bound on graceful server shutdown after an interrupt
    pub shutdown_timeout_secs: u64,
    /// Bound on a session's pump drain after cancellation
    pub session_grace_ms: u64,

    /// Drop command results whose call_id was never issued
    pub strict_tool_calls: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            assets_dir: PathBuf::from("assets"),
            openai_api_key: String::new(),
            realtime_url: OPENAI_REALTIME_URL.to_string(),
            realtime_model: OpenAIRealtimeModel::default().as_str().to_string(),
            voice: "ash".to_string(),
            input_transcription_model: None,
            instructions_path: PathBuf::from("instructions.txt"),
            tool_schema_path: PathBuf::from("schema.json"),
            shutdown_timeout_secs: 15,
            session_grace_ms: 5000,
            strict_tool_calls: true,
        }
    }
}

/// Zeroize the API key when the configuration is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        self.openai_api_key.zeroize();
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// The .env file is loaded in main.rs at application startup, so its values
    /// are visible here as ordinary environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = env::load(&lookup)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base.
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let yaml_config = YamlConfig::from_file(path)?;
        Self::from_yaml_with_lookup(yaml_config, |key| std::env::var(key).ok())
    }

    /// Apply YAML overrides on top of a lookup-provided base.
    pub fn from_yaml_with_lookup<F>(yaml_config: YamlConfig, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = env::load(&lookup)?;
        yaml_config.apply(&mut config);
        validation::validate(&config)?;
        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Graceful shutdown bound for the HTTP server.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Drain bound for a single session's pumps.
    pub fn session_grace(&self) -> Duration {
        Duration::from_millis(self.session_grace_ms)
    }

    /// Connection parameters for the upstream realtime endpoint.
    pub fn connect_config(&self) -> OpenAIConnectConfig {
        OpenAIConnectConfig {
            api_key: self.openai_api_key.clone(),
            url: self.realtime_url.clone(),
            model: OpenAIRealtimeModel::parse(&self.realtime_model).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = ServerConfig::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-test")]))
            .unwrap();

        assert_eq!(config.address(), "0.0.0.0:8080");
        assert_eq!(config.openai_api_key, "sk-test");
        assert_eq!(config.realtime_url, OPENAI_REALTIME_URL);
        assert_eq!(config.voice, "ash");
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(15));
        assert_eq!(config.session_grace(), Duration::from_millis(5000));
        assert!(config.strict_tool_calls);
        assert!(config.input_transcription_model.is_none());
    }

    #[test]
    fn test_missing_api_key() {
        match ServerConfig::from_lookup(lookup_from(&[])) {
            Err(ConfigError::MissingVariable(key)) => assert_eq!(key, "OPENAI_API_KEY"),
            other => panic!("Expected MissingVariable error, got {other:?}"),
        }
    }

    #[test]
    fn test_connect_config() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_REALTIME_URL", "ws://127.0.0.1:9000/v1/realtime"),
            ("OPENAI_REALTIME_MODEL", "gpt-4o-mini-realtime-preview"),
        ]))
        .unwrap();

        let connect = config.connect_config();
        assert_eq!(connect.api_key, "sk-test");
        assert_eq!(
            connect.ws_url(),
            "ws://127.0.0.1:9000/v1/realtime?model=gpt-4o-mini-realtime-preview"
        );
    }

    #[test]
    fn test_yaml_overrides_environment() {
        let yaml: YamlConfig = serde_yaml::from_str(
            r#"
server:
  port: 9090
openai:
  voice: "coral"
"#,
        )
        .unwrap();

        let config = ServerConfig::from_yaml_with_lookup(
            yaml,
            lookup_from(&[
                ("OPENAI_API_KEY", "sk-env"),
                ("PORT", "3000"),
                ("OPENAI_REALTIME_VOICE", "sage"),
            ]),
        )
        .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.voice, "coral");
        assert_eq!(config.openai_api_key, "sk-env");
    }
}
