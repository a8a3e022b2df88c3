//! Environment variable loading.

use std::path::PathBuf;
use std::str::FromStr;

use super::{ConfigError, ConfigResult, ServerConfig};

/// Build a configuration from defaults overlaid with environment values.
///
/// Presence checks (e.g. the API key) are left to validation so that a YAML
/// file applied afterwards can still supply them.
pub(super) fn load<F>(lookup: &F) -> ConfigResult<ServerConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ServerConfig::default();

    if let Some(host) = non_empty(lookup, "HOST") {
        config.host = host;
    }
    if let Some(port) = parse_var(lookup, "PORT")? {
        config.port = port;
    }
    if let Some(dir) = non_empty(lookup, "ASSETS_DIR") {
        config.assets_dir = PathBuf::from(dir);
    }

    if let Some(key) = non_empty(lookup, "OPENAI_API_KEY") {
        config.openai_api_key = key;
    }
    if let Some(url) = non_empty(lookup, "OPENAI_REALTIME_URL") {
        config.realtime_url = url;
    }
    if let Some(model) = non_empty(lookup, "OPENAI_REALTIME_MODEL") {
        config.realtime_model = model;
    }
    if let Some(voice) = non_empty(lookup, "OPENAI_REALTIME_VOICE") {
        config.voice = voice;
    }
    config.input_transcription_model = non_empty(lookup, "INPUT_TRANSCRIPTION_MODEL");

    if let Some(path) = non_empty(lookup, "INSTRUCTIONS_PATH") {
        config.instructions_path = PathBuf::from(path);
    }
    if let Some(path) = non_empty(lookup, "TOOL_SCHEMA_PATH") {
        config.tool_schema_path = PathBuf::from(path);
    }

    if let Some(secs) = parse_var(lookup, "SHUTDOWN_TIMEOUT_SECS")? {
        config.shutdown_timeout_secs = secs;
    }
    if let Some(ms) = parse_var(lookup, "SESSION_GRACE_MS")? {
        config.session_grace_ms = ms;
    }
    if let Some(value) = non_empty(lookup, "STRICT_TOOL_CALLS") {
        config.strict_tool_calls = parse_bool(&value).ok_or_else(|| ConfigError::InvalidValue {
            key: "STRICT_TOOL_CALLS".to_string(),
            message: format!("expected a boolean, got '{value}'"),
        })?;
    }

    Ok(config)
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<F, T>(lookup: &F, key: &str) -> ConfigResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    non_empty(lookup, key)
        .map(|value| {
            value.parse::<T>().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("'{value}': {e}"),
            })
        })
        .transpose()
}

/// Parse common boolean spellings.
pub(super) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
