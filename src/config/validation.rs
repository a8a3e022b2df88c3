//! Configuration validation logic.

use url::Url;

use super::{ConfigError, ConfigResult, ServerConfig};
use crate::core::realtime::{OpenAIRealtimeModel, OpenAIRealtimeVoice};

/// Check a fully merged configuration before the server starts.
pub(super) fn validate(config: &ServerConfig) -> ConfigResult<()> {
    if config.openai_api_key.trim().is_empty() {
        return Err(ConfigError::MissingVariable("OPENAI_API_KEY".to_string()));
    }

    validate_realtime_url(&config.realtime_url)?;

    if config.port == 0 {
        return Err(invalid("PORT", "port must be non-zero"));
    }
    if config.shutdown_timeout_secs == 0 {
        return Err(invalid("SHUTDOWN_TIMEOUT_SECS", "must be greater than zero"));
    }
    if config.session_grace_ms == 0 {
        return Err(invalid("SESSION_GRACE_MS", "must be greater than zero"));
    }

    if OpenAIRealtimeModel::parse(&config.realtime_model).is_none() {
        let known: Vec<&str> = OpenAIRealtimeModel::all().iter().map(|m| m.as_str()).collect();
        return Err(invalid(
            "OPENAI_REALTIME_MODEL",
            &format!(
                "unknown model '{}', expected one of {}",
                config.realtime_model,
                known.join(", ")
            ),
        ));
    }

    if OpenAIRealtimeVoice::parse(&config.voice).is_none() {
        let known: Vec<&str> = OpenAIRealtimeVoice::all().iter().map(|v| v.as_str()).collect();
        return Err(invalid(
            "OPENAI_REALTIME_VOICE",
            &format!("unknown voice '{}', expected one of {}", config.voice, known.join(", ")),
        ));
    }

    Ok(())
}

fn validate_realtime_url(raw: &str) -> ConfigResult<()> {
    let url = Url::parse(raw).map_err(|e| invalid("OPENAI_REALTIME_URL", &e.to_string()))?;
    match url.scheme() {
        "ws" | "wss" => Ok(()),
        other => Err(invalid(
            "OPENAI_REALTIME_URL",
            &format!("scheme must be ws or wss, got '{other}'"),
        )),
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
