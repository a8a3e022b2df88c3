//! Shared application state.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::{ConfigResult, ServerConfig};
use crate::handlers::realtime::BridgeConfig;

/// State shared by every request handler.
pub struct AppState {
    pub config: ServerConfig,
    /// Session configuration loaded once at startup
    pub bridge: Arc<BridgeConfig>,
    /// Cancelled on server shutdown; each session runs on a child token
    pub shutdown: CancellationToken,
    /// Upgraded WebSocket sessions, which outlive the HTTP request
    pub sessions: TaskTracker,
}

impl AppState {
    /// Build state, reading the instruction and tool schema files named by `config`.
    pub fn new(config: ServerConfig) -> ConfigResult<Arc<Self>> {
        let bridge = BridgeConfig::load(&config)?;
        Ok(Self::with_bridge(config, bridge))
    }

    /// Build state around an already-constructed bridge configuration.
    pub fn with_bridge(config: ServerConfig, bridge: BridgeConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            bridge: Arc::new(bridge),
            shutdown: CancellationToken::new(),
            sessions: TaskTracker::new(),
        })
    }

    /// Wait until every tracked session has closed both of its channels.
    ///
    /// Sessions only finish on their own or once [`AppState::shutdown`] is
    /// cancelled; callers bound the wait with a timeout.
    pub async fn wait_for_sessions(&self) {
        self.sessions.close();
        self.sessions.wait().await;
    }
}
