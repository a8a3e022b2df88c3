//! Session coordinator
//!
//! One [`SessionCoordinator::run`] call owns a client channel and an upstream
//! channel for the lifetime of a conversation:
//!
//! 1. send the `session.update` handshake upstream
//! 2. run the upstream and downstream pumps in a [`JoinSet`] sharing one
//!    cancellation token
//! 3. once the token fires, give the pumps `session_grace` to return and abort
//!    whatever is left
//! 4. close the client channel, then the upstream channel
//!
//! The token fires when either pump exits or when the caller cancels it
//! (server shutdown).

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, warn};

use super::channel::ClientChannel;
use super::config::BridgeConfig;
use super::pending::PendingCalls;
use super::{downstream_pump, upstream_pump};
use crate::core::realtime::UpstreamChannel;
use crate::errors::ChannelError;

/// Why a pump returned.
#[derive(Debug)]
pub enum PumpExit {
    /// The shared token fired
    Cancelled,
    /// The pump's own read failed
    ReadFailed(ChannelError),
}

/// How a session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    /// Pumps ran and the session was torn down.
    Completed {
        /// The grace period expired and pumps had to be aborted
        forced_shutdown: bool,
    },
    /// The configuration handshake could not be sent; no pump ran.
    ConfigurationFailed(ChannelError),
}

impl SessionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SessionOutcome::Completed { .. })
    }
}

/// Bridges one browser client to one upstream realtime connection.
#[derive(Debug, Clone)]
pub struct SessionCoordinator {
    config: Arc<BridgeConfig>,
}

impl SessionCoordinator {
    pub fn new(config: Arc<BridgeConfig>) -> Self {
        Self { config }
    }

    /// Run the session to completion.
    ///
    /// Both channels are closed exactly once before this returns, whatever
    /// the outcome.
    pub async fn run(
        &self,
        client: Arc<dyn ClientChannel>,
        upstream: Arc<dyn UpstreamChannel>,
        cancel: CancellationToken,
    ) -> SessionOutcome {
        if let Err(e) = upstream.send(self.config.session_update_event()).await {
            error!(error = %e, "Failed to send session configuration");
            client.close().await;
            upstream.close().await;
            return SessionOutcome::ConfigurationFailed(e);
        }
        info!(
            voice = %self.config.voice,
            tools = self.config.tools.len(),
            "Session configured"
        );

        let pending = Arc::new(PendingCalls::new());
        let mut pumps = JoinSet::new();
        pumps.spawn(
            upstream_pump::run(
                upstream.clone(),
                client.clone(),
                pending.clone(),
                cancel.clone(),
            )
            .in_current_span(),
        );
        pumps.spawn(
            downstream_pump::run(
                client.clone(),
                upstream.clone(),
                pending.clone(),
                self.config.strict_tool_calls,
                cancel.clone(),
            )
            .in_current_span(),
        );

        cancel.cancelled().await;

        let grace = self.config.session_grace;
        let drained = tokio::time::timeout(grace, async {
            while let Some(joined) = pumps.join_next().await {
                match joined {
                    Ok(exit) => debug!(?exit, "Pump finished"),
                    Err(e) => error!(error = %e, "Pump task failed"),
                }
            }
        })
        .await;

        let forced_shutdown = drained.is_err();
        if forced_shutdown {
            warn!(
                grace_ms = grace.as_millis() as u64,
                "Pumps did not stop within grace period, aborting"
            );
            pumps.abort_all();
            while pumps.join_next().await.is_some() {}
        }

        if !pending.is_empty() {
            debug!(unanswered = pending.len(), "Session ended with unanswered tool calls");
        }

        client.close().await;
        upstream.close().await;
        info!(forced_shutdown, "Session closed");

        SessionOutcome::Completed { forced_shutdown }
    }
}
