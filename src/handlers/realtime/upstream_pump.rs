//! Vendor -> browser pump.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::channel::ClientChannel;
use super::messages::ClientMessage;
use super::pending::PendingCalls;
use super::session::PumpExit;
use crate::core::realtime::{ServerEvent, UpstreamChannel};

/// Read server events until the upstream read fails or `cancel` fires.
///
/// Audio deltas and function calls are forwarded to the client; everything
/// else is only logged. Send failures drop the single message. Exiting for
/// any reason cancels `cancel`.
pub async fn run(
    upstream: Arc<dyn UpstreamChannel>,
    client: Arc<dyn ClientChannel>,
    pending: Arc<PendingCalls>,
    cancel: CancellationToken,
) -> PumpExit {
    let _guard = cancel.clone().drop_guard();

    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Upstream pump cancelled");
                return PumpExit::Cancelled;
            }
            result = upstream.recv() => result,
        };

        match result {
            Ok(event) => forward_event(event, client.as_ref(), &pending).await,
            Err(e) if !e.is_fatal() => {
                warn!(error = %e, "Skipping unreadable upstream event");
            }
            Err(e) => {
                info!(error = %e, "Upstream read ended, stopping session");
                return PumpExit::ReadFailed(e);
            }
        }
    }
}

async fn forward_event(event: ServerEvent, client: &dyn ClientChannel, pending: &PendingCalls) {
    match event {
        ServerEvent::AudioDelta { delta, .. } => {
            if let Err(e) = client.send(ClientMessage::Audio { audio: delta }).await {
                warn!(error = %e, "Failed to forward audio delta to client");
            }
        }

        ServerEvent::FunctionCallArgumentsDone {
            call_id,
            name,
            arguments,
            ..
        } => {
            info!(call_id = %call_id, name = %name, "Model requested tool call");
            if !pending.register(&call_id, &name) {
                warn!(call_id = %call_id, "Tool call ID reissued while still pending");
            }

            let invoke = ClientMessage::CommandInvoke {
                call_id: call_id.clone(),
                name,
                args: arguments,
            };
            if let Err(e) = client.send(invoke).await {
                pending.unregister(&call_id);
                warn!(call_id = %call_id, error = %e, "Failed to send command.invoke to client");
            }
        }

        ServerEvent::Error { error } => {
            error!(
                error_type = %error.error_type,
                code = ?error.code,
                "OpenAI Realtime error: {}",
                error.message
            );
        }

        ServerEvent::AudioTranscriptDone { transcript, .. } => {
            info!(transcript = %transcript, "Assistant transcript");
        }

        ServerEvent::TranscriptionCompleted { transcript, .. } => {
            info!(transcript = %transcript, "User transcript");
        }

        ServerEvent::ResponseDone { response } => {
            debug!(
                response_id = %response.id,
                status = %response.status,
                total_tokens = response.usage.as_ref().map(|u| u.total_tokens),
                "Response done"
            );
        }

        ServerEvent::RateLimitsUpdated { rate_limits } => {
            for limit in &rate_limits {
                debug!(
                    name = %limit.name,
                    limit = limit.limit,
                    remaining = limit.remaining,
                    reset_seconds = limit.reset_seconds,
                    "Rate limit updated"
                );
            }
        }

        ServerEvent::SessionCreated { session } | ServerEvent::SessionUpdated { session } => {
            debug!(
                upstream_session_id = %session.id,
                model = %session.model,
                "Upstream session state"
            );
        }

        ServerEvent::Unknown { event_type } => {
            trace!(event_type = %event_type, "Ignoring unhandled upstream event");
        }
    }
}
