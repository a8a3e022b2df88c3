//! Browser -> vendor pump.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::channel::ClientChannel;
use super::messages::ClientMessage;
use super::pending::PendingCalls;
use super::session::PumpExit;
use crate::core::realtime::{ClientEvent, UpstreamChannel};

/// Read client messages until the client read fails or `cancel` fires.
///
/// Exiting for any reason cancels `cancel`.
pub async fn run(
    client: Arc<dyn ClientChannel>,
    upstream: Arc<dyn UpstreamChannel>,
    pending: Arc<PendingCalls>,
    strict_tool_calls: bool,
    cancel: CancellationToken,
) -> PumpExit {
    let _guard = cancel.clone().drop_guard();

    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Downstream pump cancelled");
                return PumpExit::Cancelled;
            }
            result = client.recv() => result,
        };

        match result {
            Ok(message) => {
                forward_message(message, upstream.as_ref(), &pending, strict_tool_calls).await;
            }
            Err(e) if !e.is_fatal() => {
                warn!(error = %e, "Ignoring client message");
            }
            Err(e) => {
                info!(error = %e, "Client read ended, stopping session");
                return PumpExit::ReadFailed(e);
            }
        }
    }
}

async fn forward_message(
    message: ClientMessage,
    upstream: &dyn UpstreamChannel,
    pending: &PendingCalls,
    strict_tool_calls: bool,
) {
    match message {
        ClientMessage::Audio { audio } => {
            if let Err(e) = upstream
                .send(ClientEvent::InputAudioBufferAppend { audio })
                .await
            {
                warn!(error = %e, "Failed to append audio upstream");
            }
        }

        ClientMessage::CommandResult {
            call_id,
            name,
            output,
        } => {
            match pending.resolve(&call_id) {
                Some(issued) if issued != name => {
                    warn!(
                        call_id = %call_id,
                        issued = %issued,
                        name = %name,
                        "Tool result name differs from invoke"
                    );
                }
                Some(_) => {}
                None if strict_tool_calls => {
                    warn!(
                        call_id = %call_id,
                        name = %name,
                        "Dropping result for unknown tool call"
                    );
                    return;
                }
                None => {
                    debug!(
                        call_id = %call_id,
                        name = %name,
                        "Forwarding result for untracked tool call"
                    );
                }
            }

            info!(call_id = %call_id, name = %name, "Tool result received");

            // The output item must land before the new turn is requested
            if let Err(e) = upstream
                .send(ClientEvent::function_call_output(call_id.as_str(), output))
                .await
            {
                warn!(call_id = %call_id, error = %e, "Failed to send function call output");
            }
            if let Err(e) = upstream.send(ClientEvent::ResponseCreate).await {
                warn!(call_id = %call_id, error = %e, "Failed to request response");
            }
        }

        ClientMessage::CommandInvoke { .. } | ClientMessage::Error { .. } => {
            debug!(
                message_type = message.message_type().as_str(),
                "Ignoring client message"
            );
        }
    }
}
