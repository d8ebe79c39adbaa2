//! Correlation bridge.
//!
//! Ties an inbound prompt request to the ingest completion that belongs
//! to it. A fresh correlation token is registered before the relay call
//! so an artifact racing the peer's relay response cannot slip past. The
//! registration handle deregisters on drop, so no orphaned correlation
//! survives a relay failure, a timeout, or a caller that disconnects
//! mid-wait. Every wait is bounded by the correlation deadline.

use picrelay_core::correlation::{CorrelationOutcome, CorrelationRegistry, Delivery};
use picrelay_core::error::BridgeError;
use picrelay_core::events::{ArtifactRef, IngestAnnouncement, SessionEvent};
use picrelay_core::prompt::validate;
use picrelay_core::token::CorrelationToken;
use picrelay_runtime::relay::PromptRelay;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::push::PushBroadcaster;

/// Successful bridge result: the artifact that answered the prompt.
#[derive(Debug, Clone)]
pub struct BridgeReply {
    pub token: CorrelationToken,
    pub artifact: ArtifactRef,
}

/// Bridge instance; owns the registry and the push channel.
pub struct CorrelationBridge {
    relay: Arc<dyn PromptRelay>,
    registry: CorrelationRegistry,
    pushes: PushBroadcaster,
    correlation_timeout: Duration,
}

impl CorrelationBridge {
    pub fn new(
        relay: Arc<dyn PromptRelay>,
        pushes: PushBroadcaster,
        correlation_timeout: Duration,
    ) -> Self {
        Self {
            relay,
            registry: CorrelationRegistry::new(),
            pushes,
            correlation_timeout,
        }
    }

    /// Handle one prompt request end to end: validate, relay, then wait
    /// for the correlated ingest completion.
    pub async fn handle_prompt(
        &self,
        prompt: &str,
        session_id: Option<&str>,
    ) -> Result<BridgeReply, BridgeError> {
        let session = session_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(BridgeError::MissingSession)?;

        // Reject bad prompts before registering anything or touching the
        // network.
        validate(prompt)?;

        let token = CorrelationToken::new();
        // The handle deregisters on drop: relay failure, timeout, and a
        // disconnected caller (this future dropped mid-wait) all clean
        // up the entry on their way out.
        let mut pending = self.registry.register(token, session);
        debug!(%token, session, "correlation registered");

        if let Err(e) = self.relay.relay(token, prompt).await {
            warn!(%token, error = %e, "relay failed, correlation abandoned");
            return Err(e.into());
        }

        let outcome = match timeout(self.correlation_timeout, pending.recv()).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_closed)) => {
                return Err(BridgeError::IngestFailed(
                    "correlation channel closed".to_string(),
                ));
            }
            Err(_elapsed) => {
                warn!(%token, session, "correlation timed out");
                return Err(BridgeError::Timeout {
                    seconds: self.correlation_timeout.as_secs(),
                });
            }
        };

        match outcome {
            CorrelationOutcome::Completed(artifact) => {
                info!(%token, session, path = %artifact.path.display(), "correlation completed");
                // Exactly one realtime push per completed correlation.
                self.pushes.emit(SessionEvent {
                    session_id: session.to_string(),
                    token,
                    artifact: artifact.clone(),
                });
                Ok(BridgeReply { token, artifact })
            }
            CorrelationOutcome::Failed(error) => Err(BridgeError::IngestFailed(error)),
        }
    }

    /// Route an ingest announcement into the registry.
    pub fn ingest_completed(&self, announcement: IngestAnnouncement) -> Delivery {
        self.registry.resolve(announcement)
    }

    /// Number of correlations currently pending.
    pub fn pending_count(&self) -> usize {
        self.registry.pending_count()
    }
}
