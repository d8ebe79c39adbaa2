//! Pending-correlation registry.
//!
//! Ties an admitted prompt request to the ingest completion that belongs
//! to it. Entries are keyed by correlation token and resolved at most
//! once: dispatch takes the entry out of the map under the lock, and the
//! oneshot responder cannot be used twice. A responder that was
//! deregistered before an announcement arrived can therefore never fire.
//! Registration hands back a [`PendingHandle`] whose drop deregisters
//! the entry, so abandoned callers cannot leak map entries.
//!
//! Untagged announcements (from peers that do not echo the token) are
//! only matched while exactly one correlation is pending. With several
//! in flight, delivery is refused and reported as ambiguous instead of
//! handing session A the artifact meant for session B.

use crate::events::{ArtifactRef, IngestAnnouncement};
use crate::token::CorrelationToken;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Terminal outcome delivered to a pending correlation.
#[derive(Debug)]
pub enum CorrelationOutcome {
    /// An artifact arrived and was persisted.
    Completed(ArtifactRef),
    /// The ingest side failed while handling the matching stream.
    Failed(String),
}

/// What happened to an announcement during dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Exactly one pending correlation was resolved.
    Delivered(CorrelationToken),
    /// An untagged announcement arrived with several correlations
    /// pending; nothing was resolved.
    Ambiguous { pending: usize },
    /// No pending correlation matched.
    Unmatched,
}

struct Pending {
    session_id: String,
    registered_at: Instant,
    responder: oneshot::Sender<CorrelationOutcome>,
}

/// Live side of a registered correlation.
///
/// Dropping the handle deregisters the entry, so a caller that goes away
/// mid-wait (client disconnect drops the handler future) cannot leave a
/// stale entry behind to grow the map and shadow later single-flight
/// untagged deliveries. Deregistration after a resolve is a no-op.
pub struct PendingHandle<'a> {
    registry: &'a CorrelationRegistry,
    token: CorrelationToken,
    receiver: oneshot::Receiver<CorrelationOutcome>,
}

impl PendingHandle<'_> {
    pub fn token(&self) -> CorrelationToken {
        self.token
    }

    /// Await the outcome. Errors only if the responder vanished without
    /// resolving, which a live registry entry never does.
    pub async fn recv(&mut self) -> Result<CorrelationOutcome, oneshot::error::RecvError> {
        (&mut self.receiver).await
    }

    pub fn try_recv(&mut self) -> Result<CorrelationOutcome, oneshot::error::TryRecvError> {
        self.receiver.try_recv()
    }
}

impl Drop for PendingHandle<'_> {
    fn drop(&mut self) {
        self.registry.remove(self.token);
    }
}

/// Registry of not-yet-resolved prompt requests, owned by the bridge.
#[derive(Default)]
pub struct CorrelationRegistry {
    inner: Mutex<HashMap<CorrelationToken, Pending>>,
}

impl CorrelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending correlation and hand back the handle the
    /// caller awaits. The entry lives until it is resolved or the handle
    /// is dropped, whichever comes first.
    pub fn register(
        &self,
        token: CorrelationToken,
        session_id: impl Into<String>,
    ) -> PendingHandle<'_> {
        let (tx, rx) = oneshot::channel();
        let pending = Pending {
            session_id: session_id.into(),
            registered_at: Instant::now(),
            responder: tx,
        };
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.insert(token, pending);
        PendingHandle {
            registry: self,
            token,
            receiver: rx,
        }
    }

    /// Deregister a correlation. Called by the handle's drop; a no-op
    /// for entries already resolved. Returns true if one was removed.
    pub fn remove(&self, token: CorrelationToken) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.remove(&token).is_some()
    }

    /// Number of correlations currently pending.
    pub fn pending_count(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.len()
    }

    /// Route an ingest announcement to the pending correlation it
    /// belongs to.
    pub fn resolve(&self, announcement: IngestAnnouncement) -> Delivery {
        let pending = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            match announcement.token {
                Some(token) => inner.remove(&token).map(|p| (token, p)),
                None => match inner.len() {
                    // Single-flight compatibility with peers that do not
                    // echo the token.
                    1 => inner.drain().next(),
                    0 => None,
                    n => {
                        warn!(
                            pending = n,
                            "untagged announcement with multiple correlations pending; \
                             refusing delivery"
                        );
                        return Delivery::Ambiguous { pending: n };
                    }
                },
            }
        };

        let Some((token, pending)) = pending else {
            debug!(token = ?announcement.token, "announcement matched no pending correlation");
            return Delivery::Unmatched;
        };

        let outcome = match (announcement.artifact, announcement.error) {
            (Some(artifact), _) => CorrelationOutcome::Completed(artifact),
            (None, Some(error)) => CorrelationOutcome::Failed(error),
            (None, None) => {
                CorrelationOutcome::Failed("announcement carried no artifact".to_string())
            }
        };

        let waited = pending.registered_at.elapsed();
        if pending.responder.send(outcome).is_err() {
            // Caller went away before the artifact arrived.
            debug!(%token, session_id = %pending.session_id, "correlation abandoned by caller");
        } else {
            debug!(
                %token,
                session_id = %pending.session_id,
                waited_ms = waited.as_millis() as u64,
                "correlation resolved"
            );
        }
        Delivery::Delivered(token)
    }
}
