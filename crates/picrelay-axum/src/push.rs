//! Per-session realtime push over SSE.
//!
//! One broadcast channel carries all session events; each SSE client
//! subscribes and sees only its own session's events. Slow clients may
//! lag and miss events if the buffer overflows.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::Stream;
use picrelay_core::events::SessionEvent;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

/// Broadcaster for session push events.
#[derive(Debug, Clone)]
pub struct PushBroadcaster {
    sender: broadcast::Sender<SessionEvent>,
}

impl PushBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn with_defaults() -> Self {
        Self::new(256)
    }

    /// Emit an event to all subscribers. No subscribers is fine.
    pub fn emit(&self, event: SessionEvent) {
        let _ = self.sender.send(event);
    }

    /// Raw subscription, used by tests and embedded consumers.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// SSE stream of one session's events, keep-alive pinged every 30
    /// seconds to survive proxies.
    ///
    /// The returned stream owns its subscription (`use<>`: no borrow of
    /// `self` is captured), so handlers can return it past the
    /// broadcaster reference.
    pub fn stream_for_session(
        &self,
        session_id: String,
    ) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static + use<>> {
        let receiver = self.sender.subscribe();
        let stream = BroadcastStream::new(receiver).filter_map(move |result| match result {
            Ok(event) => {
                if event.session_id != session_id {
                    return None;
                }
                match serde_json::to_string(&event) {
                    Ok(json) => Some(Ok(Event::default().data(json))),
                    Err(e) => {
                        tracing::warn!("failed to serialize session event: {e}");
                        None
                    }
                }
            }
            Err(e) => {
                tracing::debug!("push stream error: {e}");
                None
            }
        });

        Sse::new(stream).keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(30))
                .text("ping"),
        )
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for PushBroadcaster {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use picrelay_core::events::ArtifactRef;
    use picrelay_core::token::CorrelationToken;
    use std::path::PathBuf;

    fn event(session: &str) -> SessionEvent {
        SessionEvent {
            session_id: session.to_string(),
            token: CorrelationToken::new(),
            artifact: ArtifactRef {
                path: PathBuf::from("/landing/current.png"),
                bytes: 1,
                received_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn subscriber_receives_emitted_event() {
        let pushes = PushBroadcaster::with_defaults();
        let mut rx = pushes.subscribe();

        pushes.emit(event("s-1"));
        let received = rx.recv().await.unwrap();
        assert_eq!(received.session_id, "s-1");
    }

    #[test]
    fn emit_without_subscribers_does_not_panic() {
        let pushes = PushBroadcaster::with_defaults();
        pushes.emit(event("nobody"));
        assert_eq!(pushes.subscriber_count(), 0);
    }
}
