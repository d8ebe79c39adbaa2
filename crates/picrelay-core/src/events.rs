//! Event payloads shared between the ingest side, the bridge, and the
//! realtime push surface.
//!
//! `IngestAnnouncement` is the single-writer completion signal emitted by
//! the ingest server; `SessionEvent` is what a session's realtime channel
//! receives once a correlation completes; `ProcessEvent` reports
//! supervised-process lifecycle changes.

use crate::token::CorrelationToken;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Reference to a persisted artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Landing path of the active artifact.
    pub path: PathBuf,
    /// Payload size in bytes.
    pub bytes: u64,
    /// When the stream finished and the artifact was written.
    pub received_at: DateTime<Utc>,
}

/// Completion (or failure) announcement from the ingest server.
///
/// Carries the correlation token when the sending peer echoed one;
/// untagged announcements can only be matched while a single request is
/// in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestAnnouncement {
    /// Token echoed by the peer, if any.
    pub token: Option<CorrelationToken>,
    /// The persisted artifact on success.
    pub artifact: Option<ArtifactRef>,
    /// Failure description when persisting the artifact failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IngestAnnouncement {
    /// Announcement for a successfully persisted artifact.
    pub fn completed(token: Option<CorrelationToken>, artifact: ArtifactRef) -> Self {
        Self {
            token,
            artifact: Some(artifact),
            error: None,
        }
    }

    /// Announcement escalating an ingest I/O failure to the bridge.
    pub fn failed(token: Option<CorrelationToken>, error: impl Into<String>) -> Self {
        Self {
            token,
            artifact: None,
            error: Some(error.into()),
        }
    }
}

/// Realtime push payload delivered once per completed correlation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEvent {
    /// Session the result belongs to.
    pub session_id: String,
    /// Correlation token of the originating request.
    pub token: CorrelationToken,
    /// The artifact reference.
    pub artifact: ArtifactRef,
}

/// Supervised-process lifecycle change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessEventKind {
    /// Process spawned and is being tracked.
    Started,
    /// Process exited after a requested stop.
    Stopped,
    /// Process exited without a stop being requested.
    Crashed,
}

/// Lifecycle event broadcast by the supervisor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessEvent {
    /// Supervised service name.
    pub name: String,
    /// What happened.
    pub kind: ProcessEventKind,
    /// OS process id, when known.
    pub pid: Option<u32>,
}

impl ProcessEvent {
    pub fn started(name: impl Into<String>, pid: u32) -> Self {
        Self {
            name: name.into(),
            kind: ProcessEventKind::Started,
            pid: Some(pid),
        }
    }

    pub fn stopped(name: impl Into<String>, pid: Option<u32>) -> Self {
        Self {
            name: name.into(),
            kind: ProcessEventKind::Stopped,
            pid,
        }
    }

    pub fn crashed(name: impl Into<String>, pid: Option<u32>) -> Self {
        Self {
            name: name.into(),
            kind: ProcessEventKind::Crashed,
            pid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> ArtifactRef {
        ArtifactRef {
            path: PathBuf::from("/tmp/landing/current.png"),
            bytes: 12,
            received_at: Utc::now(),
        }
    }

    #[test]
    fn announcement_serializes_token_and_path() {
        let token = CorrelationToken::new();
        let ann = IngestAnnouncement::completed(Some(token), artifact());
        let json = serde_json::to_string(&ann).unwrap();
        assert!(json.contains(&token.to_string()));
        assert!(json.contains("current.png"));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn failure_announcement_carries_error() {
        let ann = IngestAnnouncement::failed(None, "disk full");
        let json = serde_json::to_string(&ann).unwrap();
        assert!(json.contains("disk full"));

        let back: IngestAnnouncement = serde_json::from_str(&json).unwrap();
        assert_eq!(back.error.as_deref(), Some("disk full"));
        assert!(back.artifact.is_none());
    }

    #[test]
    fn session_event_uses_camel_case() {
        let event = SessionEvent {
            session_id: "s-1".to_string(),
            token: CorrelationToken::new(),
            artifact: artifact(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"sessionId\":\"s-1\""));
    }
}
