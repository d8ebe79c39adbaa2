//! Error taxonomy for the orchestrator.
//!
//! Each enum maps to one recovery boundary: startup errors abort the
//! orchestrator, process errors are absorbed by the supervisor, relay
//! and bridge errors become caller-visible request failures, and ingest
//! errors are escalated as failure announcements.

use thiserror::Error;

/// Fatal errors during orchestrator startup.
///
/// Nothing downstream can run without a port lease and valid service
/// executables, so these abort the whole startup sequence.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The entire scan range was exhausted without finding a free port.
    #[error("no free port in range {start}-{end}")]
    NoFreePort { start: u16, end: u16 },

    /// The executable reference for a supervised service is unusable.
    #[error("invalid executable reference: {0}")]
    InvalidExecutable(String),

    /// Failed to persist or read the port lease file.
    #[error("port lease I/O failed: {0}")]
    LeaseIo(String),
}

/// Recoverable process-level errors.
///
/// The supervisor logs these, clears tracked state where needed, and
/// stays alive so a later `start` can retry.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The child process could not be spawned.
    #[error("failed to spawn: {0}")]
    SpawnFailed(String),

    /// Signalling or waiting on the process tree failed.
    #[error("failed to stop: {0}")]
    StopFailed(String),

    /// No process with that name is tracked as running.
    #[error("process not running: {0}")]
    NotRunning(String),
}

/// Errors from one prompt relay call.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The prompt was rejected before any connection was attempted.
    #[error("invalid prompt: {0}")]
    InvalidPrompt(String),

    /// The peer was unreachable or the connection was reset.
    #[error("relay connection failed: {0}")]
    Connection(String),

    /// The caller-supplied deadline expired.
    #[error("relay timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

/// Errors while persisting an inbound artifact.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Landing-directory or write failure.
    #[error("ingest I/O failed: {0}")]
    Io(String),
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Caller-visible failures from the correlation bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The request carried no session identifier.
    #[error("missing session identifier")]
    MissingSession,

    /// The underlying relay call failed.
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// The ingest side reported a failure for this correlation.
    #[error("ingest failed: {0}")]
    IngestFailed(String),

    /// No matching artifact arrived before the correlation deadline.
    #[error("no artifact arrived within {seconds}s")]
    Timeout { seconds: u64 },

    /// An untagged artifact arrived while multiple requests were pending;
    /// delivery was refused rather than guessed.
    #[error("ambiguous artifact delivery refused")]
    AmbiguousDelivery,
}
