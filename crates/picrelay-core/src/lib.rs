//! Domain layer for picrelay.
//!
//! This crate holds the transport-agnostic pieces of the orchestrator:
//! the error taxonomy, prompt validation and sanitization, correlation
//! tokens and the pending-correlation registry, event payloads, the port
//! lease format, and service configuration.
//!
//! Nothing in here touches the network or spawns processes; that lives
//! in `picrelay-runtime`.

pub mod config;
pub mod correlation;
pub mod error;
pub mod events;
pub mod lease;
pub mod prompt;
pub mod token;

// Re-export commonly used types for convenience
pub use config::{BridgeConfig, IngestConfig, OrchestratorConfig, RelayConfig};
pub use correlation::{CorrelationOutcome, CorrelationRegistry, Delivery, PendingHandle};
pub use error::{BridgeError, IngestError, ProcessError, RelayError, StartupError};
pub use events::{ArtifactRef, IngestAnnouncement, ProcessEvent, ProcessEventKind, SessionEvent};
pub use lease::{PortLease, read_lease, write_lease};
pub use prompt::{sanitize, validate};
pub use token::CorrelationToken;
