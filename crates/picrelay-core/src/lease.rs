//! Durable port lease persisted for dependent services.
//!
//! The orchestrator allocates a port once, writes it here, and only then
//! starts the services that read it. The lease records which range was
//! scanned so a human reading the file can tell where the port came from.

use crate::error::StartupError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A discovered free TCP port recorded for consumption by dependent
/// services.
///
/// The port was free at allocation time; it is not re-validated later.
/// If something else grabs it between allocation and bind, the consuming
/// service fails at startup and the failure is visible in its logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortLease {
    /// Service the port was allocated for.
    pub service: String,
    /// The allocated port.
    pub port: u16,
    /// First port of the scanned range.
    pub range_start: u16,
    /// Last port of the scanned range.
    pub range_end: u16,
    /// When the allocation happened.
    pub allocated_at: DateTime<Utc>,
}

impl PortLease {
    /// Record a fresh allocation.
    pub fn new(service: impl Into<String>, port: u16, range_start: u16, range_end: u16) -> Self {
        Self {
            service: service.into(),
            port,
            range_start,
            range_end,
            allocated_at: Utc::now(),
        }
    }
}

/// Write the lease as pretty-printed JSON, creating parent directories.
pub fn write_lease(path: &Path, lease: &PortLease) -> Result<(), StartupError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StartupError::LeaseIo(e.to_string()))?;
    }
    let json = serde_json::to_string_pretty(lease)
        .map_err(|e| StartupError::LeaseIo(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| StartupError::LeaseIo(e.to_string()))
}

/// Read a previously written lease.
pub fn read_lease(path: &Path) -> Result<PortLease, StartupError> {
    let json = std::fs::read_to_string(path).map_err(|e| StartupError::LeaseIo(e.to_string()))?;
    serde_json::from_str(&json).map_err(|e| StartupError::LeaseIo(e.to_string()))
}
