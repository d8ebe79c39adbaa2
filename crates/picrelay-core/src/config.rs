//! Service configuration.
//!
//! Plain structs with defaults; the CLI layer fills them from flags and
//! environment variables. Paths are derived from one data root so the
//! lease file, landing directory, and archive directory stay together.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default scan range for the ingest listener port.
pub const DEFAULT_PORT_RANGE: (u16, u16) = (8080, 8999);

/// Default port for the HTTP bridge service.
pub const DEFAULT_HTTP_PORT: u16 = 3002;

/// Default peer address for the prompt relay.
pub const DEFAULT_PEER_ADDR: &str = "127.0.0.1:5001";

/// Interface the ingest listener binds. The port allocator probes the
/// same interface so a leased port cannot turn out to be held elsewhere.
pub const DEFAULT_LISTEN_HOST: &str = "0.0.0.0";

/// Prompt relay client configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Fixed peer address, one fresh connection per call.
    pub peer_addr: String,
    /// Deadline covering connect, write, and the first response read.
    pub timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            peer_addr: DEFAULT_PEER_ADDR.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl RelayConfig {
    #[must_use]
    pub fn with_peer_addr(mut self, addr: impl Into<String>) -> Self {
        self.peer_addr = addr.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Image ingest server configuration.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Host to bind the ingest listener on.
    pub listen_host: String,
    /// Landing directory for the active artifact.
    pub landing_dir: PathBuf,
    /// Archive directory for rotated artifacts.
    pub archive_dir: PathBuf,
    /// Bridge endpoint that completion announcements are POSTed to.
    pub announce_url: String,
}

impl IngestConfig {
    /// Derive ingest paths from a data root and the bridge's HTTP port.
    pub fn from_data_root(data_root: &Path, http_port: u16) -> Self {
        Self {
            listen_host: DEFAULT_LISTEN_HOST.to_string(),
            landing_dir: data_root.join("landing"),
            archive_dir: data_root.join("archive"),
            announce_url: format!("http://127.0.0.1:{http_port}/internal/ingest"),
        }
    }
}

/// Correlation bridge / web service configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Port for the HTTP server.
    pub http_port: u16,
    /// How long a pending correlation may wait for its artifact.
    pub correlation_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            http_port: DEFAULT_HTTP_PORT,
            correlation_timeout: Duration::from_secs(120),
        }
    }
}

impl BridgeConfig {
    #[must_use]
    pub fn with_http_port(mut self, port: u16) -> Self {
        self.http_port = port;
        self
    }

    #[must_use]
    pub fn with_correlation_timeout(mut self, timeout: Duration) -> Self {
        self.correlation_timeout = timeout;
        self
    }
}

/// Top-level orchestrator configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Inclusive port scan range for the ingest listener.
    pub range_start: u16,
    pub range_end: u16,
    /// Data root holding the lease file and artifact directories.
    pub data_root: PathBuf,
    /// HTTP port the web service will bind.
    pub http_port: u16,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            range_start: DEFAULT_PORT_RANGE.0,
            range_end: DEFAULT_PORT_RANGE.1,
            data_root: PathBuf::from("picrelay-data"),
            http_port: DEFAULT_HTTP_PORT,
        }
    }
}

impl OrchestratorConfig {
    /// Location of the port lease file under the data root.
    pub fn lease_path(&self) -> PathBuf {
        lease_path_under(&self.data_root)
    }
}

/// Lease file location for a given data root. Writer (orchestrator) and
/// reader (ingest service) derive it the same way.
pub fn lease_path_under(data_root: &Path) -> PathBuf {
    data_root.join("config").join("ingest-port.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_paths_derive_from_data_root() {
        let cfg = IngestConfig::from_data_root(Path::new("/var/lib/picrelay"), 3002);
        assert_eq!(cfg.landing_dir, PathBuf::from("/var/lib/picrelay/landing"));
        assert_eq!(cfg.archive_dir, PathBuf::from("/var/lib/picrelay/archive"));
        assert_eq!(cfg.announce_url, "http://127.0.0.1:3002/internal/ingest");
    }

    #[test]
    fn lease_path_lives_under_config() {
        let cfg = OrchestratorConfig::default();
        assert!(cfg.lease_path().ends_with("config/ingest-port.json"));
    }
}
