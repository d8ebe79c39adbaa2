//! Subcommand definitions.

use clap::Subcommand;
use picrelay_core::config::{DEFAULT_HTTP_PORT, DEFAULT_PEER_ADDR, DEFAULT_PORT_RANGE};
use std::path::PathBuf;

/// Available commands for the picrelay stack.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full stack: lease an ingest port, then supervise the
    /// ingest and web services until interrupted
    Run {
        /// Data root holding the port lease and artifact directories
        #[arg(long, env = "PICRELAY_DATA_ROOT", default_value = "picrelay-data")]
        data_root: PathBuf,

        /// Port for the HTTP bridge service
        #[arg(long, default_value_t = DEFAULT_HTTP_PORT)]
        http_port: u16,

        /// Address of the prompt-handling peer (host:port)
        #[arg(long, env = "PICRELAY_PEER_ADDR", default_value = DEFAULT_PEER_ADDR)]
        peer_addr: String,

        /// First port of the ingest scan range
        #[arg(long, default_value_t = DEFAULT_PORT_RANGE.0)]
        range_start: u16,

        /// Last port of the ingest scan range
        #[arg(long, default_value_t = DEFAULT_PORT_RANGE.1)]
        range_end: u16,

        /// Serve a frontend build from this directory
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Run only the web bridge service
    Web {
        /// Port for the HTTP server
        #[arg(long, default_value_t = DEFAULT_HTTP_PORT)]
        http_port: u16,

        /// Address of the prompt-handling peer (host:port)
        #[arg(long, env = "PICRELAY_PEER_ADDR", default_value = DEFAULT_PEER_ADDR)]
        peer_addr: String,

        /// Seconds to wait for an artifact after a relayed prompt
        #[arg(long, default_value_t = 120)]
        correlation_timeout: u64,

        /// Serve a frontend build from this directory
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Run only the image ingest service, binding the leased port
    Ingest {
        /// Data root holding the port lease and artifact directories
        #[arg(long, env = "PICRELAY_DATA_ROOT", default_value = "picrelay-data")]
        data_root: PathBuf,

        /// Port of the bridge service that announcements are POSTed to
        #[arg(long, default_value_t = DEFAULT_HTTP_PORT)]
        http_port: u16,
    },
}
