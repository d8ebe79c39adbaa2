//! Entry points for the individually supervised services.

use anyhow::{Context, Result};
use picrelay_axum::{WebConfig, start_server};
use picrelay_core::config::{IngestConfig, lease_path_under};
use picrelay_core::lease::read_lease;
use picrelay_runtime::{ArtifactStore, HttpAnnouncer, IngestServer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

/// Settings for the web bridge service.
pub struct WebArgs {
    pub http_port: u16,
    pub peer_addr: String,
    pub correlation_timeout: Duration,
    pub static_dir: Option<PathBuf>,
}

/// Run the web bridge until the process is terminated.
pub async fn run_web(args: WebArgs) -> Result<()> {
    let mut config = WebConfig::default()
        .with_peer_addr(args.peer_addr)
        .with_correlation_timeout(args.correlation_timeout);
    config.http_port = args.http_port;
    config.static_dir = args.static_dir;
    start_server(config).await
}

/// Run the ingest service on the leased port until terminated.
pub async fn run_ingest(data_root: &Path, http_port: u16) -> Result<()> {
    let lease_path = lease_path_under(data_root);
    let lease = read_lease(&lease_path)
        .with_context(|| format!("no ingest port lease at {}", lease_path.display()))?;

    let config = IngestConfig::from_data_root(data_root, http_port);
    let store = ArtifactStore::from_config(&config);
    store.ensure_dirs().await?;

    let sink = Arc::new(HttpAnnouncer::new(config.announce_url.clone()));
    let server = IngestServer::new(store, sink);

    let addr = format!("{}:{}", config.listen_host, lease.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind leased ingest port {addr}"))?;
    info!(%addr, announce = %config.announce_url, "ingest service starting");
    server.run(listener).await?;
    Ok(())
}
