//! Full-stack orchestration.
//!
//! Startup order is fixed: allocate the ingest port, persist the lease,
//! and only then start the services that read it. Shutdown reverses the
//! dependency: ingest stops before web so no artifact arrives with
//! nobody left to announce to.

use anyhow::{Context, Result};
use picrelay_core::config::{DEFAULT_LISTEN_HOST, OrchestratorConfig};
use picrelay_core::lease::{PortLease, write_lease};
use picrelay_runtime::{ServiceCommand, Supervisor, allocate_port};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Supervised service names.
pub const INGEST_SERVICE: &str = "picrelay-ingest";
pub const WEB_SERVICE: &str = "picrelay-web";

/// Everything the orchestrator needs to run the stack.
pub struct RunArgs {
    pub config: OrchestratorConfig,
    pub peer_addr: String,
    pub static_dir: Option<PathBuf>,
}

/// Command line for the supervised ingest service.
fn ingest_command(exe: &Path, config: &OrchestratorConfig) -> ServiceCommand {
    ServiceCommand::new(exe)
        .with_arg("ingest")
        .with_arg("--data-root")
        .with_arg(config.data_root.display().to_string())
        .with_arg("--http-port")
        .with_arg(config.http_port.to_string())
}

/// Command line for the supervised web service.
fn web_command(exe: &Path, args: &RunArgs) -> ServiceCommand {
    let mut cmd = ServiceCommand::new(exe)
        .with_arg("web")
        .with_arg("--http-port")
        .with_arg(args.config.http_port.to_string())
        .with_arg("--peer-addr")
        .with_arg(args.peer_addr.clone());
    if let Some(dir) = &args.static_dir {
        cmd = cmd
            .with_arg("--static-dir")
            .with_arg(dir.display().to_string());
    }
    cmd
}

/// Run the whole stack until a shutdown signal arrives, then stop every
/// supervised service before returning.
pub async fn run(args: RunArgs) -> Result<()> {
    let config = &args.config;

    // Probe the interface the ingest service itself binds.
    let port = allocate_port(DEFAULT_LISTEN_HOST, config.range_start, config.range_end)?;
    let lease = PortLease::new("ingest", port, config.range_start, config.range_end);
    let lease_path = config.lease_path();
    // The lease must be durable before anything that reads it starts.
    write_lease(&lease_path, &lease)?;
    info!(port, lease = %lease_path.display(), "ingest port leased");

    let exe = std::env::current_exe().context("cannot locate own executable")?;
    let supervisor = Supervisor::new();
    supervisor.start(INGEST_SERVICE, &ingest_command(&exe, config))?;
    supervisor.start(WEB_SERVICE, &web_command(&exe, &args))?;
    info!("stack running, press Ctrl+C to stop");

    wait_for_shutdown_signal().await?;
    info!("shutdown signal received, stopping services");

    if let Err(e) = supervisor.stop_all(&[INGEST_SERVICE, WEB_SERVICE]).await {
        error!(error = %e, "shutdown incomplete");
        return Err(e.into());
    }
    info!("all services stopped");
    Ok(())
}

/// Resolve on Ctrl+C or, on Unix, SIGTERM.
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut term = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result,
            _ = term.recv() => Ok(()),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}
