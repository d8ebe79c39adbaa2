//! CLI entry point - the composition root.
//!
//! Each subcommand is one deployable role: `run` supervises the whole
//! stack, `web` and `ingest` are the individually supervised services
//! that `run` spawns with the same binary.

use clap::Parser;
use picrelay_cli::{Cli, Commands, orchestrate, services};
use picrelay_core::config::OrchestratorConfig;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Run {
            data_root,
            http_port,
            peer_addr,
            range_start,
            range_end,
            static_dir,
        } => {
            orchestrate::run(orchestrate::RunArgs {
                config: OrchestratorConfig {
                    range_start,
                    range_end,
                    data_root,
                    http_port,
                },
                peer_addr,
                static_dir,
            })
            .await?;
        }
        Commands::Web {
            http_port,
            peer_addr,
            correlation_timeout,
            static_dir,
        } => {
            services::run_web(services::WebArgs {
                http_port,
                peer_addr,
                correlation_timeout: Duration::from_secs(correlation_timeout),
                static_dir,
            })
            .await?;
        }
        Commands::Ingest {
            data_root,
            http_port,
        } => {
            services::run_ingest(&data_root, http_port).await?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;
    let default_directive = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
