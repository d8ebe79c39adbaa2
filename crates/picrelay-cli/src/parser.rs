//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for the picrelay stack.
#[derive(Parser)]
#[command(name = "picrelay")]
#[command(about = "Orchestrate the local prompt-relay and image-ingest stack")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_accepts_range_overrides() {
        let cli = Cli::parse_from([
            "picrelay",
            "run",
            "--range-start",
            "8100",
            "--range-end",
            "8200",
        ]);
        match cli.command {
            Some(Commands::Run {
                range_start,
                range_end,
                ..
            }) => {
                assert_eq!((range_start, range_end), (8100, 8200));
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn verbose_is_a_global_flag() {
        let cli = Cli::parse_from(["picrelay", "web", "--verbose"]);
        assert!(cli.verbose);
    }
}
