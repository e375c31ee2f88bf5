//! Command-line interface for exm.
//!
//! Three subcommands mirror the three engine operations: `solve` resolves
//! requirements into fresh locks, `fetch` retrieves registrations at recorded
//! locks, and `ensure` reconciles locks with the requirements before
//! fetching. All document paths have conventional defaults so a plain
//! `exm ensure` in a project directory does the right thing.

pub mod common;
pub mod ensure;
pub mod fetch;
pub mod solve;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ensure::EnsureCommand;
use fetch::FetchCommand;
use solve::SolveCommand;

/// Git-based dependency manager for extension modules.
#[derive(Debug, Parser)]
#[command(name = "exm", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve all requirements to fresh locks
    Solve(SolveCommand),
    /// Fetch registrations at the recorded locks
    Fetch(FetchCommand),
    /// Reconcile locks with the requirements, then fetch
    Ensure(EnsureCommand),
}

impl Cli {
    /// Run the selected subcommand.
    pub async fn run(self) -> Result<()> {
        init_tracing(self.verbose);

        match self.command {
            Commands::Solve(cmd) => cmd.execute().await,
            Commands::Fetch(cmd) => cmd.execute().await,
            Commands::Ensure(cmd) => cmd.execute().await,
        }
    }
}

/// Wire `-v` flags to the subscriber; `EXM_LOG` overrides them entirely.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_env("EXM_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("exm={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
