use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use exm::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = cli.run().await {
        eprintln!("{} {err:#}", "error:".red().bold());
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
