//! `exm solve`: resolve every requirement and write the locks document.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::lockfile::DEFAULT_LOCKS_PATH;
use crate::manifest::DEFAULT_REQUIREMENTS_PATH;
use crate::models::Requirements;

use super::common::default_manager;

/// Resolve all requirements to fresh locks.
///
/// Every declared module is resolved from scratch — prior locks are ignored
/// and overwritten. Use `exm ensure` to reconcile with existing locks
/// instead.
#[derive(Debug, Args)]
pub struct SolveCommand {
    /// Path to the requirements file
    #[arg(long, default_value = DEFAULT_REQUIREMENTS_PATH)]
    requirements: PathBuf,

    /// Path to the locks file to write
    #[arg(long, default_value = DEFAULT_LOCKS_PATH)]
    locks: PathBuf,
}

impl SolveCommand {
    pub async fn execute(self) -> Result<()> {
        let requirements = Requirements::load(&self.requirements)?;
        let manager = default_manager()?;

        let locks = manager.solve(&requirements).await?;
        locks.save(&self.locks)?;

        println!(
            "{} {} module(s), locks written to {}",
            "Solved".green().bold(),
            locks.len(),
            self.locks.display()
        );
        Ok(())
    }
}
