//! `exm fetch`: fetch registrations at the recorded locks.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::lockfile::DEFAULT_LOCKS_PATH;
use crate::manifest::DEFAULT_REQUIREMENTS_PATH;
use crate::models::{Locks, Requirements};
use crate::registration;

use super::common::{default_manager, write_output, DEFAULT_REGISTRATIONS_PATH};

/// Fetch every module's registration documents at its locked commit.
///
/// Requires a lock for every declared module; fetch never resolves
/// implicitly.
#[derive(Debug, Args)]
pub struct FetchCommand {
    /// Path to the requirements file
    #[arg(long, default_value = DEFAULT_REQUIREMENTS_PATH)]
    requirements: PathBuf,

    /// Path to the locks file
    #[arg(long, default_value = DEFAULT_LOCKS_PATH)]
    locks: PathBuf,

    /// Path to write the registrations to (`-` for stdout)
    #[arg(long, default_value = DEFAULT_REGISTRATIONS_PATH)]
    registrations: String,
}

impl FetchCommand {
    pub async fn execute(self) -> Result<()> {
        let requirements = Requirements::load(&self.requirements)?;
        let locks = Locks::load(&self.locks)?;
        let manager = default_manager()?;

        let registrations = manager.fetch(&requirements, &locks).await?;
        write_output(
            &self.registrations,
            &registration::to_yaml_stream(&registrations)?,
        )?;

        eprintln!(
            "{} {} registration document(s)",
            "Fetched".green().bold(),
            registrations.len()
        );
        Ok(())
    }
}
