//! `exm ensure`: reconcile locks with the requirements, then fetch.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::lockfile::DEFAULT_LOCKS_PATH;
use crate::manifest::DEFAULT_REQUIREMENTS_PATH;
use crate::models::{Locks, Requirements};
use crate::registration;

use super::common::{default_manager, update_policy, write_output, DEFAULT_REGISTRATIONS_PATH};

/// Bring locks and registrations up to date with the requirements.
///
/// Satisfied locks are reused as-is; everything else is re-resolved. The new
/// locks document is written first, then the registrations are fetched at the
/// locked commits and written too.
#[derive(Debug, Args)]
pub struct EnsureCommand {
    /// Path to the requirements file
    #[arg(long, default_value = DEFAULT_REQUIREMENTS_PATH)]
    requirements: PathBuf,

    /// Path to the locks file
    #[arg(long, default_value = DEFAULT_LOCKS_PATH)]
    locks: PathBuf,

    /// Path to write the registrations to (`-` for stdout)
    #[arg(long, default_value = DEFAULT_REGISTRATIONS_PATH)]
    registrations: String,

    /// Re-resolve these modules even when their locks are satisfied
    #[arg(long = "update", value_name = "NAME", conflicts_with = "update_all")]
    update: Vec<String>,

    /// Re-resolve every module
    #[arg(long)]
    update_all: bool,
}

impl EnsureCommand {
    pub async fn execute(self) -> Result<()> {
        let policy = update_policy(self.update_all, &self.update)?;
        let requirements = Requirements::load(&self.requirements)?;
        // A missing locks file just means a first run.
        let old_locks = Locks::load_if_exists(&self.locks)?;
        let manager = default_manager()?;

        let locks = manager
            .ensure(&requirements, old_locks.as_ref(), policy.as_ref())
            .await?;
        locks.save(&self.locks)?;

        let registrations = manager.fetch(&requirements, &locks).await?;
        write_output(
            &self.registrations,
            &registration::to_yaml_stream(&registrations)?,
        )?;

        eprintln!(
            "{} {} module(s): locks in {}, registrations in {}",
            "Ensured".green().bold(),
            locks.len(),
            self.locks.display(),
            self.registrations
        );
        Ok(())
    }
}
