//! Shared plumbing for the CLI commands: default composition of the engine,
//! flag-to-policy conversion and file-or-stdout output handling.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::core::ExmError;
use crate::git::GitRegistry;
use crate::repository::cache::{CachingRegistry, RepositoryCachingRegistry};
use crate::resolver::{Manager, UpdateAll, UpdatePolicy, UpdateSet};

/// Writing to this path means stdout.
pub const STDOUT_PATH: &str = "-";

/// Default registrations output path.
pub const DEFAULT_REGISTRATIONS_PATH: &str = "registrations.yaml";

/// Build the default engine composition: a git-backed registry, wrapped so
/// every repository handle is opened once per invocation and memoizes its own
/// lookups.
pub fn default_manager() -> Result<Manager> {
    let git = Arc::new(GitRegistry::new()?);
    let per_handle = Arc::new(RepositoryCachingRegistry::new(git));
    let registry = Arc::new(CachingRegistry::new(per_handle));
    Ok(Manager::with_default_solver(registry))
}

/// Convert the `--update-all` / `--update <NAME>` flags into a policy.
pub fn update_policy(update_all: bool, update: &[String]) -> Result<Box<dyn UpdatePolicy>> {
    if update_all && !update.is_empty() {
        return Err(ExmError::UpdateFlagsConflict.into());
    }

    if update_all {
        return Ok(Box::new(UpdateAll));
    }
    Ok(Box::new(UpdateSet::from_names(update)?))
}

/// Write `contents` to `path`, or to stdout when `path` is `-`.
pub fn write_output(path: &str, contents: &str) -> Result<()> {
    if path == STDOUT_PATH {
        std::io::stdout()
            .write_all(contents.as_bytes())
            .context("could not write to stdout")?;
        return Ok(());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("could not create directory {}", parent.display()))?;
    }
    std::fs::write(path, contents)
        .with_context(|| format!("could not write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use crate::models::ModuleKey;

    use super::*;

    #[test]
    fn update_all_and_names_conflict() {
        let err = update_policy(true, &["github.com/example/ext-dns".to_string()]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExmError>(),
            Some(ExmError::UpdateFlagsConflict)
        ));
    }

    #[test]
    fn no_flags_means_update_none() {
        let policy = update_policy(false, &[]).unwrap();
        assert!(!policy.should_update(&ModuleKey::new("github.com/example/ext-dns")));
    }

    #[test]
    fn update_all_updates_everything() {
        let policy = update_policy(true, &[]).unwrap();
        assert!(policy.should_update(&ModuleKey::new("github.com/example/ext-dns")));
    }

    #[test]
    fn named_updates_only_their_modules() {
        let names = vec!["github.com/example/ext-dns".to_string()];
        let policy = update_policy(false, &names).unwrap();
        assert!(policy.should_update(&ModuleKey::new("github.com/example/ext-dns")));
        assert!(!policy.should_update(&ModuleKey::new("github.com/example/ext-os")));
    }

    #[test]
    fn duplicate_update_names_are_rejected() {
        let names = vec![
            "github.com/example/ext-dns".to_string(),
            "github.com/example/ext-dns".to_string(),
        ];
        let err = update_policy(false, &names).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExmError>(),
            Some(ExmError::DuplicateUpdateModule { .. })
        ));
    }
}
