//! Per-repository façade: verification, staleness decisions and fetch.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::core::ExmError;
use crate::models::{Lock, Requirement, Target};
use crate::registration::{self, Registration};
use crate::repository::Repository;
use crate::version;

use super::solver::TargetSolver;

/// Compute the artifact path for a module.
///
/// Repository paths always join with `/`, never the platform separator.
pub fn artifact_path(submodule: Option<&str>, filename: &str) -> String {
    match submodule {
        Some(submodule) if !submodule.is_empty() => format!("{submodule}/{filename}"),
        _ => filename.to_string(),
    }
}

/// Does a previously recorded lock still satisfy the requirement?
///
/// Version requirements are sticky: the lock is reused as long as its
/// *resolved* version still falls inside the (possibly changed) range, which
/// avoids re-listing tags for slowly-changing ranges. Every other target kind
/// is reused only when the requirement's target equals the lock's recorded
/// target exactly. A malformed range or resolved version counts as
/// unsatisfied and forces re-resolution.
fn is_requirement_satisfied_by_lock(requirement: &Requirement, lock: &Lock) -> bool {
    let (Target::Version(range), Target::Version(resolved)) =
        (&requirement.target, &lock.resolved)
    else {
        return requirement.target == lock.target;
    };

    let Ok(constraint) = version::parse_constraint(range) else {
        return false;
    };
    let Ok(resolved) = version::parse_version(resolved) else {
        return false;
    };

    constraint.matches(&resolved)
}

/// Bundles one solver and one repository for a module repository.
///
/// All operations take the module's submodule path explicitly so one
/// interface serves every module living in the same repository.
pub struct RepositoryInterface {
    solver: Arc<dyn TargetSolver>,
    repository: Arc<dyn Repository>,
}

impl RepositoryInterface {
    /// Bundle `solver` and `repository`.
    pub fn new(solver: Arc<dyn TargetSolver>, repository: Arc<dyn Repository>) -> Self {
        Self { solver, repository }
    }

    /// Resolve a target through the bound solver.
    pub async fn solve_target(&self, target: &Target) -> Result<Lock> {
        self.solver.solve(target).await
    }

    /// Check that the lock's commit actually contains the module's artifact.
    ///
    /// # Errors
    ///
    /// [`ExmError::LockMissingArtifact`] when the file is absent.
    pub async fn verify(
        &self,
        submodule: Option<&str>,
        requirement: &Requirement,
        lock: &Lock,
    ) -> Result<()> {
        let path = artifact_path(submodule, &requirement.filename);
        if !self.repository.has_file(&lock.hash, &path).await? {
            return Err(ExmError::LockMissingArtifact {
                lock: lock.to_string(),
                path,
            }
            .into());
        }
        Ok(())
    }

    /// Resolve the requirement and verify the artifact exists at the result.
    pub async fn solve(&self, submodule: Option<&str>, requirement: &Requirement) -> Result<Lock> {
        let lock = self.solve_target(&requirement.target).await?;
        self.verify(submodule, requirement, &lock).await?;
        Ok(lock)
    }

    /// Reconcile a requirement with an optional prior lock.
    ///
    /// Re-resolves when there is no prior lock, when `update` forces it, or
    /// when the prior lock no longer satisfies the requirement; otherwise the
    /// prior resolution and hash are kept. Either way the returned lock's
    /// `target` reflects the current requirement, and the artifact is
    /// verified even for reused locks so an upstream deletion is still
    /// caught.
    pub async fn ensure(
        &self,
        submodule: Option<&str>,
        requirement: &Requirement,
        lock: Option<&Lock>,
        update: bool,
    ) -> Result<Lock> {
        let mut lock = match lock {
            Some(existing) if !update && is_requirement_satisfied_by_lock(requirement, existing) => {
                existing.clone()
            }
            _ => self.solve_target(&requirement.target).await?,
        };
        lock.target = requirement.target.clone();

        self.verify(submodule, requirement, &lock).await?;
        Ok(lock)
    }

    /// Fetch the module's artifact at the locked commit and parse it into
    /// registration documents.
    pub async fn fetch(
        &self,
        submodule: Option<&str>,
        requirement: &Requirement,
        lock: &Lock,
    ) -> Result<Vec<Registration>> {
        let path = artifact_path(submodule, &requirement.filename);
        let data = self
            .repository
            .file(&lock.hash, &path)
            .await
            .with_context(|| format!("error getting file with hash {} at {}", lock.hash, path))?;

        registration::parse(&data)
    }
}
