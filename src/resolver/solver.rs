//! Turns an abstract target into a concrete lock.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use semver::VersionReq;

use crate::core::ExmError;
use crate::models::{Lock, Target};
use crate::repository::{Repository, RepositoryVersion};
use crate::version;

/// Resolves targets against some repository.
#[async_trait]
pub trait TargetSolver: Send + Sync {
    /// Resolve `target` to a concrete lock.
    async fn solve(&self, target: &Target) -> Result<Lock>;
}

/// Builds a [`TargetSolver`] bound to a given repository handle.
pub type SolverFactory = Arc<dyn Fn(Arc<dyn Repository>) -> Arc<dyn TargetSolver> + Send + Sync>;

/// The default factory, producing [`Solver`] instances.
pub fn default_solver_factory() -> SolverFactory {
    Arc::new(|repository| Arc::new(Solver::new(repository)))
}

/// Default [`TargetSolver`]: pure with respect to its bound repository.
pub struct Solver {
    repository: Arc<dyn Repository>,
}

impl Solver {
    /// Bind a solver to `repository`.
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    /// Pick the highest version satisfying `range`.
    ///
    /// Strict `>` comparison: among equal version values the first listed one
    /// is kept, so the selected version value is deterministic regardless of
    /// listing order.
    fn best_version<'a>(
        range: &VersionReq,
        versions: &'a [RepositoryVersion],
    ) -> Option<&'a RepositoryVersion> {
        let mut best: Option<&RepositoryVersion> = None;
        for candidate in versions {
            if range.matches(&candidate.version)
                && best.is_none_or(|b| candidate.version > b.version)
            {
                best = Some(candidate);
            }
        }
        best
    }
}

#[async_trait]
impl TargetSolver for Solver {
    async fn solve(&self, target: &Target) -> Result<Lock> {
        match target {
            Target::Revision(revision) => {
                let hash = self.repository.revision(revision).await?;
                Ok(Lock {
                    target: target.clone(),
                    resolved: Target::Revision(revision.clone()),
                    hash,
                })
            }
            Target::Version(range) => {
                let constraint = version::parse_constraint(range)?;
                let versions = self.repository.versions().await?;
                let best = Self::best_version(&constraint, &versions).ok_or_else(|| {
                    ExmError::NoMatchingVersion {
                        range: range.clone(),
                    }
                })?;

                Ok(Lock {
                    target: target.clone(),
                    resolved: Target::Version(best.name.clone()),
                    hash: best.hash.clone(),
                })
            }
            Target::Branch(branch) => {
                let hash = self.repository.branch(branch).await?;
                Ok(Lock {
                    target: target.clone(),
                    resolved: Target::Branch(branch.clone()),
                    hash,
                })
            }
            Target::Latest => {
                let hash = self.repository.latest().await?;
                Ok(Lock {
                    target: Target::Latest,
                    resolved: Target::Latest,
                    hash,
                })
            }
        }
    }
}
