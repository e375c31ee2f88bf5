//! Resolution engine: target solving, per-repository interfaces and the
//! orchestration of `solve`/`fetch`/`ensure` across module keys.
//!
//! The [`Manager`] is the top-level entry point. It holds a repository
//! registry and a solver factory, obtains a [`RepositoryInterface`] per
//! distinct repository, and dispatches every declared module as its own task:
//! module keys are independent (there is no dependency graph between
//! modules), so they resolve concurrently, joined fail-fast. Aggregate
//! operations are all-or-nothing — the first module-level failure aborts the
//! whole call, wrapped with the offending module key.

pub mod interface;
pub mod solver;

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future;
use tracing::{debug, info};

use crate::core::ExmError;
use crate::models::{Locks, ModuleKey, Requirements};
use crate::registration::Registration;
use crate::repository::RepositoryRegistry;

pub use interface::{artifact_path, RepositoryInterface};
pub use solver::{default_solver_factory, Solver, SolverFactory, TargetSolver};

/// The caller's choice of which modules must be re-resolved regardless of
/// satisfaction.
pub trait UpdatePolicy: std::fmt::Debug + Send + Sync {
    /// Should this module be forced to update?
    fn should_update(&self, key: &ModuleKey) -> bool;
}

/// Forces every module to update.
#[derive(Debug)]
pub struct UpdateAll;

impl UpdatePolicy for UpdateAll {
    fn should_update(&self, _key: &ModuleKey) -> bool {
        true
    }
}

/// Forces an explicit set of modules to update; the empty set updates none.
#[derive(Debug, Default)]
pub struct UpdateSet {
    keys: HashSet<ModuleKey>,
}

impl UpdateSet {
    /// Policy updating exactly the given keys.
    pub fn new(keys: impl IntoIterator<Item = ModuleKey>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// Policy updating nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Build the policy from raw module names.
    ///
    /// # Errors
    ///
    /// Rejects names that do not parse as module keys and names that resolve
    /// to the same module key twice.
    pub fn from_names<I, S>(names: I) -> Result<Self, ExmError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keys = HashSet::new();
        for name in names {
            let key = ModuleKey::parse(name.as_ref())?;
            if !keys.insert(key.clone()) {
                return Err(ExmError::DuplicateUpdateModule {
                    module: key.to_string(),
                });
            }
        }
        Ok(Self { keys })
    }
}

impl UpdatePolicy for UpdateSet {
    fn should_update(&self, key: &ModuleKey) -> bool {
        self.keys.contains(key)
    }
}

/// Top-level resolution engine.
pub struct Manager {
    registry: Arc<dyn RepositoryRegistry>,
    solver_factory: SolverFactory,
}

impl Manager {
    /// Build a manager over `registry` using `solver_factory` to construct a
    /// solver per repository handle.
    pub fn new(registry: Arc<dyn RepositoryRegistry>, solver_factory: SolverFactory) -> Self {
        Self {
            registry,
            solver_factory,
        }
    }

    /// Build a manager with the default target solver.
    pub fn with_default_solver(registry: Arc<dyn RepositoryRegistry>) -> Self {
        Self::new(registry, default_solver_factory())
    }

    /// Obtain the bound interface for a named repository.
    pub async fn repository(&self, name: &str) -> Result<RepositoryInterface> {
        let repository = self.registry.repository(name).await?;
        let solver = (self.solver_factory)(repository.clone());
        Ok(RepositoryInterface::new(solver, repository))
    }

    /// Resolve every requirement to a verified lock.
    ///
    /// All-or-nothing: the first failing module aborts the call.
    pub async fn solve(&self, requirements: &Requirements) -> Result<Locks> {
        let tasks = requirements.iter().map(|(key, requirement)| async move {
            debug!(module = %key, target = %requirement.target, "solving");

            let interface = self
                .repository(&key.repository)
                .await
                .with_context(|| format!("could not retrieve repository for {key}"))?;

            let lock = interface
                .solve(key.submodule.as_deref(), requirement)
                .await
                .with_context(|| {
                    format!(
                        "could not solve requirement {} for extension {key}",
                        requirement.target
                    )
                })?;

            info!(module = %key, lock = %lock, "solved");
            Ok::<_, anyhow::Error>((key.clone(), lock))
        });

        Ok(future::try_join_all(tasks).await?.into_iter().collect())
    }

    /// Fetch and parse the registration documents of every requirement at its
    /// recorded lock.
    ///
    /// Fetch never resolves implicitly: a module without a recorded lock is a
    /// consistency error, raised before any repository access for that
    /// module. Within a module the documents preserve their source order.
    pub async fn fetch(
        &self,
        requirements: &Requirements,
        locks: &Locks,
    ) -> Result<Vec<Registration>> {
        let tasks = requirements.iter().map(|(key, requirement)| async move {
            debug!(module = %key, target = %requirement.target, "fetching");

            let lock = locks.get(key).ok_or_else(|| ExmError::NoLockRecorded {
                module: key.to_string(),
            })?;

            let interface = self
                .repository(&key.repository)
                .await
                .with_context(|| format!("could not retrieve repository for {key}"))?;

            let registrations = interface
                .fetch(key.submodule.as_deref(), requirement, lock)
                .await
                .with_context(|| format!("could not fetch registrations for {key}"))?;

            info!(module = %key, documents = registrations.len(), "fetched");
            Ok::<_, anyhow::Error>(registrations)
        });

        let per_module = future::try_join_all(tasks).await?;
        Ok(per_module.into_iter().flatten().collect())
    }

    /// Reconcile requirements with previously recorded locks under an update
    /// policy, producing a fresh locks mapping.
    ///
    /// The result contains exactly one entry per requirement; locks for
    /// modules no longer declared are dropped.
    pub async fn ensure(
        &self,
        requirements: &Requirements,
        locks: Option<&Locks>,
        update_policy: &dyn UpdatePolicy,
    ) -> Result<Locks> {
        let tasks = requirements.iter().map(|(key, requirement)| async move {
            let update = update_policy.should_update(key);
            debug!(module = %key, target = %requirement.target, update, "ensuring");

            let interface = self
                .repository(&key.repository)
                .await
                .with_context(|| format!("could not retrieve repository for {key}"))?;

            let old_lock = locks.and_then(|locks| locks.get(key));
            if let Some(old_lock) = old_lock {
                debug!(module = %key, lock = %old_lock, "old lock found");
            }

            let lock = interface
                .ensure(key.submodule.as_deref(), requirement, old_lock, update)
                .await
                .with_context(|| {
                    format!(
                        "could not ensure requirement {} for {key}",
                        requirement.target
                    )
                })?;

            info!(module = %key, lock = %lock, "ensured");
            Ok::<_, anyhow::Error>((key.clone(), lock))
        });

        Ok(future::try_join_all(tasks).await?.into_iter().collect())
    }
}
