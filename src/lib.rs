//! exm - Extension Module Manager
//!
//! A Git-based dependency manager for extension modules: git-hosted packages
//! identified by a repository plus an optional submodule path, each shipping
//! a registration artifact. exm resolves declared requirements (an exact
//! revision, a semantic-version range, a branch, or "latest") to concrete,
//! content-addressed locks, verifies the artifact exists at every locked
//! commit, and reconciles previously recorded locks against updated
//! requirements under an update policy — similar in spirit to how Cargo
//! reconciles `Cargo.toml` with `Cargo.lock`.
//!
//! # Architecture Overview
//!
//! - [`models`] - Domain types: module keys, targets, requirements, locks
//! - [`resolver`] - The engine: target solver, per-repository interface,
//!   orchestration of `solve`/`fetch`/`ensure`, update policies
//! - [`repository`] - Capability traits for repository access, plus the
//!   caching decorators that memoize lookups within one invocation
//! - [`git`] - The git-backed implementation (system git, like Cargo)
//! - [`manifest`] / [`lockfile`] - The `extensions.toml` / `extensions.lock`
//!   documents
//! - [`registration`] - Parsing of fetched registration artifacts
//! - [`cli`] - Command-line surface (`solve`, `fetch`, `ensure`)
//! - [`core`] - Typed error variants shared across the crate
//!
//! # Key Properties
//!
//! - **Reproducible**: locks pin exact commits, verified to contain the
//!   module's artifact
//! - **Sticky version locks**: a lock whose resolved version still satisfies
//!   the requirement's range is reused without touching the network
//! - **All-or-nothing**: aggregate operations fail fast on the first
//!   module-level error, wrapped with the offending module key
//! - **Independent modules**: there is no dependency graph between modules,
//!   so they resolve concurrently
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use exm::git::GitRegistry;
//! use exm::models::Requirements;
//! use exm::repository::cache::{CachingRegistry, RepositoryCachingRegistry};
//! use exm::resolver::{Manager, UpdateSet};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let requirements = Requirements::parse(
//!     r#"
//!     version = 1
//!
//!     [[modules]]
//!     name = "github.com/example/ext-dns"
//!     version = ">=1.0.0, <2.0.0"
//!     "#,
//! )?;
//!
//! let git = Arc::new(GitRegistry::new()?);
//! let registry = Arc::new(CachingRegistry::new(Arc::new(
//!     RepositoryCachingRegistry::new(git),
//! )));
//! let manager = Manager::with_default_solver(registry);
//!
//! let locks = manager.ensure(&requirements, None, &UpdateSet::none()).await?;
//! let registrations = manager.fetch(&requirements, &locks).await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod core;
pub mod git;
pub mod lockfile;
pub mod manifest;
pub mod models;
pub mod registration;
pub mod repository;
pub mod resolver;
pub mod version;
