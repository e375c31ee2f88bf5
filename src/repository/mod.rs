//! Capability traits for version-control repository access.
//!
//! The resolution engine never talks to a backend directly; it goes through
//! [`Repository`] (per-repository lookups) and [`RepositoryRegistry`]
//! (opening handles by name). The git-backed implementations live in
//! [`crate::git`]; the caching decorators in [`cache`] wrap any
//! implementation without changing observable semantics.

pub mod cache;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use semver::Version;

/// One tag entry returned by a repository's version listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryVersion {
    /// Tag name as it appears in the repository, e.g. `v1.2.0`
    pub name: String,
    /// Commit hash the tag points at (peeled for annotated tags)
    pub hash: String,
    /// The tag name parsed as a semantic version
    pub version: Version,
}

/// Lookups against a single version-controlled repository.
///
/// Implementations report "not found" for absent revisions, branches and
/// files as errors, except [`has_file`](Repository::has_file), which reports
/// a missing file as `Ok(false)`.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Resolve an exact commit-ish string to a canonical commit hash.
    async fn revision(&self, name: &str) -> Result<String>;

    /// Resolve a branch head to a commit hash.
    async fn branch(&self, name: &str) -> Result<String>;

    /// List all tags parseable as semantic versions.
    ///
    /// Tags that do not parse are skipped, not an error.
    async fn versions(&self) -> Result<Vec<RepositoryVersion>>;

    /// Resolve the repository's default reference to a commit hash.
    async fn latest(&self) -> Result<String>;

    /// Fetch raw file contents at a commit.
    async fn file(&self, hash: &str, path: &str) -> Result<Vec<u8>>;

    /// Test file existence at a commit without fetching contents.
    async fn has_file(&self, hash: &str, path: &str) -> Result<bool>;
}

/// Opens [`Repository`] handles by repository name.
#[async_trait]
pub trait RepositoryRegistry: Send + Sync {
    /// Open (or clone) a handle for the named repository.
    async fn repository(&self, name: &str) -> Result<Arc<dyn Repository>>;
}
