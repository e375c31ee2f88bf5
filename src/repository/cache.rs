//! Caching decorators over [`Repository`] and [`RepositoryRegistry`].
//!
//! Resolution touches the same repository data repeatedly: every module in a
//! repository lists the same tags, and `ensure` verifies files at hashes that
//! `solve` just produced. The decorators here memoize those lookups for the
//! duration of one invocation without changing observable semantics.
//!
//! Caching discipline:
//! - every cache is write-once per key and never invalidated (these wrap a
//!   single short-lived resolution pass, not a long-running process);
//! - a miss performs exactly one call into the wrapped object, a hit performs
//!   zero;
//! - errors are propagated and never cached, so the next lookup retries;
//! - no lock is held across an underlying call: per-argument caches probe and
//!   insert around the call, whole-result caches use single-flight cells.
//!
//! [`Repository::file`] is deliberately not cached: artifact contents can be
//! large and each fetch is a single pass-through.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::OnceCell;

use super::{Repository, RepositoryRegistry, RepositoryVersion};

/// Memoizes lookups against a single wrapped [`Repository`].
///
/// `revision`/`branch` are cached per name, `has_file` per `(hash, path)`
/// pair, and `versions`/`latest` as whole results computed at most once.
pub struct CachingRepository {
    inner: Arc<dyn Repository>,
    revisions: DashMap<String, String>,
    branches: DashMap<String, String>,
    versions: OnceCell<Vec<RepositoryVersion>>,
    latest: OnceCell<String>,
    has_file: DashMap<(String, String), bool>,
}

impl CachingRepository {
    /// Wrap `inner` with fresh, empty caches.
    pub fn new(inner: Arc<dyn Repository>) -> Self {
        Self {
            inner,
            revisions: DashMap::new(),
            branches: DashMap::new(),
            versions: OnceCell::new(),
            latest: OnceCell::new(),
            has_file: DashMap::new(),
        }
    }
}

#[async_trait]
impl Repository for CachingRepository {
    async fn revision(&self, name: &str) -> Result<String> {
        if let Some(hash) = self.revisions.get(name) {
            return Ok(hash.clone());
        }

        let hash = self.inner.revision(name).await?;
        // First writer wins so racing lookups stay consistent.
        Ok(self
            .revisions
            .entry(name.to_string())
            .or_insert(hash)
            .clone())
    }

    async fn branch(&self, name: &str) -> Result<String> {
        if let Some(hash) = self.branches.get(name) {
            return Ok(hash.clone());
        }

        let hash = self.inner.branch(name).await?;
        Ok(self
            .branches
            .entry(name.to_string())
            .or_insert(hash)
            .clone())
    }

    async fn versions(&self) -> Result<Vec<RepositoryVersion>> {
        let versions = self
            .versions
            .get_or_try_init(|| self.inner.versions())
            .await?;
        Ok(versions.clone())
    }

    async fn latest(&self) -> Result<String> {
        let latest = self.latest.get_or_try_init(|| self.inner.latest()).await?;
        Ok(latest.clone())
    }

    async fn file(&self, hash: &str, path: &str) -> Result<Vec<u8>> {
        self.inner.file(hash, path).await
    }

    async fn has_file(&self, hash: &str, path: &str) -> Result<bool> {
        let key = (hash.to_string(), path.to_string());
        if let Some(known) = self.has_file.get(&key) {
            return Ok(*known);
        }

        let known = self.inner.has_file(hash, path).await?;
        Ok(*self.has_file.entry(key).or_insert(known))
    }
}

/// Memoizes [`RepositoryRegistry::repository`] per name.
///
/// Repeated lookups of the same name return the same handle, so the handle's
/// own caches are shared too. At most one open is in flight per name; a
/// failed open leaves the slot empty so the next lookup retries.
pub struct CachingRegistry {
    inner: Arc<dyn RepositoryRegistry>,
    repositories: DashMap<String, Arc<OnceCell<Arc<dyn Repository>>>>,
}

impl CachingRegistry {
    /// Wrap `inner` with an empty handle cache.
    pub fn new(inner: Arc<dyn RepositoryRegistry>) -> Self {
        Self {
            inner,
            repositories: DashMap::new(),
        }
    }
}

#[async_trait]
impl RepositoryRegistry for CachingRegistry {
    async fn repository(&self, name: &str) -> Result<Arc<dyn Repository>> {
        let cell = self
            .repositories
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let repository = cell
            .get_or_try_init(|| self.inner.repository(name))
            .await?;
        Ok(repository.clone())
    }
}

/// Alternative composition: opens a fresh handle through the inner registry
/// on every call and wraps it in a [`CachingRepository`] before returning it.
///
/// Use when the registry itself is cheap to call but handle reuse across
/// calls is not required.
pub struct RepositoryCachingRegistry {
    inner: Arc<dyn RepositoryRegistry>,
}

impl RepositoryCachingRegistry {
    /// Wrap `inner`.
    pub fn new(inner: Arc<dyn RepositoryRegistry>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl RepositoryRegistry for RepositoryCachingRegistry {
    async fn repository(&self, name: &str) -> Result<Arc<dyn Repository>> {
        let repository = self.inner.repository(name).await?;
        Ok(Arc::new(CachingRepository::new(repository)))
    }
}
