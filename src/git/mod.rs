//! Git-backed implementation of the repository capabilities.
//!
//! Uses the system `git` binary rather than an embedded implementation, the
//! same way Cargo does: authentication, transports and proxies then behave
//! exactly as the user's git configuration says they should.
//!
//! [`GitRegistry`] keeps a cache directory of bare clones, one per
//! repository, keyed by a sanitized form of the URL:
//!
//! ```text
//! ~/.exm/cache/
//! ├── github.com_example_ext-dns.git
//! └── github.com_example_extensions.git
//! ```
//!
//! Opening a repository clones it on first use and fetches on reuse, so
//! within one invocation every lookup is answered from the local clone.
//! `EXM_CACHE_DIR` overrides the cache location.

pub mod command;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::core::ExmError;
use crate::repository::{Repository, RepositoryRegistry, RepositoryVersion};
use crate::version::parse_version;

use command::GitCommand;

/// Environment variable overriding the clone cache location.
pub const CACHE_DIR_ENV: &str = "EXM_CACHE_DIR";

/// Opens git repositories by URL, caching bare clones on disk.
pub struct GitRegistry {
    cache_dir: PathBuf,
}

impl GitRegistry {
    /// Registry with the default cache location (`~/.exm/cache`, or
    /// `EXM_CACHE_DIR` when set).
    pub fn new() -> Result<Self> {
        if let Ok(dir) = std::env::var(CACHE_DIR_ENV) {
            return Ok(Self::with_dir(PathBuf::from(dir)));
        }

        let home = dirs::home_dir().ok_or_else(|| anyhow!("could not determine home directory"))?;
        Ok(Self::with_dir(home.join(".exm").join("cache")))
    }

    /// Registry with an explicit cache directory.
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Turn a repository name into something git can clone.
    ///
    /// Names with a scheme pass through; a name that is an existing local
    /// path becomes its absolute form (the clone's origin must stay valid
    /// when git later runs inside the cache directory); anything else gets
    /// `https://` prepended, so `github.com/example/ext-dns` just works.
    fn clone_url(name: &str) -> String {
        if name.contains("://") {
            return name.to_string();
        }
        match std::fs::canonicalize(name) {
            Ok(path) => path.to_string_lossy().into_owned(),
            Err(_) => format!("https://{name}"),
        }
    }

    /// Directory for the bare clone of `url` inside the cache.
    fn clone_dir(&self, url: &str) -> PathBuf {
        let stripped = url.split_once("://").map_or(url, |(_, rest)| rest);
        let sanitized: String = stripped
            .trim_matches('/')
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' => c,
                _ => '_',
            })
            .collect();
        self.cache_dir.join(format!("{sanitized}.git"))
    }
}

#[async_trait]
impl RepositoryRegistry for GitRegistry {
    async fn repository(&self, name: &str) -> Result<Arc<dyn Repository>> {
        let url = Self::clone_url(name);
        let dir = self.clone_dir(&url);

        if dir.join("HEAD").exists() {
            debug!(repository = %url, dir = %dir.display(), "fetching cached clone");
            GitCommand::new("fetch")
                .args(["--prune", "--force", "origin"])
                .arg("+refs/heads/*:refs/heads/*")
                .arg("+refs/tags/*:refs/tags/*")
                .current_dir(&dir)
                .run()
                .await
                .with_context(|| format!("could not fetch repository {url}"))?;
        } else {
            debug!(repository = %url, dir = %dir.display(), "cloning");
            tokio::fs::create_dir_all(&self.cache_dir)
                .await
                .with_context(|| {
                    format!("could not create cache directory {}", self.cache_dir.display())
                })?;
            GitCommand::new("clone")
                .arg("--bare")
                .arg(&url)
                .arg(&dir)
                .run()
                .await
                .with_context(|| format!("could not clone repository {url}"))?;
        }

        Ok(Arc::new(GitRepository::new(dir)))
    }
}

/// Lookups against one bare clone.
pub struct GitRepository {
    path: PathBuf,
}

impl GitRepository {
    /// Repository handle over an existing (bare) clone.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn rev_parse(&self, spec: &str) -> GitCommand {
        GitCommand::new("rev-parse")
            .args(["--verify", "--quiet"])
            .arg(spec)
            .current_dir(&self.path)
    }
}

#[async_trait]
impl Repository for GitRepository {
    async fn revision(&self, name: &str) -> Result<String> {
        // ^{commit} peels annotated tags and rejects non-commit objects.
        self.rev_parse(&format!("{name}^{{commit}}"))
            .stdout_string()
            .await
            .map_err(|_| {
                ExmError::RevisionNotFound {
                    name: name.to_string(),
                }
                .into()
            })
    }

    async fn branch(&self, name: &str) -> Result<String> {
        self.rev_parse(&format!("refs/heads/{name}"))
            .stdout_string()
            .await
            .map_err(|_| {
                ExmError::BranchNotFound {
                    name: name.to_string(),
                }
                .into()
            })
    }

    async fn versions(&self) -> Result<Vec<RepositoryVersion>> {
        let listing = GitCommand::new("for-each-ref")
            .arg("--format=%(refname:short) %(objectname) %(*objectname)")
            .arg("refs/tags")
            .current_dir(&self.path)
            .stdout_string()
            .await?;

        let mut versions = Vec::new();
        for line in listing.lines() {
            let mut fields = line.split_whitespace();
            let (Some(name), Some(object)) = (fields.next(), fields.next()) else {
                continue;
            };
            // Annotated tags carry the peeled commit in the third field.
            let hash = fields.next().unwrap_or(object);

            let Ok(version) = parse_version(name) else {
                continue;
            };
            versions.push(RepositoryVersion {
                name: name.to_string(),
                hash: hash.to_string(),
                version,
            });
        }

        Ok(versions)
    }

    async fn latest(&self) -> Result<String> {
        self.rev_parse("HEAD").stdout_string().await
    }

    async fn file(&self, hash: &str, path: &str) -> Result<Vec<u8>> {
        GitCommand::new("cat-file")
            .arg("blob")
            .arg(format!("{hash}:{path}"))
            .current_dir(&self.path)
            .stdout_bytes()
            .await
            .map_err(|_| {
                ExmError::FileNotFound {
                    hash: hash.to_string(),
                    path: path.to_string(),
                }
                .into()
            })
    }

    async fn has_file(&self, hash: &str, path: &str) -> Result<bool> {
        // A failed probe means "nothing at this hash and path"; per contract
        // that is false, not an error.
        GitCommand::new("cat-file")
            .arg("-e")
            .arg(format!("{hash}:{path}"))
            .current_dir(&self.path)
            .success()
            .await
    }
}
