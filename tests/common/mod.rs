//! Git fixture helpers for integration tests.
//!
//! Fixture repositories are real git repositories built in temp directories
//! with the system git binary, so the tests exercise the same code paths the
//! CLI does against remote repositories — clone, fetch, rev-parse, cat-file.

#![allow(dead_code)] // not every helper is used by every test binary

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};

/// The default registration artifact used by fixture modules.
pub const ARTIFACT: &str = "\
kind: ExtensionRegistration
name: dns
---
kind: ExtensionDeployment
name: dns
";

/// Drives the system git binary against one fixture repository.
pub struct TestGit {
    path: PathBuf,
}

impl TestGit {
    /// Initialize a fresh repository at `path` with a deterministic setup:
    /// `main` as the initial branch, a fixed identity, and signing off.
    pub fn init(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;
        let repo = Self {
            path: path.to_path_buf(),
        };

        repo.git(&["init", "--quiet"])?;
        // Branch name must not depend on the host's init.defaultBranch.
        repo.git(&["symbolic-ref", "HEAD", "refs/heads/main"])?;
        repo.git(&["config", "user.name", "Test Fixture"])?;
        repo.git(&["config", "user.email", "fixture@example.com"])?;
        repo.git(&["config", "commit.gpgsign", "false"])?;
        repo.git(&["config", "tag.gpgsign", "false"])?;

        Ok(repo)
    }

    /// Where the repository lives.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run git with `args`, returning trimmed stdout.
    pub fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.path)
            .output()
            .with_context(|| format!("could not run git {args:?}"))?;

        if !output.status.success() {
            bail!(
                "git {args:?} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Write a file relative to the repository root.
    pub fn write(&self, relative: &str, contents: &str) -> Result<()> {
        let path = self.path.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Stage everything and commit, returning the new commit hash.
    pub fn commit_all(&self, message: &str) -> Result<String> {
        self.git(&["add", "-A"])?;
        self.git(&["commit", "--quiet", "-m", message])?;
        self.head()
    }

    /// Create a lightweight tag at HEAD.
    pub fn tag(&self, name: &str) -> Result<()> {
        self.git(&["tag", name])?;
        Ok(())
    }

    /// Create an annotated tag at HEAD.
    pub fn annotated_tag(&self, name: &str) -> Result<()> {
        self.git(&["tag", "-a", name, "-m", name])?;
        Ok(())
    }

    /// Create a branch at HEAD.
    pub fn branch(&self, name: &str) -> Result<()> {
        self.git(&["branch", name])?;
        Ok(())
    }

    /// The commit hash HEAD points at.
    pub fn head(&self) -> Result<String> {
        self.git(&["rev-parse", "HEAD"])
    }
}

/// Build a fixture module repository with an artifact at the root and two
/// tagged releases; returns the repo and the hashes of (v1.0.0, v1.2.0).
pub fn module_repo(path: &Path) -> Result<(TestGit, String, String)> {
    let repo = TestGit::init(path)?;

    repo.write("extension.yaml", ARTIFACT)?;
    repo.write("README.md", "# dns module\n")?;
    let first = repo.commit_all("initial release")?;
    repo.tag("v1.0.0")?;

    repo.write("README.md", "# dns module\n\nNow with docs.\n")?;
    let second = repo.commit_all("second release")?;
    repo.annotated_tag("v1.2.0")?;

    Ok((repo, first, second))
}
