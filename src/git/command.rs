//! Thin builder around invocations of the system `git` binary.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::trace;

use crate::core::ExmError;

/// One git invocation: subcommand, arguments, optional working directory.
///
/// Output is always captured; callers pick between checked helpers that turn
/// a non-zero exit into [`ExmError::GitCommandFailed`] and
/// [`GitCommand::success`] for probes where failure is an answer.
pub struct GitCommand {
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl GitCommand {
    /// Start building `git <subcommand>`.
    pub fn new(subcommand: &str) -> Self {
        Self {
            args: vec![subcommand.to_string()],
            current_dir: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Run inside `dir` instead of the process working directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    fn display(&self) -> String {
        self.args.join(" ")
    }

    async fn output(&self) -> Result<Output> {
        trace!(command = %self.display(), "running git");

        let mut command = Command::new("git");
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }

        command
            .output()
            .await
            .with_context(|| format!("could not run git {}", self.display()))
    }

    /// Run and return raw stdout, failing on non-zero exit.
    pub async fn stdout_bytes(self) -> Result<Vec<u8>> {
        let output = self.output().await?;
        if !output.status.success() {
            return Err(ExmError::GitCommandFailed {
                command: self.display(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        Ok(output.stdout)
    }

    /// Run and return trimmed stdout as a string, failing on non-zero exit.
    pub async fn stdout_string(self) -> Result<String> {
        let stdout = self.stdout_bytes().await?;
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }

    /// Run for effect, failing on non-zero exit.
    pub async fn run(self) -> Result<()> {
        self.stdout_bytes().await.map(|_| ())
    }

    /// Run and report whether the invocation succeeded.
    pub async fn success(self) -> Result<bool> {
        let output = self.output().await?;
        if !output.status.success() {
            trace!(
                command = %self.display(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "git probe failed"
            );
        }
        Ok(output.status.success())
    }
}
