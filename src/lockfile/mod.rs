//! The locks document (`extensions.lock`).
//!
//! Records the concrete outcome of resolution per module so later runs are
//! reproducible: the target that was requested at lock time, what it resolved
//! to, and the commit hash the artifact was verified at. Like a `Cargo.lock`,
//! the document is generated: `ensure` rewrites it whole, it is never edited
//! in place.
//!
//! ```toml
//! version = 1
//!
//! [[modules]]
//! name = "github.com/example/ext-dns"
//! commit = "4f0c55d0e4461ce31d27a0f7428eba487f2c6fa9"
//!
//! [modules.target]
//! version = ">=1.0.0, <2.0.0"
//!
//! [modules.resolved]
//! version = "v1.2.0"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::ExmError;
use crate::manifest::{ensure_supported_document_version, TargetRepr, DOCUMENT_VERSION};
use crate::models::{Lock, Locks, ModuleKey};

/// Default locks document path.
pub const DEFAULT_LOCKS_PATH: &str = "extensions.lock";

#[derive(Debug, Serialize, Deserialize)]
struct LockEntry {
    name: String,
    commit: String,
    #[serde(default)]
    target: TargetRepr,
    #[serde(default)]
    resolved: TargetRepr,
}

#[derive(Debug, Serialize, Deserialize)]
struct LocksDocument {
    version: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    modules: Vec<LockEntry>,
}

impl Locks {
    /// Parse a locks document.
    pub fn parse(data: &str) -> Result<Self> {
        let document: LocksDocument =
            toml::from_str(data).context("could not parse locks document")?;
        ensure_supported_document_version(document.version)?;

        let mut modules = BTreeMap::new();
        for entry in document.modules {
            let key = ModuleKey::parse(&entry.name)?;
            let lock = Lock {
                target: entry.target.into_target(&entry.name)?,
                resolved: entry.resolved.into_target(&entry.name)?,
                hash: entry.commit,
            };

            if modules.insert(key.clone(), lock).is_some() {
                return Err(ExmError::DuplicateModule {
                    module: key.to_string(),
                }
                .into());
            }
        }

        Ok(Self { modules })
    }

    /// Load a locks document from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("could not read locks file {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("in locks file {}", path.display()))
    }

    /// Load a locks document if it exists; `Ok(None)` when absent.
    ///
    /// A first `ensure` run has no locks yet — an absent file is not an
    /// error, any other read or parse failure still is.
    pub fn load_if_exists(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    /// Serialize to the document format.
    pub fn to_toml_string(&self) -> Result<String> {
        let modules = self
            .iter()
            .map(|(key, lock)| LockEntry {
                name: key.to_string(),
                commit: lock.hash.clone(),
                target: TargetRepr::from(&lock.target),
                resolved: TargetRepr::from(&lock.resolved),
            })
            .collect();

        toml::to_string_pretty(&LocksDocument {
            version: DOCUMENT_VERSION,
            modules,
        })
        .context("could not serialize locks document")
    }

    /// Write the document to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("could not create directory {}", parent.display()))?;
        }
        fs::write(path, self.to_toml_string()?)
            .with_context(|| format!("could not write locks file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use crate::models::Target;

    use super::*;

    const DOCUMENT: &str = r#"
        version = 1

        [[modules]]
        name = "github.com/example/ext-dns"
        commit = "4f0c55d0e4461ce31d27a0f7428eba487f2c6fa9"

        [modules.target]
        version = ">=1.0.0, <2.0.0"

        [modules.resolved]
        version = "v1.2.0"

        [[modules]]
        name = "github.com/example/extensions/modules/firewall"
        commit = "0d5cd05d6a8d9b1f9de64e9f1f0b1d86c69e9c65"

        [modules.target]

        [modules.resolved]
    "#;

    #[test]
    fn parses_locks_with_targets_and_resolutions() {
        let locks = Locks::parse(DOCUMENT).unwrap();
        assert_eq!(locks.len(), 2);

        let dns = locks
            .get(&ModuleKey::new("github.com/example/ext-dns"))
            .unwrap();
        assert_eq!(dns.target, Target::Version(">=1.0.0, <2.0.0".into()));
        assert_eq!(dns.resolved, Target::Version("v1.2.0".into()));
        assert_eq!(dns.hash, "4f0c55d0e4461ce31d27a0f7428eba487f2c6fa9");

        let firewall = locks
            .get(&ModuleKey::with_submodule(
                "github.com/example/extensions",
                "modules/firewall",
            ))
            .unwrap();
        assert_eq!(firewall.target, Target::Latest);
        assert_eq!(firewall.resolved, Target::Latest);
    }

    #[test]
    fn rejects_duplicate_locks() {
        let document = r#"
            version = 1

            [[modules]]
            name = "github.com/example/ext-dns"
            commit = "aaa"

            [modules.target]
            [modules.resolved]

            [[modules]]
            name = "github.com/example/ext-dns"
            commit = "bbb"

            [modules.target]
            [modules.resolved]
        "#;
        let err = Locks::parse(document).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExmError>(),
            Some(ExmError::DuplicateModule { .. })
        ));
    }

    #[test]
    fn rejects_multi_field_targets() {
        let document = r#"
            version = 1

            [[modules]]
            name = "github.com/example/ext-dns"
            commit = "aaa"

            [modules.target]
            branch = "main"
            revision = "abc"

            [modules.resolved]
        "#;
        let err = Locks::parse(document).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExmError>(),
            Some(ExmError::MultipleTargets { .. })
        ));
    }

    #[test]
    fn rejects_newer_document_versions() {
        let err = Locks::parse("version = 9\n").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExmError>(),
            Some(ExmError::UnsupportedDocumentVersion { found: 9, .. })
        ));
    }

    #[test]
    fn round_trips_through_toml() {
        let original = Locks::parse(DOCUMENT).unwrap();
        let reparsed = Locks::parse(&original.to_toml_string().unwrap()).unwrap();
        assert_eq!(original, reparsed);
    }

    #[test]
    fn load_if_exists_tolerates_absent_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extensions.lock");
        assert!(Locks::load_if_exists(&path).unwrap().is_none());

        Locks::parse(DOCUMENT).unwrap().save(&path).unwrap();
        let loaded = Locks::load_if_exists(&path).unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
    }
}
