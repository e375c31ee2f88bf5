//! The requirements document (`extensions.toml`).
//!
//! The document declares the modules a project depends on and what each
//! should resolve to. It is TOML with a format-version field and one
//! `[[modules]]` entry per module:
//!
//! ```toml
//! version = 1
//!
//! [[modules]]
//! name = "github.com/example/ext-dns"
//! version = ">=1.0.0, <2.0.0"
//!
//! [[modules]]
//! name = "github.com/example/extensions/modules/firewall"
//! branch = "main"
//! filename = "extension.yaml"   # optional, this is the default
//! ```
//!
//! Exactly one of `revision`, `version` or `branch` may be set per entry;
//! none of them means "latest". Entries are keyed by `name` (parsed into a
//! [`ModuleKey`]); duplicate names are rejected. The engine never sees this
//! representation — loading produces the plain [`Requirements`] mapping.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::ExmError;
use crate::models::{
    ModuleKey, Requirement, Requirements, Target, DEFAULT_ARTIFACT_FILENAME,
};

/// Default requirements document path.
pub const DEFAULT_REQUIREMENTS_PATH: &str = "extensions.toml";

/// Newest document format version this build reads and writes.
pub const DOCUMENT_VERSION: u32 = 1;

/// Reject documents written by a newer exm.
pub(crate) fn ensure_supported_document_version(found: u32) -> Result<(), ExmError> {
    if found > DOCUMENT_VERSION {
        return Err(ExmError::UnsupportedDocumentVersion {
            found,
            supported: DOCUMENT_VERSION,
        });
    }
    Ok(())
}

/// Document representation of a target: at most one field set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct TargetRepr {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl TargetRepr {
    /// Convert into the core sum type; `module` names the entry for error
    /// reporting.
    pub fn into_target(self, module: &str) -> Result<Target, ExmError> {
        match (self.revision, self.version, self.branch) {
            (Some(revision), None, None) => Ok(Target::Revision(revision)),
            (None, Some(version), None) => Ok(Target::Version(version)),
            (None, None, Some(branch)) => Ok(Target::Branch(branch)),
            (None, None, None) => Ok(Target::Latest),
            _ => Err(ExmError::MultipleTargets {
                module: module.to_string(),
            }),
        }
    }
}

impl From<&Target> for TargetRepr {
    fn from(target: &Target) -> Self {
        match target {
            Target::Revision(revision) => Self {
                revision: Some(revision.clone()),
                ..Self::default()
            },
            Target::Version(version) => Self {
                version: Some(version.clone()),
                ..Self::default()
            },
            Target::Branch(branch) => Self {
                branch: Some(branch.clone()),
                ..Self::default()
            },
            Target::Latest => Self::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RequirementEntry {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    revision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filename: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RequirementsDocument {
    version: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    modules: Vec<RequirementEntry>,
}

impl Requirements {
    /// Parse a requirements document.
    pub fn parse(data: &str) -> Result<Self> {
        let document: RequirementsDocument =
            toml::from_str(data).context("could not parse requirements document")?;
        ensure_supported_document_version(document.version)?;

        let mut modules = BTreeMap::new();
        for entry in document.modules {
            let key = ModuleKey::parse(&entry.name)?;

            let target = TargetRepr {
                revision: entry.revision,
                version: entry.version,
                branch: entry.branch,
            }
            .into_target(&entry.name)?;

            let requirement = Requirement {
                target,
                filename: entry
                    .filename
                    .unwrap_or_else(|| DEFAULT_ARTIFACT_FILENAME.to_string()),
            };

            if modules.insert(key.clone(), requirement).is_some() {
                return Err(ExmError::DuplicateModule {
                    module: key.to_string(),
                }
                .into());
            }
        }

        Ok(Self { modules })
    }

    /// Load a requirements document from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("could not read requirements file {}", path.display()))?;
        Self::parse(&data)
            .with_context(|| format!("in requirements file {}", path.display()))
    }

    /// Serialize to the document format.
    pub fn to_toml_string(&self) -> Result<String> {
        let modules = self
            .iter()
            .map(|(key, requirement)| {
                let target = TargetRepr::from(&requirement.target);
                RequirementEntry {
                    name: key.to_string(),
                    revision: target.revision,
                    version: target.version,
                    branch: target.branch,
                    filename: (requirement.filename != DEFAULT_ARTIFACT_FILENAME)
                        .then(|| requirement.filename.clone()),
                }
            })
            .collect();

        toml::to_string_pretty(&RequirementsDocument {
            version: DOCUMENT_VERSION,
            modules,
        })
        .context("could not serialize requirements document")
    }

    /// Write the document to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("could not create directory {}", parent.display()))?;
        }
        fs::write(path, self.to_toml_string()?)
            .with_context(|| format!("could not write requirements file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_target_kinds() {
        let requirements = Requirements::parse(
            r#"
            version = 1

            [[modules]]
            name = "github.com/example/ext-dns"
            version = ">=1.0.0"

            [[modules]]
            name = "github.com/example/ext-os"
            revision = "abc123"

            [[modules]]
            name = "github.com/example/ext-net"
            branch = "main"

            [[modules]]
            name = "github.com/example/ext-backup"
            "#,
        )
        .unwrap();

        assert_eq!(requirements.len(), 4);
        let get = |name: &str| {
            requirements
                .modules
                .get(&ModuleKey::parse(name).unwrap())
                .unwrap()
        };
        assert_eq!(
            get("github.com/example/ext-dns").target,
            Target::Version(">=1.0.0".into())
        );
        assert_eq!(
            get("github.com/example/ext-os").target,
            Target::Revision("abc123".into())
        );
        assert_eq!(
            get("github.com/example/ext-net").target,
            Target::Branch("main".into())
        );
        assert_eq!(get("github.com/example/ext-backup").target, Target::Latest);
    }

    #[test]
    fn parses_submodule_names_and_custom_filenames() {
        let requirements = Requirements::parse(
            r#"
            version = 1

            [[modules]]
            name = "github.com/example/extensions/modules/firewall"
            branch = "main"
            filename = "module.yaml"
            "#,
        )
        .unwrap();

        let key = ModuleKey::with_submodule("github.com/example/extensions", "modules/firewall");
        let requirement = requirements.modules.get(&key).unwrap();
        assert_eq!(requirement.filename, "module.yaml");
    }

    #[test]
    fn filename_defaults_when_unset() {
        let requirements = Requirements::parse(
            "version = 1\n\n[[modules]]\nname = \"github.com/example/ext-dns\"\n",
        )
        .unwrap();
        let requirement = requirements.modules.values().next().unwrap();
        assert_eq!(requirement.filename, DEFAULT_ARTIFACT_FILENAME);
    }

    #[test]
    fn rejects_multiple_target_fields() {
        let err = Requirements::parse(
            r#"
            version = 1

            [[modules]]
            name = "github.com/example/ext-dns"
            version = ">=1.0.0"
            branch = "main"
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExmError>(),
            Some(ExmError::MultipleTargets { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_modules() {
        let err = Requirements::parse(
            r#"
            version = 1

            [[modules]]
            name = "github.com/example/ext-dns"
            branch = "main"

            [[modules]]
            name = "github.com/example/ext-dns"
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExmError>(),
            Some(ExmError::DuplicateModule { .. })
        ));
    }

    #[test]
    fn rejects_newer_document_versions() {
        let err = Requirements::parse("version = 2\n").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExmError>(),
            Some(ExmError::UnsupportedDocumentVersion { found: 2, .. })
        ));
    }

    #[test]
    fn round_trips_through_toml() {
        let original = Requirements::parse(
            r#"
            version = 1

            [[modules]]
            name = "github.com/example/ext-dns"
            version = ">=1.0.0"

            [[modules]]
            name = "github.com/example/extensions/modules/firewall"
            branch = "main"
            filename = "module.yaml"
            "#,
        )
        .unwrap();

        let reparsed = Requirements::parse(&original.to_toml_string().unwrap()).unwrap();
        assert_eq!(original, reparsed);
    }

    #[test]
    fn default_filename_is_omitted_on_write() {
        let requirements = Requirements::parse(
            "version = 1\n\n[[modules]]\nname = \"github.com/example/ext-dns\"\n",
        )
        .unwrap();
        let rendered = requirements.to_toml_string().unwrap();
        assert!(!rendered.contains("filename"));
    }
}
