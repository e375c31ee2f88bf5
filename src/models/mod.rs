//! Shared data model for exm's resolution engine.
//!
//! These are the in-memory types the engine operates on: a [`ModuleKey`]
//! identifies one resolvable unit, a [`Target`] is what the user asked for, a
//! [`Lock`] records what that resolved to, and [`Requirements`]/[`Locks`] are
//! the keyed mappings that `solve`/`fetch`/`ensure` consume and produce. The
//! on-disk representation of these types lives in [`crate::manifest`] and
//! [`crate::lockfile`]; nothing in this module knows about files.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::ExmError;

/// Artifact filename used when a requirement does not name one.
pub const DEFAULT_ARTIFACT_FILENAME: &str = "extension.yaml";

/// Splits a module name into a repository and an optional submodule.
///
/// The shape is `([repository]<host>/<group>/<name>)(/<submodule parts>)?`:
/// the first three `/`-separated segments form the repository, everything
/// after them is the submodule path.
static MODULE_KEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?/.+?/.+?)(?:/(.+))?$").expect("static regex"));

/// Identifies one extension module: a repository plus an optional sub-path
/// within it.
///
/// Keys both the requirements and the locks mappings. Two keys are equal iff
/// repository and submodule match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleKey {
    /// Repository identifier, e.g. `github.com/example/ext-dns`
    pub repository: String,
    /// Optional path of the module inside the repository
    pub submodule: Option<String>,
}

impl ModuleKey {
    /// Create a key for a module at the root of `repository`.
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            submodule: None,
        }
    }

    /// Create a key for a module under a sub-path of `repository`.
    pub fn with_submodule(repository: impl Into<String>, submodule: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            submodule: Some(submodule.into()),
        }
    }

    /// Parse a module name of the shape `host/group/name[/submodule]`.
    ///
    /// # Errors
    ///
    /// Returns [`ExmError::InvalidModuleName`] when the name does not contain
    /// at least three segments.
    pub fn parse(name: &str) -> Result<Self, ExmError> {
        let captures =
            MODULE_KEY_REGEX
                .captures(name)
                .ok_or_else(|| ExmError::InvalidModuleName {
                    name: name.to_string(),
                })?;

        Ok(Self {
            repository: captures[1].to_string(),
            submodule: captures.get(2).map(|m| m.as_str().to_string()),
        })
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.submodule {
            Some(submodule) => write!(f, "{}/{}", self.repository, submodule),
            None => write!(f, "{}", self.repository),
        }
    }
}

/// The user's declared intent for what to resolve.
///
/// Exactly one variant applies per requirement; a version target carries a
/// semantic-version range (or an exact pin), the others carry literal names.
/// `Latest` resolves the repository's default reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// An exact commit-ish string
    Revision(String),
    /// A semantic-version range or exact version
    Version(String),
    /// A branch head
    Branch(String),
    /// Whatever the repository's default reference points at
    Latest,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Revision(revision) => write!(f, "revision/{revision}"),
            Target::Version(version) => write!(f, "version/{version}"),
            Target::Branch(branch) => write!(f, "branch/{branch}"),
            Target::Latest => write!(f, "latest"),
        }
    }
}

/// One declared requirement: a target plus the artifact file to verify and
/// fetch at the resolved commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// What to resolve
    pub target: Target,
    /// Artifact path relative to the module root
    pub filename: String,
}

impl Requirement {
    /// Requirement for `target` with the default artifact filename.
    pub fn new(target: Target) -> Self {
        Self {
            target,
            filename: DEFAULT_ARTIFACT_FILENAME.to_string(),
        }
    }

    /// Requirement for `target` with an explicit artifact filename.
    pub fn with_filename(target: Target, filename: impl Into<String>) -> Self {
        Self {
            target,
            filename: filename.into(),
        }
    }
}

/// The recorded outcome of resolving a target.
///
/// `target` is the requirement's target at lock time and is what staleness
/// checks compare against; `resolved` is the concrete outcome (for version
/// targets the exact matched tag, never a range); `hash` is the commit the
/// artifact was verified to exist at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lock {
    /// The target that was requested when this lock was produced
    pub target: Target,
    /// The concrete resolution of that target
    pub resolved: Target,
    /// Commit hash the artifact was found at
    pub hash: String,
}

impl fmt::Display for Lock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resolved, self.hash)
    }
}

/// Declared requirements, keyed by module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirements {
    /// Requirement per module key
    pub modules: BTreeMap<ModuleKey, Requirement>,
}

impl Requirements {
    /// Empty requirements mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of declared modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// True when no modules are declared.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Iterate over `(key, requirement)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&ModuleKey, &Requirement)> {
        self.modules.iter()
    }
}

impl FromIterator<(ModuleKey, Requirement)> for Requirements {
    fn from_iter<I: IntoIterator<Item = (ModuleKey, Requirement)>>(iter: I) -> Self {
        Self {
            modules: iter.into_iter().collect(),
        }
    }
}

/// Recorded locks, keyed by module.
///
/// Always rebuilt fresh by `solve`/`ensure`; never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locks {
    /// Lock per module key
    pub modules: BTreeMap<ModuleKey, Lock>,
}

impl Locks {
    /// Empty locks mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the lock recorded for `key`.
    pub fn get(&self, key: &ModuleKey) -> Option<&Lock> {
        self.modules.get(key)
    }

    /// Number of recorded locks.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// True when no locks are recorded.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Iterate over `(key, lock)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&ModuleKey, &Lock)> {
        self.modules.iter()
    }
}

impl FromIterator<(ModuleKey, Lock)> for Locks {
    fn from_iter<I: IntoIterator<Item = (ModuleKey, Lock)>>(iter: I) -> Self {
        Self {
            modules: iter.into_iter().collect(),
        }
    }
}
