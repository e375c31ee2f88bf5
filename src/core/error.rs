//! Typed error variants for exm failure modes.
//!
//! Most functions in this crate return [`anyhow::Result`] so that callers can
//! attach context as errors travel up towards the CLI. The variants here carry
//! the failure modes that calling code needs to distinguish or that deserve a
//! precise, stable message: upstream lookups that came back empty, malformed
//! user input, and consistency violations between a requirement and its
//! recorded lock.

use thiserror::Error;

/// Errors produced by exm's resolution engine, document layer and git backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExmError {
    /// A revision name could not be resolved to a commit.
    #[error("revision {name:?} not found")]
    RevisionNotFound {
        /// The revision string as given in the requirement
        name: String,
    },

    /// A branch name could not be resolved to a commit.
    #[error("branch {name:?} not found")]
    BranchNotFound {
        /// The branch name as given in the requirement
        name: String,
    },

    /// No listed version satisfies the requirement's range.
    #[error("no matching version found for range {range:?}")]
    NoMatchingVersion {
        /// The version range that nothing satisfied
        range: String,
    },

    /// The version range could not be parsed as a semantic-version constraint.
    #[error("invalid version range {range:?}: {reason}")]
    InvalidVersionRange {
        /// The offending range string
        range: String,
        /// Parser diagnostic
        reason: String,
    },

    /// A lock points at a commit that does not contain the expected artifact.
    #[error("lock {lock} does not have file {path}")]
    LockMissingArtifact {
        /// Display form of the offending lock
        lock: String,
        /// Artifact path that was checked
        path: String,
    },

    /// `fetch` was asked to retrieve a module that has no recorded lock.
    #[error("no lock recorded for {module}")]
    NoLockRecorded {
        /// Display form of the module key
        module: String,
    },

    /// A module name does not have the `host/group/name[/submodule]` shape.
    #[error("could not extract repository and submodule from name {name:?}")]
    InvalidModuleName {
        /// The name that failed to parse
        name: String,
    },

    /// A requirements or locks document names the same module twice.
    #[error("duplicate module {module}")]
    DuplicateModule {
        /// Display form of the duplicated module key
        module: String,
    },

    /// The same module was named twice when building an update policy.
    #[error("duplicate module key to update specified: {module}")]
    DuplicateUpdateModule {
        /// Display form of the duplicated module key
        module: String,
    },

    /// `--update-all` and explicit update names were combined.
    #[error("cannot update all and specific names at the same time")]
    UpdateFlagsConflict,

    /// A document target sets more than one of revision/version/branch.
    #[error("more than one target definition is not allowed for {module}")]
    MultipleTargets {
        /// Module entry carrying the invalid target
        module: String,
    },

    /// A document was written by a newer exm than this one.
    #[error(
        "unsupported document version {found} (newest supported is {supported}); \
         update exm to use this file"
    )]
    UnsupportedDocumentVersion {
        /// Version found in the document
        found: u32,
        /// Newest version this build understands
        supported: u32,
    },

    /// A git invocation exited unsuccessfully.
    #[error("git {command} failed: {stderr}")]
    GitCommandFailed {
        /// The subcommand and arguments that were run
        command: String,
        /// Trimmed stderr of the failed invocation
        stderr: String,
    },

    /// A file was absent (or unreadable) at the given commit.
    #[error("file {path} not found at {hash}")]
    FileNotFound {
        /// Commit hash that was inspected
        hash: String,
        /// Repository-relative path
        path: String,
    },

    /// A registration artifact did not have the expected document structure.
    #[error("invalid registration artifact: {reason}")]
    InvalidRegistration {
        /// What was wrong with the document stream
        reason: String,
    },
}
