//! Domain-specific error types for the rcforge engine.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Library modules return the typed [`Error`] while command handlers at the
//! CLI boundary convert it to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! Error
//! ├── Validation(ValidationError)  : duplicate names, bad targets, bad filters
//! ├── CircularDependency           : modules left unresolved by the sort
//! ├── NotFound(NotFoundError)      : graph nodes, files, manifests, snapshots
//! ├── Io                           : read/write/mkdir failures with context
//! └── Stage                        : any of the above, tagged with a build stage
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the rcforge engine.
#[derive(Error, Debug)]
pub enum Error {
    /// A structural problem in the manifest or the requested build.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The module dependency graph contains a cycle.
    #[error("Circular dependency detected among modules: {}", modules.join(", "))]
    CircularDependency {
        /// Names of every module the sort could not place, in manifest order.
        modules: Vec<String>,
    },

    /// A referenced entity does not exist.
    #[error("Not found: {0}")]
    NotFound(#[from] NotFoundError),

    /// An I/O operation failed.
    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        /// What was being attempted (e.g. `"write"`, `"create directory"`).
        action: &'static str,
        /// Path the operation targeted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An error annotated with the pipeline stage it crossed.
    #[error("failed to {stage}: {source}")]
    Stage {
        /// Human-readable stage description (e.g. `"build dependency graph"`).
        stage: &'static str,
        /// The wrapped error.
        source: Box<Error>,
    },
}

/// Discriminant of an [`Error`] with stage wrappers peeled off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`Error::Validation`].
    Validation,
    /// See [`Error::CircularDependency`].
    CircularDependency,
    /// See [`Error::NotFound`].
    NotFound,
    /// See [`Error::Io`].
    Io,
}

impl Error {
    /// Build an [`Error::Io`] for `path`.
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Wrap `self` with the name of the stage it escaped from.
    #[must_use]
    pub fn in_stage(self, stage: &'static str) -> Self {
        Self::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// Return the innermost error, skipping any [`Error::Stage`] wrappers.
    #[must_use]
    pub fn root(&self) -> &Self {
        let mut current = self;
        while let Self::Stage { source, .. } = current {
            current = source;
        }
        current
    }

    /// Return the kind of the innermost error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            Self::Validation(_) => ErrorKind::Validation,
            Self::CircularDependency { .. } => ErrorKind::CircularDependency,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Io { .. } | Self::Stage { .. } => ErrorKind::Io,
        }
    }
}

/// Structural problems with the manifest or the requested build.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Two modules share a name.
    #[error("duplicate module name '{0}'")]
    DuplicateModule(String),

    /// A required module field is empty.
    #[error("module '{module}' has an empty '{field}' field")]
    EmptyField {
        /// Module name (may itself be empty).
        module: String,
        /// Field name.
        field: &'static str,
    },

    /// A module priority lies outside `0..=100`.
    #[error("module '{module}' has priority {priority}, expected 0-100")]
    PriorityOutOfRange {
        /// Module name.
        module: String,
        /// Offending priority.
        priority: u32,
    },

    /// The shell type is not one of zsh, bash or fish.
    #[error("unsupported shell type '{0}': must be one of zsh, bash, fish")]
    UnsupportedShell(String),

    /// The target name is not defined for the shell type.
    #[error("unknown target '{target}' for shell '{shell}' (available: {available})")]
    UnknownTarget {
        /// Requested target.
        target: String,
        /// Shell type.
        shell: String,
        /// Comma-separated list of legal targets.
        available: String,
    },

    /// A module's target is not legal for the shell type.
    #[error("module '{module}' has invalid target '{target}' for shell '{shell}'")]
    InvalidModuleTarget {
        /// Module name.
        module: String,
        /// Offending target.
        target: String,
        /// Shell type.
        shell: String,
    },

    /// Two modules of a directory target map to the same output file.
    #[error("modules '{first}' and '{second}' both write {path} in target '{target}'")]
    DuplicateModuleFile {
        /// Directory target.
        target: String,
        /// Module that claimed the file first.
        first: String,
        /// Module whose file name collides.
        second: String,
        /// Shared relative path.
        path: String,
    },

    /// A `--target` filter names a target that is not legal for the shell.
    #[error("invalid target filter '{target}' for shell '{shell}'")]
    InvalidTargetFilter {
        /// Offending filter entry.
        target: String,
        /// Shell type.
        shell: String,
    },

    /// The manifest file could not be deserialized.
    #[error("invalid manifest {path}: {message}")]
    ManifestSyntax {
        /// Manifest path.
        path: String,
        /// Parser message.
        message: String,
    },

    /// A generated JSON file (build metadata, snapshot index) is malformed.
    #[error("malformed {path}: {message}")]
    MalformedFile {
        /// File path.
        path: String,
        /// Parser message.
        message: String,
    },

    /// A snapshot identifier is empty or would escape the snapshot root.
    #[error("invalid snapshot id '{0}'")]
    InvalidSnapshotId(String),

    /// A snapshot file no longer matches the checksum recorded at creation.
    #[error("snapshot '{snapshot}' is corrupt: checksum mismatch for {path}")]
    SnapshotChecksum {
        /// Snapshot identifier.
        snapshot: String,
        /// Home-relative path of the corrupt file.
        path: String,
    },

    /// A manifest already exists and overwriting was not requested.
    #[error("manifest {0} already exists (use --force to overwrite)")]
    ManifestExists(String),

    /// A module with the requested name already exists.
    #[error("module '{0}' already exists in the manifest")]
    ModuleExists(String),
}

/// A referenced entity does not exist.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    /// A graph operation named a node that was never added.
    #[error("module '{0}' is not in the dependency graph")]
    Node(String),

    /// A module requires a module that is not declared.
    #[error("module '{module}' requires unknown module '{dependency}'")]
    Dependency {
        /// Module declaring the requirement.
        module: String,
        /// The missing requirement.
        dependency: String,
    },

    /// A file does not exist.
    #[error("file {0}")]
    File(PathBuf),

    /// The manifest does not exist.
    #[error("manifest {0}")]
    Manifest(PathBuf),

    /// No snapshot with the given identifier exists.
    #[error("snapshot '{0}'")]
    Snapshot(String),
}

/// Friendly result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;
