//! Artifact copy options, job models, and top-level error types.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Existing destination file conflict policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumArtifactConflictStrategy {
    /// Replace destination file with source file.
    #[default]
    Overwrite,
    /// Keep destination file and skip current source file.
    Skip,
    /// Fail this job when destination already exists.
    Error,
}

/// Non-failing outcome of one artifact job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumArtifactCopyStatus {
    /// Bytes (and metadata, if enabled) were written to destination.
    Copied,
    /// Destination existed and conflict rule was `Skip`.
    Skipped,
    /// All checks passed; nothing was written.
    DryRun,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsInit

/// One source -> destination copy request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecArtifactJob {
    /// Build output file, e.g. `artifacts/contracts/X.sol/X.json`.
    pub path_file_src: PathBuf,
    /// Target file inside the frontend tree.
    pub path_file_dst: PathBuf,
}

impl SpecArtifactJob {
    pub fn new<P, Q>(path_file_src: P, path_file_dst: Q) -> Self
    where
        P: Into<PathBuf>,
        Q: Into<PathBuf>,
    {
        Self {
            path_file_src: path_file_src.into(),
            path_file_dst: path_file_dst.into(),
        }
    }
}

/// Input options for `copy_artifact` / `copy_artifacts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecArtifactCopyOptions {
    /// Conflict behavior for an existing destination file.
    pub rule_conflict_file: EnumArtifactConflictStrategy,
    /// Copy timestamps (and xattrs on Linux) after the byte copy.
    pub if_preserve_metadata: bool,
    /// Create missing destination parent directories.
    pub if_create_parent_dirs: bool,
    /// Do not mutate filesystem; report what would happen.
    pub if_dry_run: bool,
    /// Maximum worker threads for batch copy.
    pub num_workers_max: Option<usize>,
}

impl Default for SpecArtifactCopyOptions {
    fn default() -> Self {
        Self {
            rule_conflict_file: EnumArtifactConflictStrategy::Overwrite,
            if_preserve_metadata: true,
            if_create_parent_dirs: false,
            if_dry_run: false,
            num_workers_max: None,
        }
    }
}

/// Filters for Hardhat artifact discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecArtifactDiscoverOptions {
    /// Glob patterns matched against the contract name (file stem).
    pub patterns_include: Option<Vec<String>>,
    /// Glob patterns matched against the contract name (file stem).
    pub patterns_exclude: Option<Vec<String>>,
}

/// One copy failure item with path + error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCopyError {
    /// Failed source or destination path.
    pub path: PathBuf,
    /// User-facing error text.
    pub exception: String,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Failure of one artifact job or of discovery setup.
#[derive(Debug, Error)]
pub enum CopyArtifactError {
    #[error("Source file does not exist: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("Source is not a regular file: {}", .0.display())]
    SourceNotFile(PathBuf),

    #[error("Source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),

    #[error("Destination is a directory: {}", .0.display())]
    DestinationIsDirectory(PathBuf),

    #[error("Destination exists: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("Source and destination are the same file: {}", .0.display())]
    SameFile(PathBuf),

    #[error("Destination parent directory does not exist: {}", .0.display())]
    DestinationParentMissing(PathBuf),

    #[error("Destination is targeted by more than one artifact: {}", .0.display())]
    DuplicateDestination(PathBuf),

    #[error("Permission denied: {} ({source})", .path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid artifact pattern: {0}")]
    InvalidPattern(String),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CopyArtifactError {
    /// Classify an IO error raised while touching `path`.
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.to_path_buf(),
                source,
            },
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// Path the error is scoped to, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::SourceMissing(p)
            | Self::SourceNotFile(p)
            | Self::SourceNotDirectory(p)
            | Self::DestinationIsDirectory(p)
            | Self::DestinationExists(p)
            | Self::SameFile(p)
            | Self::DestinationParentMissing(p)
            | Self::DuplicateDestination(p) => Some(p),
            Self::PermissionDenied { path, .. } | Self::Io { path, .. } => Some(path),
            Self::InvalidPattern(_) => None,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
