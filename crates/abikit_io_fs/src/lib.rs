//! `abikit_io_fs` v1:
//! Contract-artifact copy engine.
//!
//! - `copy`     : single-artifact copy and batch orchestration
//! - `discover` : Hardhat `artifacts/` tree discovery
//! - `conf`     : layout constants and default jobs
//! - `spec`     : enums/options/errors
//! - `report`   : run-time report model
//! - `util`     : shared helper functions

pub mod conf;
pub mod copy;
pub mod discover;
pub mod report;
pub mod spec;
mod util;

pub use conf::{
    C_PATH_ARTIFACT_DST_DEFAULT, C_PATH_ARTIFACT_SRC_DEFAULT, derive_default_artifact_job,
};
pub use copy::{copy_artifact, copy_artifacts};
pub use discover::discover_artifacts;
pub use report::{ReportArtifactCopy, ReportCopy, ReportCopyBuilder};
pub use spec::{
    CopyArtifactError, EnumArtifactConflictStrategy, EnumArtifactCopyStatus,
    SpecArtifactCopyOptions, SpecArtifactDiscoverOptions, SpecArtifactJob, SpecCopyError,
};
