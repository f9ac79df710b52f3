//! Command-line surface of `update_abi`.

use std::path::PathBuf;

use abikit_io_fs::EnumArtifactConflictStrategy;
use clap::{Parser, ValueEnum};
use serde::Deserialize;

/// Conflict policy spelling shared by flags and the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumConflictArg {
    Overwrite,
    Skip,
    Error,
}

impl From<EnumConflictArg> for EnumArtifactConflictStrategy {
    fn from(value: EnumConflictArg) -> Self {
        match value {
            EnumConflictArg::Overwrite => Self::Overwrite,
            EnumConflictArg::Skip => Self::Skip,
            EnumConflictArg::Error => Self::Error,
        }
    }
}

/// Copy compiled contract ABI artifacts into the frontend source tree.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "update_abi", version)]
pub struct ArgsUpdateAbi {
    /// TOML config file. Defaults to `./abikit.toml` when present.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Single artifact to copy.
    #[arg(
        long,
        value_name = "FILE",
        requires = "destination",
        conflicts_with = "artifacts_dir"
    )]
    pub source: Option<PathBuf>,

    /// Where the single artifact is written.
    #[arg(long, value_name = "FILE", requires = "source")]
    pub destination: Option<PathBuf>,

    /// Hardhat `artifacts/` directory to discover ABIs in.
    #[arg(long, value_name = "DIR", requires = "out_dir")]
    pub artifacts_dir: Option<PathBuf>,

    /// Directory discovered ABIs are written into.
    #[arg(long, value_name = "DIR", requires = "artifacts_dir")]
    pub out_dir: Option<PathBuf>,

    /// Contract-name glob to keep during discovery (repeatable).
    #[arg(long = "include", value_name = "GLOB")]
    pub patterns_include: Vec<String>,

    /// Contract-name glob to drop during discovery (repeatable).
    #[arg(long = "exclude", value_name = "GLOB")]
    pub patterns_exclude: Vec<String>,

    /// What to do when the destination file already exists.
    #[arg(long, value_enum, value_name = "RULE")]
    pub on_conflict: Option<EnumConflictArg>,

    /// Copy bytes only; leave destination timestamps alone.
    #[arg(long)]
    pub no_preserve_metadata: bool,

    /// Create missing destination directories.
    #[arg(long)]
    pub create_parents: bool,

    /// Check every job without writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Maximum parallel copies for multi-artifact runs.
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Exit with status 1 when any copy fails.
    #[arg(long)]
    pub strict: bool,

    /// Log filter (e.g. `debug`, `abikit_io_fs=trace`). Falls back to `RUST_LOG`.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}
