//! `abikit_cli` v1:
//! `update_abi` front-end over `abikit_io_fs`.
//!
//! - `args` : clap command-line surface
//! - `conf` : `abikit.toml` loading
//! - `log`  : tracing subscriber setup
//! - `run`  : job planning and console reporting

pub mod args;
pub mod conf;
pub mod log;
pub mod run;

pub use args::{ArgsUpdateAbi, EnumConflictArg};
pub use conf::{C_NAME_CONFIG_DEFAULT, SpecAbikitConfig};
pub use log::init_logging;
pub use run::{SpecRunPlan, derive_exit_code, execute_plan, resolve_plan, run};
