//! Diagnostic logging. Always stderr; stdout carries the copy report.

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

/// Filter used when neither `--log-level` nor `RUST_LOG` is set.
pub const C_LOG_FILTER_DEFAULT: &str = "warn";

/// Pick the log filter: explicit flag, then `RUST_LOG`, then [`C_LOG_FILTER_DEFAULT`].
pub fn derive_env_filter(log_level: Option<&str>) -> anyhow::Result<EnvFilter> {
    match log_level {
        Some(c_directive) => EnvFilter::try_new(c_directive)
            .map_err(|e| anyhow!("Invalid log level `{c_directive}`: {e}")),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(C_LOG_FILTER_DEFAULT))),
    }
}

/// Install the global subscriber. Call once, from `main`.
pub fn init_logging(log_level: Option<&str>) -> anyhow::Result<()> {
    let env_filter = derive_env_filter(log_level)?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {e}"))
}
