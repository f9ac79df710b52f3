//! Hardhat layout constants and default job factories.

use crate::spec::SpecArtifactJob;

/// Default Hardhat output file for the PayStream contract.
pub const C_PATH_ARTIFACT_SRC_DEFAULT: &str =
    "contracts/artifacts/contracts/PayStream.sol/PayStream.json";
/// Default location the frontend imports the ABI from.
pub const C_PATH_ARTIFACT_DST_DEFAULT: &str = "frontend/src/hooks/PayStream.json";

/// Artifact file extension.
pub const C_EXT_ARTIFACT: &str = "json";
/// Hardhat debug sidecar suffix (`<Contract>.dbg.json`).
pub const C_SUFFIX_ARTIFACT_DEBUG: &str = ".dbg.json";
/// Hardhat build-info directory; holds compiler I/O, not ABIs.
pub const C_NAME_DIR_BUILD_INFO: &str = "build-info";

/// Upper bound on default worker count when the caller sets none.
pub const N_WORKERS_DEFAULT_MAX: usize = 8;

/// Build the default single-artifact job (relative to the working directory).
pub fn derive_default_artifact_job() -> SpecArtifactJob {
    SpecArtifactJob::new(C_PATH_ARTIFACT_SRC_DEFAULT, C_PATH_ARTIFACT_DST_DEFAULT)
}
