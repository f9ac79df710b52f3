//! Hardhat artifact tree discovery.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::conf::{C_EXT_ARTIFACT, C_NAME_DIR_BUILD_INFO};
use crate::spec::{CopyArtifactError, SpecArtifactDiscoverOptions, SpecArtifactJob};
use crate::util::{SpecArtifactPatterns, derive_contract_name};

#[derive(Debug)]
struct SpecDiscoverContext {
    path_dir_dst: PathBuf,
    spec_pats: SpecArtifactPatterns,
    l_jobs: Vec<SpecArtifactJob>,
}

/// Find contract ABI artifacts under a Hardhat `artifacts/` directory.
///
/// Every `<Contract>.json` becomes a job targeting
/// `dir_destination/<Contract>.json`. Debug sidecars (`*.dbg.json`) and the
/// `build-info` tree are ignored. Include/exclude globs match the contract
/// name. Entries are visited in name order, so the job list is stable.
///
/// Unreadable sub-directories are logged and skipped.
pub fn discover_artifacts<P, Q>(
    dir_artifacts: P,
    dir_destination: Q,
    spec_discover_options: &SpecArtifactDiscoverOptions,
) -> Result<Vec<SpecArtifactJob>, CopyArtifactError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_src = dir_artifacts.as_ref();
    if !path_dir_src.is_dir() {
        return Err(CopyArtifactError::SourceNotDirectory(
            path_dir_src.to_path_buf(),
        ));
    }

    let spec_pats = SpecArtifactPatterns::from_raw(
        spec_discover_options.patterns_include.as_deref(),
        spec_discover_options.patterns_exclude.as_deref(),
    )?;

    let mut spec_ctx = SpecDiscoverContext {
        path_dir_dst: dir_destination.as_ref().to_path_buf(),
        spec_pats,
        l_jobs: Vec::new(),
    };

    // Root read failure is fatal; nested ones are not.
    let iter_root = fs::read_dir(path_dir_src)
        .map_err(|e| CopyArtifactError::from_io(path_dir_src, e))?;
    walk_entries(iter_root, path_dir_src, &mut spec_ctx);

    debug!(
        dir = %path_dir_src.display(),
        n_jobs = spec_ctx.l_jobs.len(),
        "artifact discovery done"
    );
    Ok(spec_ctx.l_jobs)
}

fn walk_directory(path_root: &Path, spec_ctx: &mut SpecDiscoverContext) {
    match fs::read_dir(path_root) {
        Ok(iter_entries) => walk_entries(iter_entries, path_root, spec_ctx),
        Err(e) => warn!("Failed to read directory {} ({e})", path_root.display()),
    }
}

fn walk_entries(iter_entries: fs::ReadDir, path_root: &Path, spec_ctx: &mut SpecDiscoverContext) {
    let mut l_dirs: Vec<PathBuf> = Vec::new();
    let mut l_files: Vec<PathBuf> = Vec::new();

    for _entry_res in iter_entries {
        let entry = match _entry_res {
            Ok(v) => v,
            Err(e) => {
                warn!(
                    "Failed to read directory entry under {} ({e})",
                    path_root.display()
                );
                continue;
            }
        };
        let path_entry = entry.path();
        // `is_dir`/`is_file` follow symlinks.
        if path_entry.is_dir() {
            if entry.file_name() != C_NAME_DIR_BUILD_INFO {
                l_dirs.push(path_entry);
            }
        } else if path_entry.is_file() {
            l_files.push(path_entry);
        }
    }

    l_dirs.sort();
    l_files.sort();

    for path_file in l_files {
        let Some(name_contract) = derive_contract_name(&path_file) else {
            continue;
        };
        if spec_ctx.spec_pats.should_exclude(&name_contract) {
            continue;
        }
        let path_file_dst = spec_ctx
            .path_dir_dst
            .join(format!("{name_contract}.{C_EXT_ARTIFACT}"));
        spec_ctx
            .l_jobs
            .push(SpecArtifactJob::new(path_file, path_file_dst));
    }

    for path_dir in l_dirs {
        walk_directory(&path_dir, spec_ctx);
    }
}
