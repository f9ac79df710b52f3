use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use filetime::{FileTime, set_file_times};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::conf::{C_EXT_ARTIFACT, C_SUFFIX_ARTIFACT_DEBUG, N_WORKERS_DEFAULT_MAX};
use crate::spec::CopyArtifactError;

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone, Default)]
pub(crate) struct SpecArtifactPatterns {
    pub(crate) patterns_include: Option<GlobSet>,
    pub(crate) patterns_exclude: Option<GlobSet>,
}

impl SpecArtifactPatterns {
    pub(crate) fn from_raw(
        patterns_include: Option<&[String]>,
        patterns_exclude: Option<&[String]>,
    ) -> Result<Self, CopyArtifactError> {
        Ok(Self {
            patterns_include: _compile(patterns_include)?,
            patterns_exclude: _compile(patterns_exclude)?,
        })
    }

    /// Include-list miss or exclude-list hit.
    pub(crate) fn should_exclude(&self, name_contract: &str) -> bool {
        let b_included = self
            .patterns_include
            .as_ref()
            .is_none_or(|set| set.is_match(name_contract));
        let b_excluded = self
            .patterns_exclude
            .as_ref()
            .is_some_and(|set| set.is_match(name_contract));
        !b_included || b_excluded
    }
}

fn _compile(patterns: Option<&[String]>) -> Result<Option<GlobSet>, CopyArtifactError> {
    let Some(patterns) = patterns else {
        return Ok(None);
    };
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| CopyArtifactError::InvalidPattern(format!("{pattern}: {e}")))?;
        builder.add(glob);
    }
    let set = builder
        .build()
        .map_err(|e| CopyArtifactError::InvalidPattern(e.to_string()))?;
    Ok(Some(set))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// Contract name of a Hardhat ABI artifact, or `None` for anything else
/// (debug sidecars, non-JSON files).
pub(crate) fn derive_contract_name(path_file: &Path) -> Option<String> {
    let c_name_file = path_file.file_name()?.to_str()?;
    if c_name_file.ends_with(C_SUFFIX_ARTIFACT_DEBUG) {
        return None;
    }
    if path_file.extension()?.to_str()? != C_EXT_ARTIFACT {
        return None;
    }
    path_file.file_stem()?.to_str().map(str::to_string)
}

/// `true` when the destination's parent exists (or the path has no parent).
pub(crate) fn is_parent_present(path_file_dst: &Path) -> bool {
    match path_file_dst.parent() {
        None => true,
        Some(p) if p.as_os_str().is_empty() => true,
        Some(p) => p.is_dir(),
    }
}

/// Identity of a destination path for duplicate detection within one batch.
///
/// The existing parent is canonicalized; otherwise `.`/`..` are folded
/// lexically and the result made absolute.
pub(crate) fn derive_destination_key(path_file_dst: &Path) -> PathBuf {
    if let Some(path_key) = _canonicalize_parent(path_file_dst) {
        return path_key;
    }
    let path_norm = _normalize_lexically(path_file_dst);
    let path_abs = std::path::absolute(&path_norm).unwrap_or(path_norm);
    _canonicalize_parent(&path_abs).unwrap_or(path_abs)
}

fn _canonicalize_parent(path_file: &Path) -> Option<PathBuf> {
    let c_name_file = path_file.file_name()?;
    let path_dir_parent = match path_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::canonicalize(path_dir_parent)
        .ok()
        .map(|p| p.join(c_name_file))
}

fn _normalize_lexically(path: &Path) -> PathBuf {
    let mut path_norm = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir
                if matches!(path_norm.components().next_back(), Some(Component::Normal(_))) =>
            {
                path_norm.pop();
            }
            _ => path_norm.push(component),
        }
    }
    path_norm
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Metadata

/// Copy bytes, then timestamps (and xattrs on Linux) when requested.
///
/// `fs::copy` already carries permission bits over.
pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
    if_preserve_metadata: bool,
) -> Result<u64, CopyArtifactError> {
    let n_bytes = fs::copy(path_file_src, path_file_dst)
        .map_err(|e| CopyArtifactError::from_io(path_file_dst, e))?;
    if if_preserve_metadata {
        apply_metadata(path_file_src, path_file_dst)
            .map_err(|e| CopyArtifactError::from_io(path_file_dst, e))?;
    }
    Ok(n_bytes)
}

fn apply_metadata(path_file_src: &Path, path_file_dst: &Path) -> Result<(), io::Error> {
    let stat_src = fs::metadata(path_file_src)?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;

    #[cfg(target_os = "linux")]
    {
        copy_xattrs_linux(path_file_src, path_file_dst);
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let iter_xattr_names = match xattr::list(path_file_src) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(path = %path_file_src.display(), "xattr list failed: {e}");
            return;
        }
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        if let Err(e) = xattr::set(path_file_dst, &name, &raw_value) {
            tracing::debug!(
                path = %path_file_dst.display(),
                name = ?name,
                "xattr set failed: {e}"
            );
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Workers

pub(crate) fn calculate_worker_limit(num_workers_max: Option<usize>) -> usize {
    let n_cpu = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);

    match num_workers_max {
        Some(n) => n.clamp(1, n_cpu),
        None => n_cpu.clamp(1, N_WORKERS_DEFAULT_MAX),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
