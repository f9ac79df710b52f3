//! Artifact copy and batch orchestration.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::report::{ReportArtifactCopy, ReportCopy, ReportCopyBuilder};
use crate::spec::{
    CopyArtifactError, EnumArtifactConflictStrategy, EnumArtifactCopyStatus,
    SpecArtifactCopyOptions, SpecArtifactJob,
};
use crate::util::{
    calculate_worker_limit, copy_file_with_metadata, derive_destination_key, is_parent_present,
};

/// Copy one artifact file from `file_source` to `file_destination`.
///
/// The source is validated before anything at the destination is touched, so
/// a missing or unreadable source never creates or alters the destination.
///
/// On success the destination holds the source bytes and, unless
/// `if_preserve_metadata` is off, the source's permissions and timestamps.
/// A pre-existing destination file is handled by `rule_conflict_file`.
pub fn copy_artifact<P, Q>(
    file_source: P,
    file_destination: Q,
    spec_cp_options: &SpecArtifactCopyOptions,
) -> Result<ReportArtifactCopy, CopyArtifactError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_file_src = file_source.as_ref();
    let path_file_dst = file_destination.as_ref();
    debug!(
        src = %path_file_src.display(),
        dst = %path_file_dst.display(),
        "copy artifact"
    );

    let meta_file_src = match fs::metadata(path_file_src) {
        Ok(v) => v,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(CopyArtifactError::SourceMissing(path_file_src.to_path_buf()));
        }
        Err(e) => return Err(CopyArtifactError::from_io(path_file_src, e)),
    };
    if !meta_file_src.is_file() {
        return Err(CopyArtifactError::SourceNotFile(path_file_src.to_path_buf()));
    }

    let derive_report = |status: EnumArtifactCopyStatus, n_bytes: u64| ReportArtifactCopy {
        path_file_src: path_file_src.to_path_buf(),
        path_file_dst: path_file_dst.to_path_buf(),
        status,
        n_bytes,
    };

    match fs::metadata(path_file_dst) {
        Ok(meta_file_dst) => {
            if meta_file_dst.is_dir() {
                return Err(CopyArtifactError::DestinationIsDirectory(
                    path_file_dst.to_path_buf(),
                ));
            }
            if is_same_file(&meta_file_src, &meta_file_dst, path_file_src, path_file_dst) {
                return Err(CopyArtifactError::SameFile(path_file_dst.to_path_buf()));
            }
            match spec_cp_options.rule_conflict_file {
                EnumArtifactConflictStrategy::Overwrite => {}
                EnumArtifactConflictStrategy::Skip => {
                    debug!(dst = %path_file_dst.display(), "destination exists, skipped");
                    return Ok(derive_report(EnumArtifactCopyStatus::Skipped, 0));
                }
                EnumArtifactConflictStrategy::Error => {
                    return Err(CopyArtifactError::DestinationExists(
                        path_file_dst.to_path_buf(),
                    ));
                }
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(CopyArtifactError::from_io(path_file_dst, e)),
    }

    if !is_parent_present(path_file_dst) {
        // `parent()` is non-empty here, see `is_parent_present`.
        let path_dir_parent = path_file_dst
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        if !spec_cp_options.if_create_parent_dirs {
            return Err(CopyArtifactError::DestinationParentMissing(path_dir_parent));
        }
        if !spec_cp_options.if_dry_run {
            fs::create_dir_all(&path_dir_parent)
                .map_err(|e| CopyArtifactError::from_io(&path_dir_parent, e))?;
        }
    }

    if spec_cp_options.if_dry_run {
        return Ok(derive_report(EnumArtifactCopyStatus::DryRun, 0));
    }

    let n_bytes = copy_file_with_metadata(
        path_file_src,
        path_file_dst,
        spec_cp_options.if_preserve_metadata,
    )?;
    info!(
        src = %path_file_src.display(),
        dst = %path_file_dst.display(),
        bytes = n_bytes,
        "artifact copied"
    );
    Ok(derive_report(EnumArtifactCopyStatus::Copied, n_bytes))
}

/// Same inode, so hard links and symlinks to the source count too.
#[cfg(unix)]
fn is_same_file(
    meta_file_src: &fs::Metadata,
    meta_file_dst: &fs::Metadata,
    _path_file_src: &Path,
    _path_file_dst: &Path,
) -> bool {
    use std::os::unix::fs::MetadataExt;

    (meta_file_src.dev(), meta_file_src.ino()) == (meta_file_dst.dev(), meta_file_dst.ino())
}

#[cfg(not(unix))]
fn is_same_file(
    _meta_file_src: &fs::Metadata,
    _meta_file_dst: &fs::Metadata,
    path_file_src: &Path,
    path_file_dst: &Path,
) -> bool {
    match (fs::canonicalize(path_file_src), fs::canonicalize(path_file_dst)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Run a batch of artifact jobs and aggregate the outcome.
///
/// A failing job is recorded in [`ReportCopy::errors`] and does not stop the
/// rest. Jobs resolving to one destination file are all rejected and none of
/// them is copied. Per-job results keep job order.
pub fn copy_artifacts(
    l_jobs: &[SpecArtifactJob],
    spec_cp_options: &SpecArtifactCopyOptions,
) -> ReportCopy {
    let mut builder_cp_report = ReportCopyBuilder::default();
    builder_cp_report.add_planned(l_jobs.len() as u64);

    let l_dst_keys: Vec<PathBuf> = l_jobs
        .iter()
        .map(|spec_job| derive_destination_key(&spec_job.path_file_dst))
        .collect();
    let mut dict_dst_counts: HashMap<&PathBuf, usize> = HashMap::new();
    for path_key in &l_dst_keys {
        *dict_dst_counts.entry(path_key).or_default() += 1;
    }

    let run_job = |(spec_job, path_key): (&SpecArtifactJob, &PathBuf)| {
        if dict_dst_counts[path_key] > 1 {
            return Err(CopyArtifactError::DuplicateDestination(
                spec_job.path_file_dst.clone(),
            ));
        }
        copy_artifact(
            &spec_job.path_file_src,
            &spec_job.path_file_dst,
            spec_cp_options,
        )
    };

    let n_workers_max = calculate_worker_limit(spec_cp_options.num_workers_max);
    let l_results = if n_workers_max <= 1 || l_jobs.len() <= 1 {
        l_jobs.iter().zip(&l_dst_keys).map(run_job).collect::<Vec<_>>()
    } else {
        match ThreadPoolBuilder::new().num_threads(n_workers_max).build() {
            Ok(thread_pool) => thread_pool.install(|| {
                l_jobs
                    .par_iter()
                    .zip(&l_dst_keys)
                    .map(run_job)
                    .collect::<Vec<_>>()
            }),
            Err(e) => {
                warn!("thread pool init failed: {e}");
                builder_cp_report.add_warning(format!(
                    "Failed to initialize thread pool (workers={n_workers_max}); fallback to serial copy."
                ));
                l_jobs.iter().zip(&l_dst_keys).map(run_job).collect::<Vec<_>>()
            }
        }
    };

    for (spec_job, res_copy) in l_jobs.iter().zip(l_results) {
        builder_cp_report.add_outcome(spec_job, res_copy);
    }

    let report = builder_cp_report.build();
    debug!("{}", report);
    report
}
