//! Copy report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::spec::{CopyArtifactError, EnumArtifactCopyStatus, SpecArtifactJob, SpecCopyError};

/// Outcome of one successful (non-failing) artifact job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifactCopy {
    pub path_file_src: PathBuf,
    pub path_file_dst: PathBuf,
    pub status: EnumArtifactCopyStatus,
    /// Bytes written; `0` unless `status == Copied`.
    pub n_bytes: u64,
}

/// Aggregate counters and diagnostics for one `copy_artifacts` run.
#[derive(Debug, Default, Clone)]
pub struct ReportCopy {
    /// Number of jobs handed to the run.
    pub cnt_planned: u64,
    /// Number of jobs whose bytes were written.
    pub cnt_copied: u64,
    /// Number of jobs skipped by conflict rule or dry-run.
    pub cnt_skipped: u64,
    /// Total bytes written.
    pub bytes_copied: u64,
    /// Per-job results, in job order.
    pub results: Vec<Result<ReportArtifactCopy, SpecCopyError>>,
    /// Non-fatal warnings collected during the run.
    pub warnings: Vec<String>,
    /// All failures, per-job ones included.
    pub errors: Vec<SpecCopyError>,
}

impl ReportCopy {
    /// Number of collected hard errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_planned".to_string(), self.cnt_planned);
        dict_counts.insert("cnt_copied".to_string(), self.cnt_copied);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_failed".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts.insert("bytes_copied".to_string(), self.bytes_copied);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} planned={} copied={} skipped={} failed={} warnings={} bytes={}",
            self.cnt_planned,
            self.cnt_copied,
            self.cnt_skipped,
            self.error_count(),
            self.warning_count(),
            self.bytes_copied
        )
    }
}

impl fmt::Display for ReportCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[ABI]"))
    }
}

/// Mutable accumulator for copy statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportCopyBuilder {
    cnt_planned: u64,
    cnt_copied: u64,
    cnt_skipped: u64,
    bytes_copied: u64,
    results: Vec<Result<ReportArtifactCopy, SpecCopyError>>,
    warnings: Vec<String>,
    errors: Vec<SpecCopyError>,
}

impl ReportCopyBuilder {
    pub fn add_planned(&mut self, n: u64) {
        self.cnt_planned += n;
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Add one path-scoped error.
    pub fn add_error(&mut self, path: PathBuf, exception: String) {
        self.errors.push(SpecCopyError { path, exception });
    }

    /// Fold one job result into the counters.
    pub fn add_outcome(
        &mut self,
        spec_job: &SpecArtifactJob,
        res_copy: Result<ReportArtifactCopy, CopyArtifactError>,
    ) {
        match res_copy {
            Ok(report_job) => {
                match report_job.status {
                    EnumArtifactCopyStatus::Copied => {
                        self.cnt_copied += 1;
                        self.bytes_copied += report_job.n_bytes;
                    }
                    EnumArtifactCopyStatus::Skipped | EnumArtifactCopyStatus::DryRun => {
                        self.cnt_skipped += 1;
                    }
                }
                self.results.push(Ok(report_job));
            }
            Err(e) => {
                let path = e
                    .path()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| spec_job.path_file_src.clone());
                let spec_error = SpecCopyError {
                    path,
                    exception: e.to_string(),
                };
                self.errors.push(spec_error.clone());
                self.results.push(Err(spec_error));
            }
        }
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportCopy {
        ReportCopy {
            cnt_planned: self.cnt_planned,
            cnt_copied: self.cnt_copied,
            cnt_skipped: self.cnt_skipped,
            bytes_copied: self.bytes_copied,
            results: self.results,
            warnings: self.warnings,
            errors: self.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{ReportArtifactCopy, ReportCopy, ReportCopyBuilder};
    use crate::spec::{CopyArtifactError, EnumArtifactCopyStatus, SpecArtifactJob};

    #[test]
    fn report_copy_to_dict_and_format_agree() {
        let report = ReportCopy {
            cnt_planned: 4,
            cnt_copied: 2,
            cnt_skipped: 1,
            bytes_copied: 120,
            results: vec![],
            warnings: vec!["w".to_string()],
            errors: vec![],
        };

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_planned"], 4);
        assert_eq!(dict_counts["cnt_copied"], 2);
        assert_eq!(dict_counts["cnt_skipped"], 1);
        assert_eq!(dict_counts["cnt_failed"], 0);
        assert_eq!(dict_counts["cnt_warnings"], 1);
        assert_eq!(dict_counts["bytes_copied"], 120);

        let txt = report.format("[ABI]");
        assert_eq!(
            txt,
            "[ABI] planned=4 copied=2 skipped=1 failed=0 warnings=1 bytes=120"
        );
        assert_eq!(report.to_string(), txt);
    }

    #[test]
    fn builder_routes_statuses_and_errors() {
        let spec_job = SpecArtifactJob::new("a.json", "b.json");
        let mut builder = ReportCopyBuilder::default();
        builder.add_planned(3);
        builder.add_outcome(
            &spec_job,
            Ok(ReportArtifactCopy {
                path_file_src: PathBuf::from("a.json"),
                path_file_dst: PathBuf::from("b.json"),
                status: EnumArtifactCopyStatus::Copied,
                n_bytes: 10,
            }),
        );
        builder.add_outcome(
            &spec_job,
            Ok(ReportArtifactCopy {
                path_file_src: PathBuf::from("a.json"),
                path_file_dst: PathBuf::from("b.json"),
                status: EnumArtifactCopyStatus::DryRun,
                n_bytes: 0,
            }),
        );
        builder.add_outcome(
            &spec_job,
            Err(CopyArtifactError::SourceMissing(PathBuf::from("a.json"))),
        );

        let report = builder.build();
        assert_eq!(report.cnt_planned, 3);
        assert_eq!(report.cnt_copied, 1);
        assert_eq!(report.cnt_skipped, 1);
        assert_eq!(report.bytes_copied, 10);
        assert_eq!(report.results.len(), 3);
        assert!(report.results[1].is_ok());
        assert!(report.results[2].is_err());
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.errors[0].path, PathBuf::from("a.json"));
        assert!(!report.is_success());
    }
}
