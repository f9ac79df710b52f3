//! Job planning and console reporting for `update_abi`.

use std::io::Write;
use std::path::Path;

use abikit_io_fs::{
    CopyArtifactError, EnumArtifactCopyStatus, ReportArtifactCopy, ReportCopy,
    ReportCopyBuilder, SpecArtifactCopyOptions, SpecArtifactDiscoverOptions, SpecArtifactJob,
    SpecCopyError, copy_artifact, copy_artifacts, derive_default_artifact_job,
    discover_artifacts,
};
use tracing::{debug, warn};

use crate::args::ArgsUpdateAbi;
use crate::conf::{C_NAME_CONFIG_DEFAULT, SpecAbikitConfig, SpecConfigDiscover, SpecConfigOptions};

/// Exit status when `--strict` is set and at least one job failed.
pub const N_EXIT_STRICT_FAILURE: u8 = 1;

/// Resolved work for one invocation.
#[derive(Debug, Default)]
pub struct SpecRunPlan {
    pub l_jobs: Vec<SpecArtifactJob>,
    /// Discovery roots that could not be scanned; reported like failed copies.
    pub l_discover_errors: Vec<CopyArtifactError>,
    pub spec_cp_options: SpecArtifactCopyOptions,
}

////////////////////////////////////////////////////////////////////////////////
// #region Planning

/// Turn flags + config into a job list.
///
/// Precedence: `--source/--destination`, then `--artifacts-dir/--out-dir`,
/// then the config file's jobs, then the built-in PayStream default. Relative
/// paths given on the command line resolve against `path_dir_cwd`.
pub fn resolve_plan(args: &ArgsUpdateAbi, path_dir_cwd: &Path) -> anyhow::Result<SpecRunPlan> {
    let spec_conf = load_config(args, path_dir_cwd)?;
    let mut spec_plan = SpecRunPlan {
        spec_cp_options: derive_copy_options(args, spec_conf.as_ref().map(|c| &c.options)),
        ..SpecRunPlan::default()
    };

    if let (Some(path_src), Some(path_dst)) = (&args.source, &args.destination) {
        spec_plan.l_jobs.push(SpecArtifactJob::new(
            path_dir_cwd.join(path_src),
            path_dir_cwd.join(path_dst),
        ));
    } else if let (Some(dir_artifacts), Some(dir_out)) = (&args.artifacts_dir, &args.out_dir) {
        push_discovered(
            &mut spec_plan,
            &path_dir_cwd.join(dir_artifacts),
            &path_dir_cwd.join(dir_out),
            &derive_discover_options(args, None),
        )?;
    } else if let Some(spec_conf) = spec_conf.filter(|c| !c.is_empty()) {
        spec_plan.l_jobs.extend(spec_conf.artifact_jobs());
        if let Some(spec_discover) = &spec_conf.discover {
            push_discovered(
                &mut spec_plan,
                &spec_discover.artifacts_dir,
                &spec_discover.out_dir,
                &derive_discover_options(args, Some(spec_discover)),
            )?;
        }
    } else {
        let spec_job = derive_default_artifact_job();
        spec_plan.l_jobs.push(SpecArtifactJob::new(
            path_dir_cwd.join(spec_job.path_file_src),
            path_dir_cwd.join(spec_job.path_file_dst),
        ));
    }

    debug!(n_jobs = spec_plan.l_jobs.len(), "plan resolved");
    Ok(spec_plan)
}

fn load_config(
    args: &ArgsUpdateAbi,
    path_dir_cwd: &Path,
) -> anyhow::Result<Option<SpecAbikitConfig>> {
    if let Some(path_file_conf) = &args.config {
        return SpecAbikitConfig::load(&path_dir_cwd.join(path_file_conf)).map(Some);
    }
    let path_file_conf = path_dir_cwd.join(C_NAME_CONFIG_DEFAULT);
    if path_file_conf.is_file() {
        debug!(path = %path_file_conf.display(), "using default config");
        return SpecAbikitConfig::load(&path_file_conf).map(Some);
    }
    Ok(None)
}

/// Flags win over `[options]`; `[options]` wins over library defaults.
fn derive_copy_options(
    args: &ArgsUpdateAbi,
    spec_conf_options: Option<&SpecConfigOptions>,
) -> SpecArtifactCopyOptions {
    let spec_conf_options = spec_conf_options.cloned().unwrap_or_default();
    SpecArtifactCopyOptions {
        rule_conflict_file: args
            .on_conflict
            .or(spec_conf_options.on_conflict)
            .map(Into::into)
            .unwrap_or_default(),
        if_preserve_metadata: !args.no_preserve_metadata
            && spec_conf_options.preserve_metadata.unwrap_or(true),
        if_create_parent_dirs: args.create_parents
            || spec_conf_options.create_parents.unwrap_or(false),
        if_dry_run: args.dry_run,
        num_workers_max: args.workers.or(spec_conf_options.workers),
    }
}

fn derive_discover_options(
    args: &ArgsUpdateAbi,
    spec_discover: Option<&SpecConfigDiscover>,
) -> SpecArtifactDiscoverOptions {
    let spec_base = spec_discover
        .map(SpecConfigDiscover::to_discover_options)
        .unwrap_or_default();
    let pick = |l_flag: &[String], l_base: Option<Vec<String>>| {
        if l_flag.is_empty() {
            l_base
        } else {
            Some(l_flag.to_vec())
        }
    };
    SpecArtifactDiscoverOptions {
        patterns_include: pick(&args.patterns_include, spec_base.patterns_include),
        patterns_exclude: pick(&args.patterns_exclude, spec_base.patterns_exclude),
    }
}

/// A missing artifacts dir is a run failure (the build has not run yet);
/// a bad glob is a usage error.
fn push_discovered(
    spec_plan: &mut SpecRunPlan,
    path_dir_artifacts: &Path,
    path_dir_out: &Path,
    spec_discover_options: &SpecArtifactDiscoverOptions,
) -> anyhow::Result<()> {
    match discover_artifacts(path_dir_artifacts, path_dir_out, spec_discover_options) {
        Ok(l_jobs) => spec_plan.l_jobs.extend(l_jobs),
        Err(e @ CopyArtifactError::InvalidPattern(_)) => return Err(e.into()),
        Err(e) => {
            warn!("artifact discovery failed: {e}");
            spec_plan.l_discover_errors.push(e);
        }
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Execution

/// Execute the plan, writing the intent/outcome lines to `writer`.
///
/// Copy failures never surface as `Err`: they are printed and collected in the
/// returned report. `Err` is reserved for setup problems and broken stdout.
pub fn run<W: Write>(
    args: &ArgsUpdateAbi,
    path_dir_cwd: &Path,
    writer: &mut W,
) -> anyhow::Result<ReportCopy> {
    let spec_plan = resolve_plan(args, path_dir_cwd)?;
    execute_plan(spec_plan, writer)
}

pub fn execute_plan<W: Write>(
    spec_plan: SpecRunPlan,
    writer: &mut W,
) -> anyhow::Result<ReportCopy> {
    if spec_plan.l_jobs.len() == 1 && spec_plan.l_discover_errors.is_empty() {
        return execute_single(&spec_plan.l_jobs[0], &spec_plan.spec_cp_options, writer);
    }

    let l_discover_errors: Vec<SpecCopyError> = spec_plan
        .l_discover_errors
        .iter()
        .map(|e| SpecCopyError {
            path: e.path().map(Path::to_path_buf).unwrap_or_default(),
            exception: e.to_string(),
        })
        .collect();
    for spec_error in &l_discover_errors {
        writeln!(writer, "Discovery failed: {}", spec_error.exception)?;
    }

    if spec_plan.l_jobs.is_empty() {
        writeln!(writer, "No artifacts to copy")?;
    }
    for spec_job in &spec_plan.l_jobs {
        write_intent(writer, spec_job)?;
    }

    let mut report = copy_artifacts(&spec_plan.l_jobs, &spec_plan.spec_cp_options);
    for res_copy in &report.results {
        match res_copy {
            Ok(report_job) => writeln!(
                writer,
                "{}: {}",
                format_outcome(report_job.status),
                report_job.path_file_dst.display()
            )?,
            Err(spec_error) => {
                warn!(path = %spec_error.path.display(), "{}", spec_error.exception);
                writeln!(writer, "Copy failed: {}", spec_error.exception)?;
            }
        }
    }
    for warning in &report.warnings {
        warn!("{warning}");
    }

    report.errors.extend(l_discover_errors);
    writeln!(writer, "{report}")?;
    Ok(report)
}

fn execute_single<W: Write>(
    spec_job: &SpecArtifactJob,
    spec_cp_options: &SpecArtifactCopyOptions,
    writer: &mut W,
) -> anyhow::Result<ReportCopy> {
    write_intent(writer, spec_job)?;

    let res_copy = copy_artifact(&spec_job.path_file_src, &spec_job.path_file_dst, spec_cp_options);
    match &res_copy {
        Ok(report_job) => writeln!(writer, "{}", format_outcome_single(report_job))?,
        Err(e) => {
            warn!("{e}");
            writeln!(writer, "Copy failed: {e}")?;
        }
    }

    let mut builder_cp_report = ReportCopyBuilder::default();
    builder_cp_report.add_planned(1);
    builder_cp_report.add_outcome(spec_job, res_copy);
    Ok(builder_cp_report.build())
}

fn write_intent<W: Write>(writer: &mut W, spec_job: &SpecArtifactJob) -> std::io::Result<()> {
    writeln!(
        writer,
        "Attempting to copy from {} to {}",
        spec_job.path_file_src.display(),
        spec_job.path_file_dst.display()
    )
}

fn format_outcome(status: EnumArtifactCopyStatus) -> &'static str {
    match status {
        EnumArtifactCopyStatus::Copied => "Copy successful",
        EnumArtifactCopyStatus::Skipped => "Copy skipped, destination exists",
        EnumArtifactCopyStatus::DryRun => "Copy planned (dry run)",
    }
}

fn format_outcome_single(report_job: &ReportArtifactCopy) -> String {
    match report_job.status {
        EnumArtifactCopyStatus::Copied => "Copy successful!".to_string(),
        status => format_outcome(status).to_string(),
    }
}

/// `0` unless `--strict` and something failed.
pub fn derive_exit_code(report: &ReportCopy, if_strict: bool) -> u8 {
    if if_strict && !report.is_success() {
        N_EXIT_STRICT_FAILURE
    } else {
        0
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use abikit_io_fs::{
        C_PATH_ARTIFACT_DST_DEFAULT, C_PATH_ARTIFACT_SRC_DEFAULT, EnumArtifactConflictStrategy,
    };
    use tempfile::TempDir;

    use super::{derive_exit_code, resolve_plan, run};
    use crate::args::{ArgsUpdateAbi, EnumConflictArg};

    fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, txt).expect("write text");
    }

    fn run_to_string(args: &ArgsUpdateAbi, path_dir_cwd: &Path) -> (String, u8) {
        let mut raw_out = Vec::new();
        let report = run(args, path_dir_cwd, &mut raw_out).expect("run");
        (
            String::from_utf8(raw_out).expect("utf8"),
            derive_exit_code(&report, args.strict),
        )
    }

    #[test]
    fn default_job_copies_paystream_abi() {
        let tmp = TempDir::new().expect("tempdir");
        write_text(&tmp.path().join(C_PATH_ARTIFACT_SRC_DEFAULT), r#"{"abi":[]}"#);
        fs::create_dir_all(tmp.path().join("frontend/src/hooks")).expect("mkdir hooks");

        let (txt_out, n_exit) = run_to_string(&ArgsUpdateAbi::default(), tmp.path());
        let l_lines: Vec<&str> = txt_out.lines().collect();

        assert_eq!(l_lines.len(), 2);
        assert!(l_lines[0].starts_with("Attempting to copy from "));
        assert!(l_lines[0].contains("PayStream.sol"));
        assert_eq!(l_lines[1], "Copy successful!");
        assert_eq!(n_exit, 0);
        assert_eq!(
            fs::read_to_string(tmp.path().join(C_PATH_ARTIFACT_DST_DEFAULT)).expect("read dst"),
            r#"{"abi":[]}"#
        );
    }

    #[test]
    fn missing_source_prints_failure_and_exits_zero() {
        let tmp = TempDir::new().expect("tempdir");
        fs::create_dir_all(tmp.path().join("frontend/src/hooks")).expect("mkdir hooks");

        let (txt_out, n_exit) = run_to_string(&ArgsUpdateAbi::default(), tmp.path());
        let l_lines: Vec<&str> = txt_out.lines().collect();

        assert_eq!(l_lines.len(), 2);
        assert!(l_lines[1].starts_with("Copy failed: "));
        assert!(l_lines[1].contains("PayStream.json"));
        assert_eq!(n_exit, 0);
        assert!(!tmp.path().join(C_PATH_ARTIFACT_DST_DEFAULT).exists());
    }

    #[test]
    fn strict_turns_failure_into_exit_one() {
        let tmp = TempDir::new().expect("tempdir");
        let args = ArgsUpdateAbi {
            strict: true,
            ..ArgsUpdateAbi::default()
        };
        let (_, n_exit) = run_to_string(&args, tmp.path());
        assert_eq!(n_exit, 1);
    }

    #[test]
    fn explicit_paths_override_config_jobs() {
        let tmp = TempDir::new().expect("tempdir");
        write_text(&tmp.path().join("a.json"), "a");
        write_text(
            &tmp.path().join("abikit.toml"),
            "[options]\non_conflict = \"error\"\n\n[[artifact]]\nsource = \"x.json\"\ndestination = \"y.json\"\n",
        );
        let args = ArgsUpdateAbi {
            source: Some("a.json".into()),
            destination: Some("b.json".into()),
            ..ArgsUpdateAbi::default()
        };

        let spec_plan = resolve_plan(&args, tmp.path()).expect("plan");
        assert_eq!(spec_plan.l_jobs.len(), 1);
        assert_eq!(spec_plan.l_jobs[0].path_file_src, tmp.path().join("a.json"));
        assert_eq!(
            spec_plan.spec_cp_options.rule_conflict_file,
            EnumArtifactConflictStrategy::Error
        );

        let args = ArgsUpdateAbi {
            on_conflict: Some(EnumConflictArg::Skip),
            ..args
        };
        let spec_plan = resolve_plan(&args, tmp.path()).expect("plan");
        assert_eq!(
            spec_plan.spec_cp_options.rule_conflict_file,
            EnumArtifactConflictStrategy::Skip
        );
    }

    #[test]
    fn config_jobs_and_discovery_run_as_batch() {
        let tmp = TempDir::new().expect("tempdir");
        write_text(
            &tmp.path().join("contracts/artifacts/contracts/PayStream.sol/PayStream.json"),
            r#"{"abi":[]}"#,
        );
        write_text(
            &tmp.path().join("contracts/artifacts/contracts/Token.sol/Token.json"),
            r#"{"abi":[1]}"#,
        );
        write_text(&tmp.path().join("extra.json"), "{}");
        write_text(
            &tmp.path().join("abikit.toml"),
            r#"
[options]
create_parents = true

[[artifact]]
source = "extra.json"
destination = "frontend/src/extra.json"

[discover]
artifacts_dir = "contracts/artifacts"
out_dir = "frontend/src/abi"
exclude = ["Token"]
"#,
        );

        let (txt_out, n_exit) = run_to_string(&ArgsUpdateAbi::default(), tmp.path());
        assert_eq!(n_exit, 0);
        assert_eq!(txt_out.matches("Attempting to copy from ").count(), 2);
        assert_eq!(txt_out.matches("Copy successful: ").count(), 2);
        assert!(
            txt_out
                .lines()
                .last()
                .expect("summary")
                .starts_with("[ABI] planned=2 copied=2 skipped=0 failed=0")
        );
        assert!(tmp.path().join("frontend/src/abi/PayStream.json").exists());
        assert!(!tmp.path().join("frontend/src/abi/Token.json").exists());
        assert!(tmp.path().join("frontend/src/extra.json").exists());
    }

    #[test]
    fn batch_outcome_lines_follow_job_order() {
        let tmp = TempDir::new().expect("tempdir");
        write_text(&tmp.path().join("a.json"), "a");
        write_text(&tmp.path().join("c.json"), "c");
        write_text(
            &tmp.path().join("abikit.toml"),
            r#"
[[artifact]]
source = "a.json"
destination = "out_a.json"

[[artifact]]
source = "b.json"
destination = "out_b.json"

[[artifact]]
source = "c.json"
destination = "out_c.json"
"#,
        );

        let (txt_out, n_exit) = run_to_string(&ArgsUpdateAbi::default(), tmp.path());
        let l_lines: Vec<&str> = txt_out.lines().collect();

        assert_eq!(n_exit, 0);
        assert_eq!(l_lines.len(), 7);
        assert!(l_lines[3].starts_with("Copy successful: "));
        assert!(l_lines[3].ends_with("out_a.json"));
        assert!(l_lines[4].starts_with("Copy failed: "));
        assert!(l_lines[4].contains("b.json"));
        assert!(l_lines[5].starts_with("Copy successful: "));
        assert!(l_lines[5].ends_with("out_c.json"));
        assert!(l_lines[6].starts_with("[ABI] planned=3 copied=2 skipped=0 failed=1"));
    }

    #[test]
    fn missing_artifacts_dir_is_reported_not_raised() {
        let tmp = TempDir::new().expect("tempdir");
        let args = ArgsUpdateAbi {
            artifacts_dir: Some("contracts/artifacts".into()),
            out_dir: Some("abi".into()),
            ..ArgsUpdateAbi::default()
        };

        let mut raw_out = Vec::new();
        let report = run(&args, tmp.path(), &mut raw_out).expect("run");
        let txt_out = String::from_utf8(raw_out).expect("utf8");

        assert!(txt_out.starts_with("Discovery failed: "));
        assert!(txt_out.contains("No artifacts to copy"));
        assert_eq!(report.error_count(), 1);
        assert_eq!(derive_exit_code(&report, false), 0);
        assert_eq!(derive_exit_code(&report, true), 1);
    }

    #[test]
    fn invalid_glob_is_a_setup_error() {
        let tmp = TempDir::new().expect("tempdir");
        fs::create_dir_all(tmp.path().join("artifacts")).expect("mkdir");
        let args = ArgsUpdateAbi {
            artifacts_dir: Some("artifacts".into()),
            out_dir: Some("abi".into()),
            patterns_include: vec!["[".to_string()],
            ..ArgsUpdateAbi::default()
        };
        assert!(resolve_plan(&args, tmp.path()).is_err());
    }

    #[test]
    fn dry_run_reports_plan_only() {
        let tmp = TempDir::new().expect("tempdir");
        write_text(&tmp.path().join("a.json"), "a");
        let args = ArgsUpdateAbi {
            source: Some("a.json".into()),
            destination: Some("out/b.json".into()),
            create_parents: true,
            dry_run: true,
            ..ArgsUpdateAbi::default()
        };

        let (txt_out, n_exit) = run_to_string(&args, tmp.path());
        assert_eq!(txt_out.lines().nth(1), Some("Copy planned (dry run)"));
        assert_eq!(n_exit, 0);
        assert!(!tmp.path().join("out").exists());
    }
}
