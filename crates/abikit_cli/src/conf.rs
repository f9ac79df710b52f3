//! `abikit.toml` config model and loading.

use std::fs;
use std::path::{Path, PathBuf};

use abikit_io_fs::{SpecArtifactDiscoverOptions, SpecArtifactJob};
use anyhow::Context;
use serde::Deserialize;

use crate::args::EnumConflictArg;

/// Config file looked up in the working directory when `--config` is absent.
pub const C_NAME_CONFIG_DEFAULT: &str = "abikit.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecConfigOptions {
    pub on_conflict: Option<EnumConflictArg>,
    pub preserve_metadata: Option<bool>,
    pub create_parents: Option<bool>,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecConfigArtifact {
    pub source: PathBuf,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecConfigDiscover {
    pub artifacts_dir: PathBuf,
    pub out_dir: PathBuf,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl SpecConfigDiscover {
    pub fn to_discover_options(&self) -> SpecArtifactDiscoverOptions {
        SpecArtifactDiscoverOptions {
            patterns_include: Some(self.include.clone()),
            patterns_exclude: Some(self.exclude.clone()),
        }
    }
}

/// Parsed `abikit.toml`.
///
/// All paths are resolved against the config file's directory by
/// [`SpecAbikitConfig::load`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecAbikitConfig {
    #[serde(default)]
    pub options: SpecConfigOptions,
    #[serde(default, rename = "artifact")]
    pub artifacts: Vec<SpecConfigArtifact>,
    #[serde(default)]
    pub discover: Option<SpecConfigDiscover>,
}

impl SpecAbikitConfig {
    /// Read and parse `path_file_conf`, then anchor relative paths to its directory.
    pub fn load(path_file_conf: &Path) -> anyhow::Result<Self> {
        let txt_conf = fs::read_to_string(path_file_conf)
            .with_context(|| format!("Failed to read config {}", path_file_conf.display()))?;
        let mut spec_conf = Self::parse(&txt_conf)
            .with_context(|| format!("Failed to parse config {}", path_file_conf.display()))?;

        let path_dir_base = path_file_conf
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        spec_conf.resolve_paths(path_dir_base);
        Ok(spec_conf)
    }

    pub fn parse(txt_conf: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(txt_conf)?)
    }

    fn resolve_paths(&mut self, path_dir_base: &Path) {
        for spec_artifact in &mut self.artifacts {
            spec_artifact.source = path_dir_base.join(&spec_artifact.source);
            spec_artifact.destination = path_dir_base.join(&spec_artifact.destination);
        }
        if let Some(spec_discover) = &mut self.discover {
            spec_discover.artifacts_dir = path_dir_base.join(&spec_discover.artifacts_dir);
            spec_discover.out_dir = path_dir_base.join(&spec_discover.out_dir);
        }
    }

    /// Explicit `[[artifact]]` entries as copy jobs.
    pub fn artifact_jobs(&self) -> Vec<SpecArtifactJob> {
        self.artifacts
            .iter()
            .map(|a| SpecArtifactJob::new(&a.source, &a.destination))
            .collect()
    }

    /// `true` when the file names no jobs at all.
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty() && self.discover.is_none()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::SpecAbikitConfig;
    use crate::args::EnumConflictArg;

    const C_CONF_FULL: &str = r#"
[options]
on_conflict = "skip"
preserve_metadata = false
create_parents = true
workers = 2

[[artifact]]
source = "contracts/artifacts/contracts/PayStream.sol/PayStream.json"
destination = "frontend/src/hooks/PayStream.json"

[[artifact]]
source = "/abs/Token.json"
destination = "frontend/src/hooks/Token.json"

[discover]
artifacts_dir = "contracts/artifacts"
out_dir = "frontend/src/abi"
include = ["PayStream*"]
"#;

    #[test]
    fn parse_full_config() {
        let spec_conf = SpecAbikitConfig::parse(C_CONF_FULL).expect("parse");
        assert_eq!(spec_conf.options.on_conflict, Some(EnumConflictArg::Skip));
        assert_eq!(spec_conf.options.preserve_metadata, Some(false));
        assert_eq!(spec_conf.options.create_parents, Some(true));
        assert_eq!(spec_conf.options.workers, Some(2));
        assert_eq!(spec_conf.artifacts.len(), 2);

        let spec_discover = spec_conf.discover.as_ref().expect("discover");
        assert_eq!(spec_discover.include, vec!["PayStream*"]);
        assert!(spec_discover.exclude.is_empty());
        assert!(!spec_conf.is_empty());
    }

    #[test]
    fn parse_empty_config_is_empty() {
        let spec_conf = SpecAbikitConfig::parse("").expect("parse");
        assert!(spec_conf.is_empty());
        assert_eq!(spec_conf, SpecAbikitConfig::default());
    }

    #[test]
    fn parse_rejects_unknown_keys_and_values() {
        assert!(SpecAbikitConfig::parse("[options]\nfollow_symlinks = true\n").is_err());
        assert!(SpecAbikitConfig::parse("[options]\non_conflict = \"merge\"\n").is_err());
        assert!(SpecAbikitConfig::parse("[[artifact]]\nsource = \"a.json\"\n").is_err());
    }

    #[test]
    fn load_resolves_paths_against_config_dir() {
        let tmp = TempDir::new().expect("tempdir");
        let path_file_conf = tmp.path().join("abikit.toml");
        fs::write(&path_file_conf, C_CONF_FULL).expect("write config");

        let spec_conf = SpecAbikitConfig::load(&path_file_conf).expect("load");
        let l_jobs = spec_conf.artifact_jobs();
        assert_eq!(
            l_jobs[0].path_file_src,
            tmp.path()
                .join("contracts/artifacts/contracts/PayStream.sol/PayStream.json")
        );
        assert_eq!(
            l_jobs[0].path_file_dst,
            tmp.path().join("frontend/src/hooks/PayStream.json")
        );
        #[cfg(unix)]
        assert_eq!(l_jobs[1].path_file_src, PathBuf::from("/abs/Token.json"));

        let spec_discover = spec_conf.discover.expect("discover");
        assert_eq!(spec_discover.artifacts_dir, tmp.path().join("contracts/artifacts"));
    }

    #[test]
    fn load_missing_file_reports_path() {
        let tmp = TempDir::new().expect("tempdir");
        let err = SpecAbikitConfig::load(&tmp.path().join("nope.toml")).expect_err("must fail");
        assert!(format!("{err:#}").contains("nope.toml"));
    }
}
