//! Configuration file handling

use crate::cli::Cli;
use anyhow::{Context, Result};
use regex::Regex;
use relnotes_core::canonical::{
    DEFAULT_MAX_REDIRECTS, DEFAULT_PACKAGE_INDEX_HOST, DEFAULT_TIMEOUT,
};
use relnotes_core::notes::DEFAULT_MANIFEST;
use relnotes_core::opsfile::DEFAULT_OPERATIONS_DIR;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub before_dir: PathBuf,
    pub after_dir: PathBuf,
    pub manifest: String,
    pub operations_dir: String,
    /// Regexes matched against ops-file paths relative to `operations_dir`
    pub exclude: Vec<String>,
    pub package_index_host: String,
    pub timeout_secs: u64,
    pub max_redirects: usize,
    pub offline: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            before_dir: PathBuf::from("cf-deployment-master"),
            after_dir: PathBuf::from("cf-deployment-release-candidate"),
            manifest: DEFAULT_MANIFEST.to_string(),
            operations_dir: DEFAULT_OPERATIONS_DIR.to_string(),
            exclude: vec!["(^|/)workaround/".to_string()],
            package_index_host: DEFAULT_PACKAGE_INDEX_HOST.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            offline: false,
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("relnotes").join("config.toml"))
    }

    /// Load from `path`, or from the default location when it exists.
    ///
    /// An explicitly given path must exist; a missing default file just
    /// means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Command-line flags win over the file
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(before) = &cli.before {
            self.before_dir = before.clone();
        }
        if let Some(after) = &cli.after {
            self.after_dir = after.clone();
        }
        if let Some(manifest) = &cli.manifest {
            self.manifest = manifest.clone();
        }
        if cli.offline {
            self.offline = true;
        }
    }

    pub fn exclude_patterns(&self) -> Result<Vec<Regex>> {
        self.exclude
            .iter()
            .map(|pattern| {
                Regex::new(pattern).with_context(|| format!("Invalid exclude pattern `{}`", pattern))
            })
            .collect()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
