//! Ops-file discovery and detection of new, updated and deleted ops-files

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

pub const DEFAULT_OPERATIONS_DIR: &str = "operations";

#[derive(Error, Debug)]
pub enum OpsFileError {
    #[error("Failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("Failed to read ops-file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Status of an ops-file between the two revisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
}

/// An ops-file that differs between the two revisions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedFile {
    /// Path relative to the operations directory, `/`-separated
    pub path: String,
    pub status: FileStatus,
}

/// Finds ops-files under a repository's operations directory
#[derive(Debug, Clone)]
pub struct OpsFileFinder {
    operations_dir: String,
    exclude: Vec<Regex>,
}

impl Default for OpsFileFinder {
    fn default() -> Self {
        Self {
            operations_dir: DEFAULT_OPERATIONS_DIR.to_string(),
            exclude: Vec::new(),
        }
    }
}

impl OpsFileFinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operations_dir(mut self, dir: impl Into<String>) -> Self {
        self.operations_dir = dir.into();
        self
    }

    /// Skip ops-files whose relative path matches any of `patterns`
    pub fn with_exclude(mut self, patterns: Vec<Regex>) -> Self {
        self.exclude = patterns;
        self
    }

    /// Path of an ops-file relative to the repository root
    pub fn repo_path(&self, ops_file: &str) -> PathBuf {
        Path::new(&self.operations_dir).join(ops_file)
    }

    /// List the `.yml` ops-files in `repo_dir`, relative to the operations
    /// directory and sorted. Symlinked files and directories are followed.
    /// A repository without an operations directory has no ops-files.
    pub fn find(&self, repo_dir: &Path) -> Result<Vec<String>, OpsFileError> {
        let root = repo_dir.join(&self.operations_dir);
        if !root.is_dir() {
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(&root).follow_links(true) {
            let entry = entry.map_err(|source| OpsFileError::Scan {
                path: root.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&root) else {
                continue;
            };
            let relative = relative.to_string_lossy().replace('\\', "/");
            if relative.ends_with(".yml") {
                found.push(relative);
            }
        }

        found.retain(|path| !self.exclude.iter().any(|re| re.is_match(path)));
        found.sort();
        Ok(found)
    }

    /// Compare the ops-files of two repository checkouts
    pub fn changes_between(
        &self,
        before_dir: &Path,
        after_dir: &Path,
    ) -> Result<Vec<ChangedFile>, OpsFileError> {
        let before: BTreeSet<String> = self.find(before_dir)?.into_iter().collect();
        let after: BTreeSet<String> = self.find(after_dir)?.into_iter().collect();

        let mut changes = Vec::new();
        for path in before.union(&after) {
            let status = match (before.contains(path), after.contains(path)) {
                (false, true) => FileStatus::Added,
                (true, false) => FileStatus::Deleted,
                _ => {
                    let old = read(&before_dir.join(self.repo_path(path)))?;
                    let new = read(&after_dir.join(self.repo_path(path)))?;
                    if old == new {
                        continue;
                    }
                    FileStatus::Modified
                }
            };
            changes.push(ChangedFile {
                path: path.clone(),
                status,
            });
        }

        Ok(changes)
    }
}

fn read(path: &Path) -> Result<Vec<u8>, OpsFileError> {
    fs::read(path).map_err(|source| OpsFileError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_find_top_level_and_nested() {
        let repo = TempDir::new().unwrap();
        write(repo.path(), "operations/ops.yml", "[]");
        write(repo.path(), "operations/ops2.yml", "[]");
        write(repo.path(), "operations/README.md", "docs");
        write(repo.path(), "operations/experimental/ops.yml", "[]");
        write(repo.path(), "operations/addons/ops2.yml", "[]");
        fs::create_dir_all(repo.path().join("operations/empty")).unwrap();

        let found = OpsFileFinder::new().find(repo.path()).unwrap();

        assert_eq!(
            found,
            vec![
                "addons/ops2.yml",
                "experimental/ops.yml",
                "ops.yml",
                "ops2.yml"
            ]
        );
    }

    #[test]
    fn test_find_excludes_patterns() {
        let repo = TempDir::new().unwrap();
        write(repo.path(), "operations/ops.yml", "[]");
        write(repo.path(), "operations/workaround/hack.yml", "[]");
        write(repo.path(), "operations/experimental/workaround/hack.yml", "[]");

        let finder =
            OpsFileFinder::new().with_exclude(vec![Regex::new("(^|/)workaround/").unwrap()]);

        assert_eq!(finder.find(repo.path()).unwrap(), vec!["ops.yml"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_find_follows_symlinks() {
        use std::os::unix::fs::symlink;

        let repo = TempDir::new().unwrap();
        let shared = TempDir::new().unwrap();
        write(repo.path(), "operations/plain.yml", "[]");
        write(shared.path(), "linked.yml", "[]");
        symlink(
            shared.path().join("linked.yml"),
            repo.path().join("operations/linked.yml"),
        )
        .unwrap();
        symlink(shared.path(), repo.path().join("operations/shared-dir")).unwrap();

        let found = OpsFileFinder::new().find(repo.path()).unwrap();

        assert_eq!(
            found,
            vec!["linked.yml", "plain.yml", "shared-dir/linked.yml"]
        );
    }

    #[test]
    fn test_missing_operations_dir() {
        let repo = TempDir::new().unwrap();
        assert!(OpsFileFinder::new().find(repo.path()).unwrap().is_empty());
    }

    #[test]
    fn test_changes_between() {
        let before = TempDir::new().unwrap();
        let after = TempDir::new().unwrap();
        write(before.path(), "operations/same.yml", "- type: remove\n");
        write(after.path(), "operations/same.yml", "- type: remove\n");
        write(before.path(), "operations/changed.yml", "- type: remove\n");
        write(after.path(), "operations/changed.yml", "- type: replace\n");
        write(before.path(), "operations/gone.yml", "[]");
        write(after.path(), "operations/experimental/new.yml", "[]");

        let changes = OpsFileFinder::new()
            .changes_between(before.path(), after.path())
            .unwrap();

        assert_eq!(
            changes,
            vec![
                ChangedFile {
                    path: "changed.yml".to_string(),
                    status: FileStatus::Modified
                },
                ChangedFile {
                    path: "experimental/new.yml".to_string(),
                    status: FileStatus::Added
                },
                ChangedFile {
                    path: "gone.yml".to_string(),
                    status: FileStatus::Deleted
                },
            ]
        );
    }
}
