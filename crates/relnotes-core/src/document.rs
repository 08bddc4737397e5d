//! Loading manifest documents from the before and after revisions

use serde_yaml::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Which revision a document comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Before,
    After,
}

/// Reads the same relative path out of the before and after directories
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    before_dir: PathBuf,
    after_dir: PathBuf,
}

impl DocumentLoader {
    pub fn new(before_dir: impl Into<PathBuf>, after_dir: impl Into<PathBuf>) -> Self {
        Self {
            before_dir: before_dir.into(),
            after_dir: after_dir.into(),
        }
    }

    /// Root directory of the given revision
    pub fn dir(&self, side: Side) -> &Path {
        match side {
            Side::Before => &self.before_dir,
            Side::After => &self.after_dir,
        }
    }

    /// Load and parse a document.
    ///
    /// A file that does not exist is `Ok(None)`: the document was added or
    /// removed between the two revisions. A blank file parses to `Null`.
    pub fn load(&self, side: Side, relative: impl AsRef<Path>) -> Result<Option<Value>, LoadError> {
        let path = self.dir(side).join(relative);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), ?side, "document missing, treating as empty");
                return Ok(None);
            }
            Err(source) => return Err(LoadError::Io { path, source }),
        };

        if content.trim().is_empty() {
            return Ok(Some(Value::Null));
        }

        serde_yaml::from_str(&content)
            .map(Some)
            .map_err(|source| LoadError::Parse { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, DocumentLoader) {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("before")).unwrap();
        fs::create_dir_all(root.path().join("after")).unwrap();
        let loader = DocumentLoader::new(root.path().join("before"), root.path().join("after"));
        (root, loader)
    }

    #[test]
    fn test_loads_each_side() {
        let (root, loader) = fixture();
        fs::write(root.path().join("before/m.yml"), "name: old\n").unwrap();
        fs::write(root.path().join("after/m.yml"), "name: new\n").unwrap();

        let before = loader.load(Side::Before, "m.yml").unwrap().unwrap();
        let after = loader.load(Side::After, "m.yml").unwrap().unwrap();

        assert_eq!(before["name"].as_str(), Some("old"));
        assert_eq!(after["name"].as_str(), Some("new"));
    }

    #[test]
    fn test_missing_file_is_none() {
        let (_root, loader) = fixture();
        assert!(loader.load(Side::Before, "missing.yml").unwrap().is_none());
    }

    #[test]
    fn test_blank_file_is_null() {
        let (root, loader) = fixture();
        fs::write(root.path().join("after/empty.yml"), "\n  \n").unwrap();

        assert_eq!(loader.load(Side::After, "empty.yml").unwrap(), Some(Value::Null));
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let (root, loader) = fixture();
        fs::write(root.path().join("after/bad.yml"), "releases: [unclosed\n").unwrap();

        let err = loader.load(Side::After, "bad.yml").unwrap_err();

        assert!(matches!(err, LoadError::Parse { .. }));
        assert!(err.to_string().contains("bad.yml"));
    }
}
