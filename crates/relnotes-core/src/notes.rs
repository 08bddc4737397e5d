//! Assembling release notes from two checkouts

use crate::diff::Differ;
use crate::document::{DocumentLoader, LoadError, Side};
use crate::entry::{extract, ExtractMode};
use crate::opsfile::{ChangedFile, FileStatus, OpsFileError, OpsFileFinder};
use crate::release::{ChangeError, ChangeSet};
use crate::variable::{extract_variables, VariableChanges};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_MANIFEST: &str = "cf-deployment.yml";

#[derive(Error, Debug)]
pub enum NotesError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    OpsFile(#[from] OpsFileError),
    #[error("Inconsistent changes in {file}: {source}")]
    Change {
        file: String,
        #[source]
        source: ChangeError,
    },
}

/// Everything that changed between the two revisions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReleaseNotes {
    pub releases: ChangeSet,
    pub variables: VariableChanges,
    pub ops_files: Vec<ChangedFile>,
}

impl ReleaseNotes {
    pub fn ops_files_with(&self, status: FileStatus) -> impl Iterator<Item = &ChangedFile> {
        self.ops_files.iter().filter(move |f| f.status == status)
    }
}

/// Compares the manifest and ops-files of two checkouts
pub struct NotesBuilder<'a> {
    loader: &'a DocumentLoader,
    finder: &'a OpsFileFinder,
    manifest: String,
    differ: Differ,
}

impl<'a> NotesBuilder<'a> {
    pub fn new(loader: &'a DocumentLoader, finder: &'a OpsFileFinder) -> Self {
        Self {
            loader,
            finder,
            manifest: DEFAULT_MANIFEST.to_string(),
            differ: Differ::new(),
        }
    }

    pub fn with_manifest(mut self, manifest: impl Into<String>) -> Self {
        self.manifest = manifest.into();
        self
    }

    /// Build the notes, linking versions through `canonicalize`.
    ///
    /// Release changes from each ops-file are merged over the manifest's,
    /// in ops-file path order.
    pub fn build<F>(&self, canonicalize: F) -> Result<ReleaseNotes, NotesError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let before = self.loader.load(Side::Before, &self.manifest)?;
        let after = self.loader.load(Side::After, &self.manifest)?;

        let mut releases = self.compare(
            &self.manifest,
            before.as_ref(),
            after.as_ref(),
            ExtractMode::Manifest,
            &canonicalize,
        )?;

        let mut variables = VariableChanges::new();
        let variable_ops = self.differ.diff(
            &extract_variables(before.as_ref()),
            &extract_variables(after.as_ref()),
        );
        variables
            .load_all(&variable_ops)
            .map_err(|source| NotesError::Change {
                file: self.manifest.clone(),
                source,
            })?;

        for ops_file in self.finder.find(self.loader.dir(Side::After))? {
            let path = self.finder.repo_path(&ops_file);
            let before = self.loader.load(Side::Before, &path)?;
            let after = self.loader.load(Side::After, &path)?;
            let changes = self.compare(
                &ops_file,
                before.as_ref(),
                after.as_ref(),
                ExtractMode::OpsFile,
                &canonicalize,
            )?;
            if !changes.is_empty() {
                debug!(ops_file = %ops_file, count = changes.len(), "release changes in ops-file");
            }
            releases.merge(changes);
        }

        let ops_files = self
            .finder
            .changes_between(self.loader.dir(Side::Before), self.loader.dir(Side::After))?;

        info!(
            releases = releases.len(),
            variables = variables.len(),
            ops_files = ops_files.len(),
            "collected changes"
        );

        Ok(ReleaseNotes {
            releases,
            variables,
            ops_files,
        })
    }

    fn compare<F>(
        &self,
        file: &str,
        before: Option<&serde_yaml::Value>,
        after: Option<&serde_yaml::Value>,
        mode: ExtractMode,
        canonicalize: F,
    ) -> Result<ChangeSet, NotesError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ops = self
            .differ
            .diff(&extract(before, mode), &extract(after, mode));

        let mut changes = ChangeSet::new();
        changes
            .load_all(&ops, canonicalize)
            .map_err(|source| NotesError::Change {
                file: file.to_string(),
                source,
            })?;
        Ok(changes)
    }
}
