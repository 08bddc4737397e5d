//! Per-release version changes aggregated from diff operations

use crate::change::{Operation, OperationKind};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChangeError {
    #[error("Disallowed no-op: {kind:?} for `{name}` which is already {state}")]
    DisallowedNoop {
        name: String,
        kind: OperationKind,
        state: ChangeState,
    },
}

/// Where a named item ended up after folding in its operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeState {
    Added,
    Removed,
    Updated,
}

impl fmt::Display for ChangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeState::Added => "added",
            ChangeState::Removed => "removed",
            ChangeState::Updated => "updated",
        };
        f.write_str(s)
    }
}

impl ChangeState {
    /// Fold one more operation into the state.
    ///
    /// Adding something already added, or removing something already
    /// removed, means the operation stream is inconsistent.
    pub(crate) fn apply(
        current: Option<ChangeState>,
        kind: OperationKind,
        name: &str,
    ) -> Result<Option<ChangeState>, ChangeError> {
        match (current, kind) {
            (Some(state @ ChangeState::Added), OperationKind::Add)
            | (Some(state @ ChangeState::Removed), OperationKind::Remove) => {
                Err(ChangeError::DisallowedNoop {
                    name: name.to_string(),
                    kind,
                    state,
                })
            }
            (state, OperationKind::Context) => Ok(state),
            (None, OperationKind::Add) => Ok(Some(ChangeState::Added)),
            (None, OperationKind::Remove) => Ok(Some(ChangeState::Removed)),
            (Some(_), _) => Ok(Some(ChangeState::Updated)),
        }
    }
}

/// Old and new version of a single release or stemcell
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub name: String,
    pub old_version: Option<String>,
    pub new_version: Option<String>,
    pub old_url: Option<String>,
    pub new_url: Option<String>,
}

impl ChangeRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_old(mut self, version: impl Into<String>, url: Option<String>) -> Self {
        self.old_version = Some(version.into());
        self.old_url = url;
        self
    }

    pub fn with_new(mut self, version: impl Into<String>, url: Option<String>) -> Self {
        self.new_version = Some(version.into());
        self.new_url = url;
        self
    }

    /// Derived state; `None` only for a record nothing has been loaded into
    pub fn state(&self) -> Option<ChangeState> {
        match (&self.old_version, &self.new_version) {
            (Some(_), Some(_)) => Some(ChangeState::Updated),
            (Some(_), None) => Some(ChangeState::Removed),
            (None, Some(_)) => Some(ChangeState::Added),
            (None, None) => None,
        }
    }
}

/// Release changes keyed by name, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet {
    records: IndexMap<String, ChangeRecord>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one diff operation into the set.
    ///
    /// `canonicalize` turns an entry's raw url into the link to render; a
    /// `None` from it leaves the version unlinked.
    pub fn load_change<F>(&mut self, op: &Operation, canonicalize: F) -> Result<(), ChangeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if !op.is_change() {
            return Ok(());
        }

        let entry = &op.entry;
        let current = self.records.get(&entry.name).and_then(ChangeRecord::state);
        ChangeState::apply(current, op.kind, &entry.name)?;

        let url = entry.url.as_deref().and_then(&canonicalize);
        debug!(
            name = %entry.name,
            version = %entry.version,
            op = %op.kind.symbol(),
            linked = url.is_some(),
            "loading release change"
        );

        let record = self
            .records
            .entry(entry.name.clone())
            .or_insert_with(|| ChangeRecord::new(&entry.name));
        match op.kind {
            OperationKind::Add => {
                record.new_version = Some(entry.version.clone());
                record.new_url = url;
            }
            OperationKind::Remove => {
                record.old_version = Some(entry.version.clone());
                record.old_url = url;
            }
            OperationKind::Context => {}
        }
        Ok(())
    }

    /// Fold a whole operation stream, stopping at the first inconsistency
    pub fn load_all<'a, I, F>(&mut self, ops: I, canonicalize: F) -> Result<(), ChangeError>
    where
        I: IntoIterator<Item = &'a Operation>,
        F: Fn(&str) -> Option<String>,
    {
        for op in ops {
            self.load_change(op, &canonicalize)?;
        }
        Ok(())
    }

    /// Right-biased merge: every record in `other` replaces the one here
    pub fn merge(&mut self, other: ChangeSet) {
        for (name, record) in other.records {
            self.records.insert(name, record);
        }
    }

    pub fn insert(&mut self, record: ChangeRecord) {
        self.records.insert(record.name.clone(), record);
    }

    pub fn get(&self, name: &str) -> Option<&ChangeRecord> {
        self.records.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
