//! Operation representation for manifest diffs

use crate::entry::Entry;
use serde::{Deserialize, Serialize};

/// The kind of operation produced by the differ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    /// Item only exists on the after side
    Add,
    /// Item only exists on the before side
    Remove,
    /// Item is unchanged (context)
    Context,
}

impl OperationKind {
    /// Marker used in debug output, in the style of a unified diff
    pub fn symbol(&self) -> char {
        match self {
            OperationKind::Add => '+',
            OperationKind::Remove => '-',
            OperationKind::Context => ' ',
        }
    }
}

/// A single diff operation carrying the full item it applies to
#[derive(Debug, Clone, PartialEq)]
pub struct Operation<T = Entry> {
    /// The kind of operation
    pub kind: OperationKind,
    /// The item that was added, removed, or left in place
    pub entry: T,
}

impl<T> Operation<T> {
    pub fn new(kind: OperationKind, entry: T) -> Self {
        Self { kind, entry }
    }

    pub fn add(entry: T) -> Self {
        Self::new(OperationKind::Add, entry)
    }

    pub fn remove(entry: T) -> Self {
        Self::new(OperationKind::Remove, entry)
    }

    pub fn context(entry: T) -> Self {
        Self::new(OperationKind::Context, entry)
    }

    /// Check if this is an actual change (not just context)
    pub fn is_change(&self) -> bool {
        self.kind != OperationKind::Context
    }
}
