//! Relnotes Core - Manifest diff engine for release notes
//!
//! This library provides the data structures and algorithms for comparing
//! two revisions of a deployment manifest (and its ops-files) and turning
//! the differences into a Markdown release notes template.

pub mod canonical;
pub mod change;
pub mod diff;
pub mod document;
pub mod entry;
pub mod notes;
pub mod opsfile;
pub mod release;
pub mod render;
pub mod variable;

pub use canonical::{Canonicalizer, HttpProbe, Probe, ProbeError, ProbeOutcome};
pub use change::{Operation, OperationKind};
pub use diff::{Differ, Fingerprint};
pub use document::{DocumentLoader, LoadError, Side};
pub use entry::{extract, Entry, ExtractMode};
pub use notes::{NotesBuilder, NotesError, ReleaseNotes};
pub use opsfile::{ChangedFile, FileStatus, OpsFileError, OpsFileFinder};
pub use release::{ChangeError, ChangeRecord, ChangeSet, ChangeState};
pub use render::Renderer;
pub use variable::{extract_variables, Variable, VariableChanges, VariableUpdate};
