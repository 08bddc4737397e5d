//! Credential variable changes between manifest revisions

use crate::change::{Operation, OperationKind};
use crate::diff::{write_canonical, Fingerprint};
use crate::entry::scalar_to_string;
use crate::release::{ChangeError, ChangeState};
use indexmap::IndexMap;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

/// An item of the manifest's `variables` list
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    /// The credential type (`password`, `certificate`, ...)
    pub var_type: Option<String>,
    pub attributes: Mapping,
}

impl Fingerprint for Variable {
    fn fingerprint(&self) -> String {
        let mut out = String::new();
        write_canonical(&Value::Mapping(self.attributes.clone()), &mut out);
        out
    }
}

/// Extract the manifest's variables in declaration order
pub fn extract_variables(document: Option<&Value>) -> Vec<Variable> {
    document
        .and_then(|doc| doc.get("variables"))
        .and_then(Value::as_sequence)
        .into_iter()
        .flatten()
        .filter_map(|item| {
            Some(Variable {
                name: item.get("name").and_then(scalar_to_string)?,
                var_type: item.get("type").and_then(scalar_to_string),
                attributes: item.as_mapping()?.clone(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableUpdate {
    pub name: String,
    pub state: ChangeState,
    /// Type from the most recent operation
    pub var_type: Option<String>,
}

/// Variable changes keyed by name, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VariableChanges {
    updates: IndexMap<String, VariableUpdate>,
}

impl VariableChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_change(&mut self, op: &Operation<Variable>) -> Result<(), ChangeError> {
        if op.kind == OperationKind::Context {
            return Ok(());
        }

        let name = &op.entry.name;
        let current = self.updates.get(name).map(|u| u.state);
        let Some(state) = ChangeState::apply(current, op.kind, name)? else {
            return Ok(());
        };

        self.updates.insert(
            name.clone(),
            VariableUpdate {
                name: name.clone(),
                state,
                var_type: op.entry.var_type.clone(),
            },
        );
        Ok(())
    }

    pub fn load_all<'a, I>(&mut self, ops: I) -> Result<(), ChangeError>
    where
        I: IntoIterator<Item = &'a Operation<Variable>>,
    {
        ops.into_iter().try_for_each(|op| self.load_change(op))
    }

    pub fn get(&self, name: &str) -> Option<&VariableUpdate> {
        self.updates.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariableUpdate> {
        self.updates.values()
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}
