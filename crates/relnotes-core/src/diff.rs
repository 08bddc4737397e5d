//! Structural diff of ordered manifest items

use crate::change::{Operation, OperationKind};
use crate::entry::Entry;
use serde_yaml::Value;
use similar::{capture_diff_slices, Algorithm, DiffTag};
use std::collections::HashMap;

/// Canonical identity of an item for diffing.
///
/// Two items with equal fingerprints are the same item with the same
/// attributes; any attribute change gives a different fingerprint.
pub trait Fingerprint {
    fn fingerprint(&self) -> String;
}

impl Fingerprint for Entry {
    fn fingerprint(&self) -> String {
        let mut out = String::new();
        write_canonical(&Value::Mapping(self.attributes.clone()), &mut out);
        out
    }
}

/// Write a value with mapping keys sorted so key order never counts as a change
pub(crate) fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Mapping(mapping) => {
            let mut pairs: Vec<(String, &Value)> = mapping
                .iter()
                .map(|(k, v)| {
                    let mut key = String::new();
                    write_canonical(k, &mut key);
                    (key, v)
                })
                .collect();
            pairs.sort_by(|a, b| a.0.cmp(&b.0));

            out.push('{');
            for (key, v) in pairs {
                out.push_str(&key);
                out.push(':');
                write_canonical(v, out);
                out.push(',');
            }
            out.push('}');
        }
        Value::Sequence(items) => {
            out.push('[');
            for item in items {
                write_canonical(item, out);
                out.push(',');
            }
            out.push(']');
        }
        Value::Tagged(tagged) => {
            out.push_str(&tagged.tag.to_string());
            write_canonical(&tagged.value, out);
        }
        scalar => out.push_str(&format!("{:?}", scalar)),
    }
}

/// The diff engine for ordered lists of manifest items
pub struct Differ {
    algorithm: Algorithm,
}

impl Default for Differ {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Myers,
        }
    }
}

impl Differ {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Compute the add/remove operations that turn `before` into `after`.
    ///
    /// Unchanged items and items that only moved are dropped. Within a
    /// replaced run removes come before adds, so a changed item shows up as
    /// a remove followed by an add.
    pub fn diff<T>(&self, before: &[T], after: &[T]) -> Vec<Operation<T>>
    where
        T: Fingerprint + Clone,
    {
        let old_keys: Vec<String> = before.iter().map(T::fingerprint).collect();
        let new_keys: Vec<String> = after.iter().map(T::fingerprint).collect();

        let mut ops = Vec::new();
        for op in capture_diff_slices(self.algorithm, &old_keys, &new_keys) {
            let (tag, old_range, new_range) = op.as_tag_tuple();
            match tag {
                DiffTag::Equal => {
                    ops.extend(before[old_range].iter().cloned().map(Operation::context));
                }
                DiffTag::Delete => {
                    ops.extend(before[old_range].iter().cloned().map(Operation::remove));
                }
                DiffTag::Insert => {
                    ops.extend(after[new_range].iter().cloned().map(Operation::add));
                }
                DiffTag::Replace => {
                    ops.extend(before[old_range].iter().cloned().map(Operation::remove));
                    ops.extend(after[new_range].iter().cloned().map(Operation::add));
                }
            }
        }

        drop_moves(ops)
    }
}

/// Drop context operations and remove/add pairs of identical items.
///
/// An identical item removed in one place and added in another has only
/// changed position, which is not a change to report.
fn drop_moves<T: Fingerprint>(ops: Vec<Operation<T>>) -> Vec<Operation<T>> {
    let mut removed: HashMap<String, usize> = HashMap::new();
    let mut added: HashMap<String, usize> = HashMap::new();
    for op in &ops {
        match op.kind {
            OperationKind::Remove => *removed.entry(op.entry.fingerprint()).or_default() += 1,
            OperationKind::Add => *added.entry(op.entry.fingerprint()).or_default() += 1,
            OperationKind::Context => {}
        }
    }

    let mut moved: HashMap<String, (usize, usize)> = removed
        .into_iter()
        .filter_map(|(key, removes)| {
            let adds = added.get(&key).copied().unwrap_or(0);
            let pairs = removes.min(adds);
            (pairs > 0).then_some((key, (pairs, pairs)))
        })
        .collect();

    ops.into_iter()
        .filter(|op| op.is_change())
        .filter(|op| {
            let Some((removes, adds)) = moved.get_mut(&op.entry.fingerprint()) else {
                return true;
            };
            let budget = match op.kind {
                OperationKind::Remove => removes,
                _ => adds,
            };
            if *budget > 0 {
                *budget -= 1;
                false
            } else {
                true
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{extract, ExtractMode};

    fn entries(yaml: &str) -> Vec<Entry> {
        let doc: Value = serde_yaml::from_str(yaml).unwrap();
        extract(Some(&doc), ExtractMode::Manifest)
    }

    fn summary(ops: &[Operation]) -> Vec<String> {
        ops.iter()
            .map(|op| format!("{}{}@{}", op.kind.symbol(), op.entry.name, op.entry.version))
            .collect()
    }

    #[test]
    fn test_no_changes() {
        let list = entries("releases:\n- {name: a, version: '1'}\n- {name: b, version: '2'}\n");

        let ops = Differ::new().diff(&list, &list);

        assert!(ops.is_empty());
    }

    #[test]
    fn test_version_bump_is_remove_then_add() {
        let before = entries("releases:\n- {name: release-1, version: 1.1.0}\n");
        let after = entries("releases:\n- {name: release-1, version: 1.2.0}\n");

        let ops = Differ::new().diff(&before, &after);

        assert_eq!(summary(&ops), vec!["-release-1@1.1.0", "+release-1@1.2.0"]);
    }

    #[test]
    fn test_encounter_order_is_preserved() {
        let before = entries(
            "releases:\n- {name: a, version: '1'}\n- {name: b, version: '1'}\n- {name: c, version: '1'}\n",
        );
        let after = entries(
            "releases:\n- {name: a, version: '2'}\n- {name: b, version: '1'}\n- {name: c, version: '2'}\n- {name: d, version: '1'}\n",
        );

        let ops = Differ::new().diff(&before, &after);

        assert_eq!(
            summary(&ops),
            vec!["-a@1", "+a@2", "-c@1", "+c@2", "+d@1"]
        );
    }

    #[test]
    fn test_nested_attribute_change_surfaces() {
        let before = entries("releases:\n- {name: a, version: '1', sha1: abc}\n");
        let after = entries("releases:\n- {name: a, version: '1', sha1: def}\n");

        let ops = Differ::new().diff(&before, &after);

        assert_eq!(summary(&ops), vec!["-a@1", "+a@1"]);
    }

    #[test]
    fn test_key_order_is_not_a_change() {
        let before = entries("releases:\n- {name: a, version: '1'}\n");
        let after = entries("releases:\n- {version: '1', name: a}\n");

        assert!(Differ::new().diff(&before, &after).is_empty());
    }

    #[test]
    fn test_pure_move_is_dropped() {
        let before = entries("releases:\n- {name: a, version: '1'}\n- {name: b, version: '1'}\n");
        let after = entries("releases:\n- {name: b, version: '1'}\n- {name: a, version: '1'}\n");

        assert!(Differ::new().diff(&before, &after).is_empty());
    }

    #[test]
    fn test_patience_algorithm() {
        let before = entries(
            "releases:\n- {name: a, version: '1'}\n- {name: b, version: '1'}\n- {name: c, version: '1'}\n",
        );
        let after = entries(
            "releases:\n- {name: a, version: '1'}\n- {name: b, version: '2'}\n- {name: c, version: '1'}\n",
        );

        let ops = Differ::new()
            .with_algorithm(Algorithm::Patience)
            .diff(&before, &after);

        assert_eq!(summary(&ops), vec!["-b@1", "+b@2"]);
    }

    #[test]
    fn test_disjoint_lists() {
        let before = entries("releases:\n- {name: a, version: '1'}\n- {name: b, version: '1'}\n");
        let after = entries("releases:\n- {name: c, version: '1'}\n");

        let ops = Differ::new().diff(&before, &after);

        let removes = ops.iter().filter(|op| op.kind == OperationKind::Remove).count();
        let adds = ops.iter().filter(|op| op.kind == OperationKind::Add).count();
        assert_eq!(removes, 2);
        assert_eq!(adds, 1);
    }
}
