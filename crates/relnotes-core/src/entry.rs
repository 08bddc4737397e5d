//! Release and stemcell entries extracted from manifests and ops-files

use serde_yaml::{Mapping, Value};

/// How a document should be read when extracting entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    /// A deployment manifest with top-level `releases` and `stemcells` lists
    Manifest,
    /// An ops-file: a list of `{type, path, value}` patch operations
    OpsFile,
}

/// A named, versioned release or stemcell
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Release name, or the stemcell `os` when no name is given
    pub name: String,
    pub version: String,
    pub url: Option<String>,
    /// Every attribute of the source item, used for equality when diffing
    pub attributes: Mapping,
}

impl Entry {
    /// Build an entry from a release or stemcell item.
    ///
    /// Returns `None` for items that are not mappings or carry neither a
    /// `name` nor an `os`.
    pub fn from_item(item: &Value) -> Option<Self> {
        let attributes = item.as_mapping()?.clone();
        let name = item
            .get("name")
            .and_then(scalar_to_string)
            .or_else(|| item.get("os").and_then(scalar_to_string))?;
        let version = item
            .get("version")
            .and_then(scalar_to_string)
            .unwrap_or_default();
        let url = item.get("url").and_then(scalar_to_string);

        Some(Self {
            name,
            version,
            url,
            attributes,
        })
    }
}

/// Render a YAML scalar the way it reads in the manifest
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Extract the ordered list of entries from a document.
///
/// An absent or empty document yields no entries.
pub fn extract(document: Option<&Value>, mode: ExtractMode) -> Vec<Entry> {
    let Some(document) = document else {
        return Vec::new();
    };

    match mode {
        ExtractMode::Manifest => ["releases", "stemcells"]
            .iter()
            .filter_map(|key| document.get(key))
            .filter_map(Value::as_sequence)
            .flatten()
            .filter_map(Entry::from_item)
            .collect(),
        ExtractMode::OpsFile => document
            .as_sequence()
            .into_iter()
            .flatten()
            .filter(|op| is_release_replace(op))
            .filter_map(|op| op.get("value"))
            .filter_map(Entry::from_item)
            .collect(),
    }
}

fn is_release_replace(op: &Value) -> bool {
    let is_replace = op.get("type").and_then(Value::as_str) == Some("replace");
    let path = op.get("path").and_then(Value::as_str).unwrap_or_default();
    is_replace && (path.starts_with("/releases") || path.starts_with("/stemcells"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_manifest_releases_then_stemcells() {
        let doc = parse(
            r#"
releases:
- name: release-1
  version: 1.1.0
  url: https://bosh.io/d/github.com/org/release-1?v=1.1.0
- name: release-2
  version: "2.0"
stemcells:
- alias: default
  os: ubuntu-jammy
  version: "1.181"
"#,
        );

        let entries = extract(Some(&doc), ExtractMode::Manifest);

        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["release-1", "release-2", "ubuntu-jammy"]);
        assert_eq!(entries[0].version, "1.1.0");
        assert_eq!(
            entries[0].url.as_deref(),
            Some("https://bosh.io/d/github.com/org/release-1?v=1.1.0")
        );
        assert_eq!(entries[1].url, None);
        assert_eq!(entries[2].version, "1.181");
    }

    #[test]
    fn test_numeric_version_is_stringified() {
        let doc = parse("releases:\n- name: r\n  version: 42\n");
        let entries = extract(Some(&doc), ExtractMode::Manifest);
        assert_eq!(entries[0].version, "42");
    }

    #[test]
    fn test_absent_and_empty_documents() {
        assert!(extract(None, ExtractMode::Manifest).is_empty());
        assert!(extract(Some(&Value::Null), ExtractMode::Manifest).is_empty());
        assert!(extract(Some(&Value::Null), ExtractMode::OpsFile).is_empty());

        let doc = parse("name: cf\ninstance_groups: []\n");
        assert!(extract(Some(&doc), ExtractMode::Manifest).is_empty());
    }

    #[test]
    fn test_ops_file_keeps_release_replacements_only() {
        let doc = parse(
            r#"
- type: replace
  path: /releases/name=capi?
  value:
    name: capi
    version: 1.2.3
    url: https://bosh.io/d/github.com/cloudfoundry/capi-release?v=1.2.3
- type: remove
  path: /releases/name=routing
- type: replace
  path: /instance_groups/name=api/jobs/-
  value:
    name: not-a-release
    release: capi
- type: replace
  path: /stemcells/alias=windows?
  value:
    alias: windows
    os: windows2019
    version: "2019.50"
- type: replace
  path: /releases/name=capi/version
  value: 1.2.4
"#,
        );

        let entries = extract(Some(&doc), ExtractMode::OpsFile);

        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["capi", "windows2019"]);
        assert_eq!(entries[1].version, "2019.50");
    }

    #[test]
    fn test_item_without_name_or_os_is_skipped() {
        let doc = parse("releases:\n- version: 1.0\n- name: ok\n  version: 1.0\n");
        let entries = extract(Some(&doc), ExtractMode::Manifest);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "ok");
    }
}
