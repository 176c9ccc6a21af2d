//! Workspace folder type and the uri/include-path merge helpers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A `(uri, name, includePath?)` record designating a root of sources the
/// backend should index (§3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceFolder {
    pub uri: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "includePath")]
    pub include_path: Vec<String>,
}

impl WorkspaceFolder {
    /// Lowercased uri used as the dedup key (§4.4: "union by case-insensitive uri").
    pub fn uri_key(&self) -> String {
        self.uri.trim().to_lowercase()
    }

    /// Parses a raw JSON workspace-folder entry, tolerating missing/malformed
    /// fields per the duck-typed config documents the merger reads.
    pub fn from_value(value: &Value) -> Option<Self> {
        let uri = value.get("uri")?.as_str()?.to_string();
        if uri.trim().is_empty() {
            return None;
        }
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let include_path = value
            .get("includePath")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Some(Self {
            uri,
            name,
            include_path,
        })
    }
}

/// Appends `addition` into `target`, preserving first-occurrence order and
/// dropping empty/duplicate entries (§4.4's `additionalIncludePath` rule,
/// reused for the per-entry `includePath` merge too).
pub fn dedup_append(target: &mut Vec<String>, addition: impl IntoIterator<Item = String>) {
    for path in addition {
        if !path.is_empty() && !target.contains(&path) {
            target.push(path);
        }
    }
}

/// Merges one workspace-folder list into a uri-keyed accumulator, following
/// §4.4: entries present on both sides concatenate+dedup `includePath` and
/// take the later side's other scalar keys (name); entries on only one side
/// are copied as-is.
pub fn merge_into(
    accumulator: &mut Vec<WorkspaceFolder>,
    incoming: impl IntoIterator<Item = WorkspaceFolder>,
) {
    for folder in incoming {
        let key = folder.uri_key();
        if let Some(existing) = accumulator.iter_mut().find(|f| f.uri_key() == key) {
            existing.name = folder.name;
            dedup_append(&mut existing.include_path, folder.include_path);
        } else {
            accumulator.push(folder);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_value_parses_minimal_entry() {
        let v = json!({"uri": "file:///a", "name": "A"});
        let f = WorkspaceFolder::from_value(&v).unwrap();
        assert_eq!(f.uri, "file:///a");
        assert_eq!(f.name, "A");
        assert!(f.include_path.is_empty());
    }

    #[test]
    fn from_value_rejects_missing_uri() {
        let v = json!({"name": "A"});
        assert!(WorkspaceFolder::from_value(&v).is_none());
    }

    #[test]
    fn uri_key_is_case_insensitive() {
        let f = WorkspaceFolder {
            uri: "FILE:///A".into(),
            name: String::new(),
            include_path: vec![],
        };
        assert_eq!(f.uri_key(), "file:///a");
    }

    #[test]
    fn merge_into_dedups_by_case_insensitive_uri_and_concatenates_include_paths() {
        let mut acc = vec![WorkspaceFolder {
            uri: "file:///A".into(),
            name: "A".into(),
            include_path: vec!["/a".into()],
        }];
        merge_into(
            &mut acc,
            vec![WorkspaceFolder {
                uri: "FILE:///a".into(),
                name: "A2".into(),
                include_path: vec!["/b".into(), "/a".into()],
            }],
        );
        assert_eq!(acc.len(), 1);
        assert_eq!(acc[0].name, "A2");
        assert_eq!(acc[0].include_path, vec!["/a", "/b"]);
    }

    #[test]
    fn dedup_append_preserves_first_occurrence_and_drops_empties() {
        let mut v = vec!["/a".to_string()];
        dedup_append(&mut v, vec!["".into(), "/b".into(), "/a".into()]);
        assert_eq!(v, vec!["/a", "/b"]);
    }
}
