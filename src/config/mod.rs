//! Two-layer configuration merge (§4.4).
//!
//! Grounded on `config/mod.rs` in the teacher crate (primary-overrides-
//! fallback scalar merge, deep merge of nested maps) generalized to the
//! proxy's workspace-folder/include-path union semantics, which need
//! uri-keyed dedup rather than plain key overwrite.

pub mod workspace;

use std::collections::HashSet;
use std::path::Path;

use serde_json::{Map, Value};

pub use workspace::WorkspaceFolder;
use workspace::{dedup_append, merge_into};

use crate::env::Env;

/// Reference type codes from §4.5.2 (the backend's `ReferenceInfo.type`).
pub mod reference_type {
    pub const CONFIRMED: i64 = 0;
    pub const CONFIRMATION_IN_PROGRESS: i64 = 1;
    pub const COMMENT: i64 = 2;
    pub const STRING: i64 = 3;
    pub const INACTIVE: i64 = 4;
    pub const CANNOT_CONFIRM: i64 = 5;
    pub const NOT_A_REFERENCE: i64 = 6;
}

fn default_allowed_ref_type() -> HashSet<i64> {
    use reference_type::*;
    [CONFIRMED, CONFIRMATION_IN_PROGRESS, INACTIVE, CANNOT_CONFIRM]
        .into_iter()
        .collect()
}

/// The merged, process-lifetime configuration snapshot consumed by the
/// translators (§3 "Configuration view").
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub workspace_folders: Vec<WorkspaceFolder>,
    pub additional_include_path: Vec<String>,
    pub allowed_ref_type: HashSet<i64>,
    /// Any other scalar/unrecognized top-level keys, user wins over machine.
    pub extra: Map<String, Value>,
}

impl ProxyConfig {
    /// Loads, merges, and default-folder-injects the configuration per
    /// §4.4. Either input file may be missing or malformed; both cases are
    /// treated as an empty document (§7 item 5) and logged.
    pub fn load(env: &Env) -> Self {
        let machine = env
            .machine_config_path
            .as_deref()
            .map(read_json_or_empty)
            .unwrap_or_default();
        let user = env
            .user_config_path()
            .as_deref()
            .map(read_json_or_empty)
            .unwrap_or_default();

        let mut config = merge(&machine, &user);
        config.inject_default_workspace_folders(env);
        config
    }

    fn inject_default_workspace_folders(&mut self, env: &Env) {
        let mut defaults = Vec::new();
        if let Some(exe_dir) = &env.orgdir_exe {
            defaults.push(WorkspaceFolder {
                uri: exe_dir.join("XFC").to_string_lossy().into_owned(),
                name: "XFC".into(),
                include_path: Vec::new(),
            });
        }
        if let Some(appdata) = &env.orgdir_user_appdata {
            defaults.push(WorkspaceFolder {
                uri: appdata
                    .join("TMP")
                    .join("OriginC")
                    .join("X-Functions")
                    .to_string_lossy()
                    .into_owned(),
                name: "AppXFC".into(),
                include_path: Vec::new(),
            });
        }

        for default_folder in defaults {
            let key = default_folder.uri_key();
            let already_present = self
                .workspace_folders
                .iter()
                .any(|f| f.uri_key() == key);
            if !already_present {
                self.workspace_folders.push(default_folder);
            }
        }
    }
}

fn read_json_or_empty(path: &Path) -> Value {
    match std::fs::read_to_string(path) {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(e) => {
                log::warn!(target: "oclsp_proxy::config", "malformed config {}: {e}", path.display());
                Value::Object(Map::new())
            }
        },
        Err(_) => Value::Object(Map::new()),
    }
}

fn string_array(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

fn workspace_folders(value: &Value) -> Vec<WorkspaceFolder> {
    value
        .get("workspaceFolders")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(WorkspaceFolder::from_value).collect())
        .unwrap_or_default()
}

/// Merges a machine-wide and a per-user configuration document per §4.4.
fn merge(machine: &Value, user: &Value) -> ProxyConfig {
    let mut workspaces = Vec::new();
    merge_into(&mut workspaces, workspace_folders(machine));
    merge_into(&mut workspaces, workspace_folders(user));

    let mut additional_include_path = Vec::new();
    dedup_append(&mut additional_include_path, string_array(machine, "additionalIncludePath"));
    dedup_append(&mut additional_include_path, string_array(user, "additionalIncludePath"));

    let allowed_ref_type = user
        .get("allowed_ref_type")
        .or_else(|| machine.get("allowed_ref_type"))
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_else(default_allowed_ref_type);

    let mut extra = Map::new();
    const STRUCTURED_KEYS: [&str; 3] =
        ["workspaceFolders", "additionalIncludePath", "allowed_ref_type"];
    if let Some(obj) = machine.as_object() {
        for (k, v) in obj {
            if !STRUCTURED_KEYS.contains(&k.as_str()) {
                extra.insert(k.clone(), v.clone());
            }
        }
    }
    if let Some(obj) = user.as_object() {
        for (k, v) in obj {
            if !STRUCTURED_KEYS.contains(&k.as_str()) {
                extra.insert(k.clone(), v.clone());
            }
        }
    }

    ProxyConfig {
        workspace_folders: workspaces,
        additional_include_path,
        allowed_ref_type,
        extra,
    }
}
