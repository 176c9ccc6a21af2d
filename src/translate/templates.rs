//! Bundled JSON template loading and overlay (§4.8), resolved relative to
//! the running binary's location the way `original_source/OCLSP.py`
//! resolves them relative to its own module file
//! (`Path(__file__).with_name(...)`).

use std::path::{Path, PathBuf};

use path_clean::PathClean;
use serde_json::{json, Map, Value};

use crate::config::{ProxyConfig, WorkspaceFolder};
use crate::env::Env;

const INITIALIZE_TEMPLATE: &str = "cpptools_initialize.json";
const DID_CHANGE_PROPERTIES_TEMPLATE: &str = "cpptools_didChangeCppProperties.json";

fn templates_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("templates")))
}

fn load(file_name: &str) -> Value {
    let Some(dir) = templates_dir() else {
        log::warn!(target: "oclsp_proxy::templates", "cannot resolve current executable path, using empty template for {file_name}");
        return Value::Object(Map::new());
    };
    let path = dir.join(file_name);
    match std::fs::read_to_string(&path) {
        Ok(text) => match serde_json::from_str::<Value>(&text) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) => {
                log::warn!(target: "oclsp_proxy::templates", "template {} is not a JSON object, using empty template", path.display());
                Value::Object(Map::new())
            }
            Err(e) => {
                log::warn!(target: "oclsp_proxy::templates", "malformed template {}: {e}", path.display());
                Value::Object(Map::new())
            }
        },
        Err(e) => {
            log::warn!(target: "oclsp_proxy::templates", "missing template {}: {e}", path.display());
            Value::Object(Map::new())
        }
    }
}

fn file_uri(path: &Path) -> String {
    url::Url::from_file_path(path)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("file://{}", path.display()))
}

/// `_OC_VER=<hex>` encoding (§4.9): the integer part as two uppercase hex
/// digits, then the first two decimal digits of the fractional part taken
/// verbatim (not hex-converted).
fn oc_ver_hex(version: f64) -> String {
    let formatted = format!("{version:.6}");
    let mut parts = formatted.splitn(2, '.');
    let major: i64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    let frac = parts.next().unwrap_or("000000");
    let minor = &frac[..frac.len().min(2)];
    format!("0x{major:02X}{minor}")
}

/// Builds the params for the injected `cpptools/initialize` request
/// (§4.5.1 item 1, grounded on `send_cpptools_initialize`).
///
/// `backend_bin_dir` is the directory containing the backend executable
/// (the CLI's positional argument, dirname'd) — `extensionPath` is its
/// parent, `edgeMessagesDirectory` is `<backend_bin_dir>/messages/en-us`.
pub fn build_cpptools_initialize(env: &Env, config: &ProxyConfig, backend_bin_dir: &Path) -> Value {
    let mut params = load(INITIALIZE_TEMPLATE);
    let obj = params.as_object_mut().expect("loaded template is an object");

    if let Some(storage_dir) = env.data_storage_dir() {
        let storage = storage_dir.join("OCLSP").join("storage");
        obj.insert(
            "databaseStoragePath".into(),
            Value::String(storage.join("databaseStorage").to_string_lossy().into_owned()),
        );
        obj.insert(
            "workspaceStoragePath".into(),
            Value::String(storage.join("workspaceStorage").to_string_lossy().into_owned()),
        );
        obj.insert(
            "cacheStoragePath".into(),
            Value::String(storage.join("cacheStorage").to_string_lossy().into_owned()),
        );
    }
    if let Some(extension_dir) = backend_bin_dir.parent() {
        obj.insert(
            "extensionPath".into(),
            Value::String(extension_dir.to_string_lossy().into_owned()),
        );
    }
    obj.insert(
        "edgeMessagesDirectory".into(),
        Value::String(
            backend_bin_dir
                .join("messages")
                .join("en-us")
                .to_string_lossy()
                .into_owned(),
        ),
    );

    let settings = ensure_object(obj, "settings");
    let needs_reset = !matches!(
        settings.get("workspaceFolderSettings"),
        Some(Value::Array(a)) if !a.is_empty()
    );
    if needs_reset {
        settings.insert(
            "workspaceFolderSettings".into(),
            Value::Array(vec![Value::Object(Map::new())]),
        );
    }

    let Some(origin_c_dir) = env.origin_c_dir() else {
        return params;
    };
    let default_include_path = format!("{}/System", origin_c_dir.to_string_lossy());

    let first_settings = settings["workspaceFolderSettings"][0]
        .as_object()
        .cloned()
        .unwrap_or_default();
    let mut first_settings = first_settings;
    first_settings.insert(
        "defaultSystemIncludePath".into(),
        json!([default_include_path]),
    );
    first_settings.insert("uri".into(), Value::String(file_uri(&origin_c_dir)));

    let folder_settings = settings["workspaceFolderSettings"]
        .as_array_mut()
        .expect("just ensured this is a non-empty array");
    folder_settings[0] = Value::Object(first_settings.clone());

    for folder in &config.workspace_folders {
        let mut entry = first_settings.clone();
        entry.insert("uri".into(), Value::String(as_file_uri(&folder.uri)));
        folder_settings.push(Value::Object(entry));
    }

    params
}

/// Builds the params for one injected `cpptools/didChangeCppProperties`
/// request, one per workspace folder (§4.5.1 item 2, grounded on
/// `send_cpptools_didChangeCppProperties`).
pub fn build_cpptools_did_change_cpp_properties(
    env: &Env,
    config: &ProxyConfig,
    folder: &WorkspaceFolder,
) -> Option<Value> {
    let mut params = load(DID_CHANGE_PROPERTIES_TEMPLATE);
    let obj = params.as_object_mut().expect("loaded template is an object");

    let origin_c_dir = env.origin_c_dir()?;
    let folder_path = folder_filesystem_path(&folder.uri)?;
    let is_origin_c_folder = folder_path == origin_c_dir;

    let configurations = obj
        .entry("configurations")
        .or_insert_with(|| Value::Array(vec![Value::Object(Map::new())]));
    if !matches!(configurations, Value::Array(a) if !a.is_empty()) {
        *configurations = Value::Array(vec![Value::Object(Map::new())]);
    }
    let configuration = configurations.as_array_mut().unwrap()[0]
        .as_object_mut()
        .expect("configuration entry is an object");

    let mut include_path = vec![format!("{}/**", origin_c_dir.to_string_lossy())];
    if !is_origin_c_folder {
        for extra in &config.additional_include_path {
            if !extra.is_empty() {
                include_path.push(format!("{extra}/**"));
            }
        }
        for inc in &folder.include_path {
            if !inc.is_empty() {
                include_path.push(format!("{inc}/**"));
            }
        }
    }
    configuration.insert(
        "includePath".into(),
        Value::Array(include_path.into_iter().map(Value::String).collect()),
    );

    let defines = configuration
        .entry("defines")
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Some(defines) = defines.as_array_mut() {
        defines.push(Value::String(format!("_OC_VER={}", oc_ver_hex(env.org_version))));
    }

    configuration.insert(
        "forcedInclude".into(),
        json!([origin_c_dir.join("System").join("folder.h").to_string_lossy()]),
    );

    obj.insert("workspaceFolderUri".into(), Value::String(file_uri(&folder_path)));

    Some(params)
}

fn as_file_uri(raw: &str) -> String {
    if raw.to_lowercase().starts_with("file://") {
        raw.to_string()
    } else {
        file_uri(Path::new(raw))
    }
}

/// Recovers a plain filesystem path from a workspace folder's `uri`, which
/// may already be a bare path (as the implicit OriginC folder is) or a
/// `file://` uri (§4.5.1, grounded on `send_cpptools_didChangeCppProperties`'s
/// `folder_path` extraction).
fn folder_filesystem_path(uri: &str) -> Option<PathBuf> {
    if uri.to_lowercase().starts_with("file:///") {
        Some(Path::new(&uri[8..]).clean())
    } else if Path::new(uri).is_absolute() {
        Some(Path::new(uri).clean())
    } else {
        None
    }
}

fn ensure_object<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    if !matches!(map.get(key), Some(Value::Object(_))) {
        map.insert(key.to_string(), Value::Object(Map::new()));
    }
    map.get_mut(key).and_then(Value::as_object_mut).unwrap()
}
