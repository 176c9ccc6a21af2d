//! Request-side translators, host → backend (§4.5.1).
//!
//! Grounded field-for-field on `original_source/OCLSP.py`'s
//! `_handle_origin_*` functions.

use std::path::Path;

use serde_json::{json, Map, Value};

use crate::config::ProxyConfig;
use crate::env::Env;
use crate::ids::Correlator;
use crate::injector::Injector;
use crate::json_ext::{ensure_object, ValueExt};

const HOST_CLIENT_NAME: &str = "Visual Studio Code";
const HOST_CLIENT_VERSION: &str = "1.108.1";

fn path_to_file_uri(path: &std::path::Path) -> String {
    url::Url::from_file_path(path)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("file://{}", path.display()))
}

fn as_file_uri(raw: &str) -> String {
    if raw.starts_with("file://") {
        raw.to_string()
    } else {
        path_to_file_uri(std::path::Path::new(raw))
    }
}

pub fn initialize(message: &mut Value, env: &Env, config: &ProxyConfig) {
    let params = ensure_params(message);
    params.insert(
        "clientInfo".into(),
        json!({"name": HOST_CLIENT_NAME, "version": HOST_CLIENT_VERSION}),
    );

    let Some(origin_c_dir) = env.origin_c_dir() else {
        return;
    };
    params.insert(
        "rootPath".into(),
        Value::String(origin_c_dir.to_string_lossy().into_owned()),
    );

    let mut workspace_folders = vec![json!({
        "uri": path_to_file_uri(&origin_c_dir),
        "name": "OriginC",
    })];
    for folder in &config.workspace_folders {
        workspace_folders.push(json!({
            "uri": as_file_uri(&folder.uri),
            "name": folder.name,
        }));
    }
    params.insert("workspaceFolders".into(), Value::Array(workspace_folders));

    if env.cpptools_trace_enabled {
        let opts = ensure_object(message.get_mut("params").unwrap(), "initializationOptions");
        opts.insert("loggingLevel".into(), json!(1));
        params_mut(message).insert("trace".into(), json!("verbose"));
    }
}

fn ensure_params(message: &mut Value) -> &mut Map<String, Value> {
    ensure_object(message, "params")
}

fn params_mut(message: &mut Value) -> &mut Map<String, Value> {
    message
        .get_mut("params")
        .and_then(Value::as_object_mut)
        .expect("ensure_params already guaranteed this")
}

/// Enqueues the `cpptools/initialize` and per-workspace-folder
/// `cpptools/didChangeCppProperties` injections after `initialized` is
/// forwarded (§4.5.1 item "initialized").
pub fn initialized(
    env: &Env,
    config: &ProxyConfig,
    correlator: &Correlator,
    injector: &Injector,
    backend_bin_dir: &Path,
) {
    let init_params = super::templates::build_cpptools_initialize(env, config, backend_bin_dir);
    enqueue(correlator, injector, "cpptools/initialize", init_params);

    let Some(origin_c_dir) = env.origin_c_dir() else {
        return;
    };

    let origin_c_folder = crate::config::WorkspaceFolder {
        uri: origin_c_dir.to_string_lossy().into_owned(),
        name: "OriginC".into(),
        include_path: Vec::new(),
    };
    if let Some(message) =
        super::templates::build_cpptools_did_change_cpp_properties(env, config, &origin_c_folder)
    {
        enqueue(correlator, injector, "cpptools/didChangeCppProperties", message);
    }

    for folder in &config.workspace_folders {
        if let Some(message) =
            super::templates::build_cpptools_did_change_cpp_properties(env, config, folder)
        {
            enqueue(correlator, injector, "cpptools/didChangeCppProperties", message);
        }
    }
}

fn enqueue(correlator: &Correlator, injector: &Injector, method: &str, mut params: Value) {
    let id = correlator.allocate_proxy_originated();
    let message = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params.take(),
    });
    injector.push(message);
}

pub fn hover(message: &mut Value) {
    if let Some(obj) = message.as_object_mut() {
        obj.insert("method".into(), json!("cpptools/hover"));
    }
}

pub fn document_symbol(message: &mut Value) {
    if let Some(obj) = message.as_object_mut() {
        obj.insert("method".into(), json!("cpptools/getDocumentSymbols"));
    }
    let uri = message
        .get("params")
        .and_then(|p| p.get("textDocument"))
        .and_then(|td| td.get_str("uri"))
        .map(str::to_string);
    if let (Some(uri), Some(obj)) = (uri, message.as_object_mut()) {
        obj.insert("params".into(), json!({"uri": uri}));
    }
}

pub fn references(message: &mut Value) {
    if let Some(obj) = message.as_object_mut() {
        obj.insert("method".into(), json!("cpptools/findAllReferences"));
    }
    if let Some(params) = message.get_mut("params").and_then(Value::as_object_mut) {
        params.entry("newName").or_insert_with(|| json!(""));
        params.remove("context");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProxyConfig;

    fn test_env() -> Env {
        Env {
            org_version: 10.35,
            orgdir_exe: Some("/opt/host".into()),
            orgdir_uff: None,
            orgdir_user_appdata: None,
            machine_config_path: None,
            log_enabled: false,
            trace_enabled: false,
            cpptools_trace_enabled: false,
        }
    }

    fn empty_config() -> ProxyConfig {
        ProxyConfig {
            workspace_folders: Vec::new(),
            additional_include_path: Vec::new(),
            allowed_ref_type: Default::default(),
            extra: Default::default(),
        }
    }

    #[test]
    fn initialize_sets_client_info_root_path_and_workspace_folders() {
        let env = test_env();
        let config = empty_config();
        let mut msg = json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}});
        initialize(&mut msg, &env, &config);
        assert_eq!(msg["params"]["clientInfo"]["name"], "Visual Studio Code");
        assert_eq!(msg["params"]["rootPath"], "/opt/host/OriginC");
        assert_eq!(msg["params"]["workspaceFolders"][0]["name"], "OriginC");
        assert!(msg["params"]["workspaceFolders"][0]["uri"]
            .as_str()
            .unwrap()
            .starts_with("file://"));
    }

    #[test]
    fn initialize_appends_configured_workspace_folders() {
        let env = test_env();
        let mut config = empty_config();
        config.workspace_folders.push(crate::config::WorkspaceFolder {
            uri: "/src/extra".into(),
            name: "Extra".into(),
            include_path: Vec::new(),
        });
        let mut msg = json!({"params": {}});
        initialize(&mut msg, &env, &config);
        let folders = msg["params"]["workspaceFolders"].as_array().unwrap();
        assert_eq!(folders.len(), 2);
        assert_eq!(folders[1]["name"], "Extra");
    }

    #[test]
    fn initialize_sets_trace_options_when_cpptools_trace_enabled() {
        let mut env = test_env();
        env.cpptools_trace_enabled = true;
        let config = empty_config();
        let mut msg = json!({"params": {}});
        initialize(&mut msg, &env, &config);
        assert_eq!(msg["params"]["initializationOptions"]["loggingLevel"], 1);
        assert_eq!(msg["params"]["trace"], "verbose");
    }

    #[test]
    fn hover_rewrites_method_only() {
        let mut msg = json!({"id": 1, "method": "textDocument/hover", "params": {"foo": "bar"}});
        hover(&mut msg);
        assert_eq!(msg["method"], "cpptools/hover");
        assert_eq!(msg["params"]["foo"], "bar");
    }

    #[test]
    fn document_symbol_collapses_params_to_bare_uri() {
        let mut msg = json!({
            "method": "textDocument/documentSymbol",
            "params": {"textDocument": {"uri": "file:///x.c"}},
        });
        document_symbol(&mut msg);
        assert_eq!(msg["method"], "cpptools/getDocumentSymbols");
        assert_eq!(msg["params"], json!({"uri": "file:///x.c"}));
    }

    #[test]
    fn references_ensures_new_name_and_strips_context() {
        let mut msg = json!({
            "method": "textDocument/references",
            "params": {"context": {"includeDeclaration": true}},
        });
        references(&mut msg);
        assert_eq!(msg["method"], "cpptools/findAllReferences");
        assert_eq!(msg["params"]["newName"], "");
        assert!(msg["params"].get("context").is_none());
    }

    #[test]
    fn references_preserves_existing_new_name() {
        let mut msg = json!({"method": "textDocument/references", "params": {"newName": "x"}});
        references(&mut msg);
        assert_eq!(msg["params"]["newName"], "x");
    }
}
