//! Response-side translators, backend → host (§4.5.2).
//!
//! Grounded field-for-field on `original_source/OCLSP.py`'s `_handle_lsp_*`
//! functions.

use serde_json::{json, Map, Value};

use crate::config::ProxyConfig;
use crate::env::Env;
use crate::json_ext::ValueExt;

use super::LEGACY_HOST_VERSION_THRESHOLD;

pub fn initialize(message: &mut Value) {
    let result = crate::json_ext::ensure_object(message, "result");
    if !matches!(result.get("capabilities"), Some(Value::Object(_))) {
        result.insert("capabilities".into(), Value::Object(Map::new()));
    }
    let capabilities = result
        .get_mut("capabilities")
        .and_then(Value::as_object_mut)
        .expect("just ensured capabilities is an object");
    capabilities.insert("hoverProvider".into(), json!(true));
    capabilities.insert("documentSymbolProvider".into(), json!(true));
    capabilities.insert("referencesProvider".into(), json!(true));
    if !matches!(capabilities.get("general"), Some(Value::Object(_))) {
        capabilities.insert("general".into(), Value::Object(Map::new()));
    }
    capabilities["general"]["positionEncodings"] = json!(["utf-8"]);
}

/// Sorts completion items and flattens `documentation` to a bare string, for
/// hosts too old to understand `MarkupContent` (§8: "iff ORG_VER < 10.35").
pub fn completion(message: &mut Value, env: &Env) {
    if env.org_version >= LEGACY_HOST_VERSION_THRESHOLD {
        return;
    }
    let Some(result) = message.get_mut("result") else {
        return;
    };
    if result.is_null() {
        return;
    }

    let items = if result.is_array() {
        result.as_array_mut()
    } else {
        result.get_mut("items").and_then(Value::as_array_mut)
    };
    let Some(items) = items else {
        return;
    };

    items.sort_by_cached_key(|item| {
        let sort_text = item
            .get_str("sortText")
            .filter(|s| !s.is_empty())
            .or_else(|| item.get_str("label"))
            .unwrap_or_default()
            .to_string();
        let len = sort_text.chars().count();
        (sort_text, len)
    });

    for item in items.iter_mut() {
        let Some(obj) = item.as_object_mut() else {
            continue;
        };
        let flattened = match obj.get("documentation") {
            Some(Value::Object(doc)) => Some(
                doc.get("value")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            ),
            _ => None,
        };
        if let Some(value) = flattened {
            obj.insert("documentation".into(), Value::String(value));
        }
    }
}

/// Normalizes `result.contents` to carry an explicit `kind` (§4.5.2).
pub fn hover(message: &mut Value) {
    let Some(result) = message.get_mut("result") else {
        return;
    };
    let Some(contents) = result.get_mut("contents") else {
        return;
    };

    match contents {
        Value::Array(items) => {
            if items.len() == 1 {
                if let Some(first) = items[0].as_object_mut() {
                    if first.contains_key("value") && !first.contains_key("kind") {
                        first.insert("kind".into(), json!("markdown"));
                    }
                }
            }
        }
        Value::Object(obj) => {
            if obj.contains_key("value") && !obj.contains_key("kind") {
                obj.insert("kind".into(), json!("markdown"));
            }
        }
        _ => {}
    }
}

/// Unwraps `{symbols: [...]}` and, for legacy hosts, flattens the symbol
/// tree (§4.5.2, §8).
pub fn document_symbol(message: &mut Value, env: &Env) {
    let unwrapped = match message.get("result") {
        Some(Value::Object(obj)) if obj.contains_key("symbols") => {
            Some(obj["symbols"].clone())
        }
        _ => None,
    };
    if let Some(symbols) = unwrapped {
        message["result"] = symbols;
    }

    if env.org_version >= LEGACY_HOST_VERSION_THRESHOLD {
        return;
    }
    let Some(Value::Array(symbols)) = message.get("result").cloned() else {
        return;
    };
    message["result"] = Value::Array(flatten_symbols(symbols, None));
}

fn flatten_symbols(symbols: Vec<Value>, parent_name: Option<&str>) -> Vec<Value> {
    let mut flat = Vec::new();
    for mut sym in symbols {
        let Some(obj) = sym.as_object_mut() else {
            flat.push(sym);
            continue;
        };
        match parent_name {
            Some(name) => {
                obj.insert("detail".into(), Value::String(name.to_string()));
            }
            None => {
                let detail_is_string = matches!(obj.get("detail"), Some(Value::String(_)));
                if !detail_is_string {
                    obj.insert("detail".into(), Value::String(String::new()));
                }
            }
        }
        let children = match obj.remove("children") {
            Some(Value::Array(children)) => children,
            _ => Vec::new(),
        };
        let own_name = obj.get_str("name").unwrap_or_default().to_string();
        flat.push(sym);
        if !children.is_empty() {
            flat.extend(flatten_symbols(children, Some(&own_name)));
        }
    }
    flat
}

/// Transforms `{referenceInfos: [...]}` into a standard `Location[]`,
/// filtering by the configured `allowed_ref_type` set (§4.5.2).
pub fn references(message: &mut Value, config: &ProxyConfig) {
    let infos = match message.get("result") {
        Some(Value::Object(obj)) => match obj.get("referenceInfos") {
            Some(Value::Array(infos)) => infos.clone(),
            _ => {
                message["result"] = json!([]);
                return;
            }
        },
        _ => {
            message["result"] = json!([]);
            return;
        }
    };

    let mut locations = Vec::new();
    for info in &infos {
        let Some(file) = info.get_str("file") else {
            continue;
        };
        let Some(position) = info.get("position") else {
            continue;
        };
        let ref_type = info.get_i64_loose("type").unwrap_or(0);
        if !config.allowed_ref_type.contains(&ref_type) {
            continue;
        }
        let uri = url::Url::from_file_path(file)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("file://{file}"));
        locations.push(json!({
            "uri": uri,
            "range": {"start": position, "end": position},
            "text": info.get_str("text").unwrap_or_default(),
            "type": ref_type,
        }));
    }
    message["result"] = Value::Array(locations);
}
