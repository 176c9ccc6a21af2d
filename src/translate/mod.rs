//! Per-method dialect translators (§4.5).
//!
//! Grounded on `original_source/OCLSP.py`'s `_origin_method_handlers` and
//! `_lsp_method_handlers` dispatch tables (§9: "dynamic dispatch of handlers
//! by method name maps cleanly to a static table"), reimplemented here as
//! plain functions dispatched from `match` arms in [`translate_request`] and
//! [`translate_response`] rather than a runtime map, since Rust's `match` on
//! `&str` already compiles to the equivalent lookup without the indirection
//! of storing function pointers.

pub mod request;
pub mod response;
pub mod templates;

use std::path::Path;

use serde_json::Value;

use crate::config::ProxyConfig;
use crate::env::Env;
use crate::ids::Correlator;
use crate::injector::Injector;

/// Host version below which the older, string-only completion documentation
/// and flattened-symbol-tree behaviors are required (§4.9, §8).
pub const LEGACY_HOST_VERSION_THRESHOLD: f64 = 10.35;

/// Translates a host request before it is forwarded to the backend.
///
/// `host_id` is the request's original id (already extracted by the pump
/// before the id is rewritten); `message` has its `id` already rewritten to
/// the allocated backend id by the time this is called. Notifications pass
/// `host_id = None`. Side effects (template-based injections) are pushed
/// onto `injector` when the method is `initialized`.
pub fn translate_request(
    method: &str,
    message: &mut Value,
    env: &Env,
    config: &ProxyConfig,
    correlator: &Correlator,
    injector: &Injector,
    backend_bin_dir: &Path,
) {
    match method {
        "initialize" => request::initialize(message, env, config),
        "initialized" => request::initialized(env, config, correlator, injector, backend_bin_dir),
        "textDocument/hover" => request::hover(message),
        "textDocument/documentSymbol" => request::document_symbol(message),
        "textDocument/references" => request::references(message),
        _ => {}
    }
}

/// Translates a backend response before it is forwarded to the host, keyed
/// by the method recorded in the alias at request time (§4.3 step 2).
///
/// This key is the *outgoing* method name the host→backend pump actually
/// wrote to the backend (e.g. `cpptools/hover`), not the host's original
/// method name — `initialize`/`textDocument/completion` happen to be
/// unchanged by the request-side translator, but `hover`/`documentSymbol`/
/// `references` are renamed before being sent, and the alias records that
/// post-translation name so dispatch here matches `original_source`'s
/// `_lsp_method_handlers` table exactly.
pub fn translate_response(recorded_method: &str, message: &mut Value, env: &Env, config: &ProxyConfig) {
    match recorded_method {
        "initialize" => response::initialize(message),
        "textDocument/completion" => response::completion(message, env),
        "cpptools/hover" => response::hover(message),
        "cpptools/getDocumentSymbols" => response::document_symbol(message, env),
        "cpptools/findAllReferences" => response::references(message, config),
        _ => {}
    }
}
