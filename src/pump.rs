//! The four long-running pump threads (§4.6, §5).
//!
//! Grounded on the teacher's bridge workers in spirit (dedicated threads
//! per direction, shared write mutexes) but built on blocking `std::io`
//! instead of the teacher's tokio tasks, per the proxy's explicit
//! OS-thread concurrency model (§5).

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::config::ProxyConfig;
use crate::env::Env;
use crate::ids::{Correlator, RequestId, Resolution};
use crate::injector::Injector;
use crate::json_ext::ValueExt;
use crate::shutdown::Shutdown;
use crate::transport;
use crate::translate;

/// Shared, process-lifetime context every pump reads from (§9: "a single
/// process-wide context struct ... threaded through pumps by reference").
pub struct Context {
    pub env: Env,
    pub config: ProxyConfig,
    pub correlator: Correlator,
    pub injector: Injector,
    pub shutdown: Shutdown,
    pub backend_bin_dir: PathBuf,
}

fn write_framed<W: Write>(mutex: &Mutex<W>, body: &[u8]) -> std::io::Result<()> {
    let mut writer = mutex.lock().unwrap();
    transport::write_message(&mut *writer, body)
}

/// host stdin → backend stdin. Allocates aliases, runs request-side
/// translation, and drives `initialized`-triggered injections.
pub fn host_to_backend<R: BufRead, W: Write>(
    mut host_in: R,
    backend_in: Arc<Mutex<W>>,
    ctx: Arc<Context>,
) {
    loop {
        if ctx.shutdown.is_latched() {
            return;
        }
        let body = match transport::read_message(&mut host_in) {
            Ok(Some(body)) => body,
            Ok(None) => {
                ctx.shutdown.trigger("host closed its input");
                return;
            }
            Err(e) => {
                ctx.shutdown.trigger(&format!("read error on host input: {e}"));
                return;
            }
        };

        let Ok(mut message) = serde_json::from_slice::<Value>(&body) else {
            log::warn!(target: "oclsp_proxy::pump", "malformed JSON from host, forwarding raw bytes");
            if write_framed(&backend_in, &body).is_err() {
                ctx.shutdown.trigger("write failed on backend input");
                return;
            }
            continue;
        };

        let method = message.get_str("method").map(str::to_string);
        let host_id = RequestId::from_json(&message);

        if let Some(method) = &method {
            translate::translate_request(
                method,
                &mut message,
                &ctx.env,
                &ctx.config,
                &ctx.correlator,
                &ctx.injector,
                &ctx.backend_bin_dir,
            );
        }

        // Alias under the method actually written to the backend, which
        // translation above may have renamed (e.g. textDocument/hover ->
        // cpptools/hover) — response-side dispatch keys on that name.
        if let Some(host_id) = host_id {
            let backend_method = message.get_str("method").map(str::to_string).or(method);
            if let Some(backend_method) = backend_method {
                let backend_id = ctx.correlator.allocate_alias(host_id.as_i64(), backend_method);
                message["id"] = Value::from(backend_id);
            }
        }

        let Ok(out) = serde_json::to_vec(&message) else {
            log::error!(target: "oclsp_proxy::pump", "failed to re-serialize translated host message");
            continue;
        };
        if write_framed(&backend_in, &out).is_err() {
            ctx.shutdown.trigger("write failed on backend input");
            return;
        }
    }
}

/// backend stdout → host stdout. Resolves aliases/proxy-originated ids and
/// runs response-side translation.
pub fn backend_to_host<R: BufRead, W: Write>(
    mut backend_out: R,
    host_out: Arc<Mutex<W>>,
    ctx: Arc<Context>,
) {
    loop {
        if ctx.shutdown.is_latched() {
            return;
        }
        let body = match transport::read_message(&mut backend_out) {
            Ok(Some(body)) => body,
            Ok(None) => {
                ctx.shutdown.trigger("backend closed its output");
                return;
            }
            Err(e) => {
                ctx.shutdown.trigger(&format!("read error on backend output: {e}"));
                return;
            }
        };

        let Ok(mut message) = serde_json::from_slice::<Value>(&body) else {
            log::warn!(target: "oclsp_proxy::pump", "malformed JSON from backend, swallowing");
            continue;
        };

        let Some(backend_id) = RequestId::from_json(&message) else {
            // Notification, or a backend-initiated request with no alias to resolve.
            forward_to_host(&host_out, &message, &ctx);
            continue;
        };

        match ctx.correlator.resolve(backend_id.as_i64()) {
            Resolution::Swallow => continue,
            Resolution::Alias(alias) => {
                message["id"] = Value::from(alias.host_id);
                translate::translate_response(&alias.host_method, &mut message, &ctx.env, &ctx.config);
                forward_to_host(&host_out, &message, &ctx);
            }
            Resolution::Unrecognized => forward_to_host(&host_out, &message, &ctx),
        }
    }
}

fn forward_to_host<W: Write>(host_out: &Arc<Mutex<W>>, message: &Value, ctx: &Arc<Context>) {
    match serde_json::to_vec(message) {
        Ok(bytes) => {
            if write_framed(host_out, &bytes).is_err() {
                ctx.shutdown.trigger("write failed on host output");
            }
        }
        Err(e) => log::error!(target: "oclsp_proxy::pump", "failed to serialize response for host: {e}"),
    }
}

/// injector queue → backend stdin. Writes whatever the request-side
/// translator enqueued, with no further transformation.
pub fn injector_to_backend<W: Write>(backend_in: Arc<Mutex<W>>, ctx: Arc<Context>) {
    loop {
        if ctx.shutdown.is_latched() {
            return;
        }
        let Some(message) = ctx.injector.recv() else {
            continue;
        };
        let Ok(bytes) = serde_json::to_vec(&message) else {
            log::error!(target: "oclsp_proxy::pump", "failed to serialize injected message");
            continue;
        };
        if write_framed(&backend_in, &bytes).is_err() {
            ctx.shutdown.trigger("write failed on backend input (injector)");
            return;
        }
    }
}

/// backend stderr → host stdout, wrapped as `cpptools/stderr` notifications
/// (§4.6). Logs on error but never triggers shutdown — a noisy or closed
/// stderr is not a protocol failure.
pub fn stderr_to_host<R: BufRead, W: Write>(mut backend_err: R, host_out: Arc<Mutex<W>>, ctx: Arc<Context>) {
    loop {
        if ctx.shutdown.is_latched() {
            return;
        }
        let mut line = String::new();
        match backend_err.read_line(&mut line) {
            Ok(0) => return,
            Ok(_) => {}
            Err(e) => {
                log::warn!(target: "oclsp_proxy::pump", "error reading backend stderr: {e}");
                return;
            }
        }
        let text = line.trim_end_matches(['\r', '\n']);
        if text.is_empty() {
            continue;
        }

        let notification = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "cpptools/stderr",
            "params": {
                "message": text,
                "timestamp": std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_secs_f64())
                    .unwrap_or(0.0),
            },
        });
        if let Ok(bytes) = serde_json::to_vec(&notification) {
            if write_framed(&host_out, &bytes).is_err() {
                log::warn!(target: "oclsp_proxy::pump", "write failed on host output (stderr pump)");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};
    use std::process::Command;

    fn test_ctx() -> Arc<Context> {
        let child = Command::new("sleep").arg("5").spawn().expect("spawn sleep for test");
        Arc::new(Context {
            env: Env {
                org_version: 10.0,
                orgdir_exe: None,
                orgdir_uff: None,
                orgdir_user_appdata: None,
                machine_config_path: None,
                log_enabled: false,
                trace_enabled: false,
                cpptools_trace_enabled: false,
            },
            config: ProxyConfig {
                workspace_folders: Vec::new(),
                additional_include_path: Vec::new(),
                allowed_ref_type: Default::default(),
                extra: Default::default(),
            },
            correlator: Correlator::new(),
            injector: Injector::new(),
            shutdown: Shutdown::new(child),
            backend_bin_dir: PathBuf::from("/opt/backend/bin"),
        })
    }

    fn framed(body: &str) -> String {
        format!("Content-Length: {}\r\n\r\n{}", body.len(), body)
    }

    #[test]
    fn host_to_backend_allocates_alias_and_rewrites_id() {
        let ctx = test_ctx();
        let input = framed(r#"{"jsonrpc":"2.0","id":1,"method":"textDocument/hover","params":{}}"#);
        let reader = BufReader::new(Cursor::new(input.into_bytes()));
        let backend_in = Arc::new(Mutex::new(Vec::new()));

        host_to_backend(reader, backend_in.clone(), ctx.clone());

        let written = backend_in.lock().unwrap();
        let text = String::from_utf8_lossy(&written);
        assert!(text.contains("cpptools/hover"));
        assert!(!text.contains(r#""id":1,"#));
        ctx.shutdown.wait_then_kill();
    }

    #[test]
    fn backend_to_host_rewrites_alias_id_back_and_swallows_proxy_originated() {
        let ctx = test_ctx();
        let backend_id = ctx.correlator.allocate_alias(42, "cpptools/hover");
        let proxy_id = ctx.correlator.allocate_proxy_originated();

        let input = format!(
            "{}{}",
            framed(&format!(r#"{{"jsonrpc":"2.0","id":{proxy_id},"result":{{}}}}"#)),
            framed(&format!(
                r#"{{"jsonrpc":"2.0","id":{backend_id},"result":{{"contents":{{"value":"x"}}}}}}"#
            ))
        );
        let reader = BufReader::new(Cursor::new(input.into_bytes()));
        let host_out = Arc::new(Mutex::new(Vec::new()));

        backend_to_host(reader, host_out.clone(), ctx.clone());

        let written = host_out.lock().unwrap();
        let text = String::from_utf8_lossy(&written);
        assert!(text.contains(r#""id":42"#));
        assert!(text.contains("markdown"));
        ctx.shutdown.wait_then_kill();
    }

    #[test]
    fn stderr_pump_wraps_lines_as_notifications() {
        let ctx = test_ctx();
        let reader = BufReader::new(Cursor::new(b"compiling foo.c\n".to_vec()));
        let host_out = Arc::new(Mutex::new(Vec::new()));

        stderr_to_host(reader, host_out.clone(), ctx.clone());

        let written = host_out.lock().unwrap();
        let text = String::from_utf8_lossy(&written);
        assert!(text.contains("cpptools/stderr"));
        assert!(text.contains("compiling foo.c"));
        ctx.shutdown.wait_then_kill();
    }
}
