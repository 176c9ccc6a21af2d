//! Startup, pump orchestration, and shutdown sequencing (§4.7).
//!
//! Grounded on the teacher's `bin/main.rs` startup sequence (build the
//! runtime context, then hand off to long-lived tasks) generalized from
//! one `tower_lsp::Server` future to four blocking-I/O threads plus a
//! polling loop, since the proxy explicitly forgoes an async runtime (§5).

use std::io::BufReader;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::ProxyConfig;
use crate::env::Env;
use crate::error::{ProxyError, ProxyResult};
use crate::ids::Correlator;
use crate::injector::Injector;
use crate::pump::{self, Context};
use crate::shutdown::Shutdown;

/// How often the supervisor polls the backend child for exit (§4.7).
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Spawns the backend, wires the four pumps, and blocks until shutdown.
/// Returns the backend's exit status if it exited on its own.
pub fn run(env: Env, backend_exe: &std::path::Path) -> ProxyResult<Option<std::process::ExitStatus>> {
    if !backend_exe.exists() {
        return Err(ProxyError::BackendSpawn(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("backend executable not found: {}", backend_exe.display()),
        )));
    }

    let config = ProxyConfig::load(&env);

    let mut child = Command::new(backend_exe)
        .arg("--stdio")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(ProxyError::BackendSpawn)?;

    let backend_stdin = child.stdin.take().expect("piped stdin");
    let backend_stdout = child.stdout.take().expect("piped stdout");
    let backend_stderr = child.stderr.take().expect("piped stderr");

    let backend_bin_dir = backend_exe
        .parent()
        .map(std::path::Path::to_path_buf)
        .unwrap_or_default();

    let ctx = Arc::new(Context {
        env,
        config,
        correlator: Correlator::new(),
        injector: Injector::new(),
        shutdown: Shutdown::new(child),
        backend_bin_dir,
    });

    let backend_in = Arc::new(Mutex::new(backend_stdin));
    let host_out = Arc::new(Mutex::new(std::io::stdout()));

    let mut handles = Vec::new();

    {
        let backend_in = backend_in.clone();
        let ctx = ctx.clone();
        handles.push(std::thread::spawn(move || {
            let host_in = BufReader::new(std::io::stdin());
            pump::host_to_backend(host_in, backend_in, ctx);
        }));
    }
    {
        let host_out = host_out.clone();
        let ctx = ctx.clone();
        handles.push(std::thread::spawn(move || {
            let backend_out = BufReader::new(backend_stdout);
            pump::backend_to_host(backend_out, host_out, ctx);
        }));
    }
    {
        let backend_in = backend_in.clone();
        let ctx = ctx.clone();
        handles.push(std::thread::spawn(move || {
            pump::injector_to_backend(backend_in, ctx);
        }));
    }
    {
        let host_out = host_out.clone();
        let ctx = ctx.clone();
        handles.push(std::thread::spawn(move || {
            let backend_err = BufReader::new(backend_stderr);
            pump::stderr_to_host(backend_err, host_out, ctx);
        }));
    }

    let status = poll_until_exit_or_shutdown(&ctx);

    for handle in handles {
        let _ = handle.join();
    }

    Ok(status)
}

fn poll_until_exit_or_shutdown(ctx: &Arc<Context>) -> Option<std::process::ExitStatus> {
    loop {
        if ctx.shutdown.is_latched() {
            return ctx.shutdown.wait_then_kill();
        }
        if let Some(status) = ctx.shutdown.poll_child_exit() {
            ctx.shutdown.trigger(&format!("backend exited with status {status}"));
            return Some(status);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}
