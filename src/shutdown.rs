//! Once-latched shutdown coordination.
//!
//! Grounded on `lsp/bridge/pool/shutdown.rs`'s graceful/force-kill escalation,
//! collapsed to the single global latch the spec calls for (§4.2): one
//! backend process, one latch, terminate-then-kill.

use std::process::Child;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// How long the supervisor waits for the child to exit after `terminate`
/// before escalating to a hard kill (§4.7, §5).
pub const KILL_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Shared shutdown latch plus a handle to the backend child process.
///
/// The first caller to `trigger` wins; all later calls are no-ops, matching
/// the "Shutdown idempotence" invariant in §8 (exactly one termination
/// sequence, one log entry).
pub struct Shutdown {
    latched: AtomicBool,
    child: Mutex<Option<Child>>,
}

impl Shutdown {
    pub fn new(child: Child) -> Self {
        Self {
            latched: AtomicBool::new(false),
            child: Mutex::new(Some(child)),
        }
    }

    pub fn is_latched(&self) -> bool {
        self.latched.load(Ordering::SeqCst)
    }

    /// Non-blocking poll of the backend's exit status, for the supervisor's
    /// coarse polling loop (§4.7). Returns `None` while still running.
    pub fn poll_child_exit(&self) -> Option<std::process::ExitStatus> {
        let mut guard = self.child.lock().unwrap();
        let child = guard.as_mut()?;
        child.try_wait().ok().flatten()
    }

    /// Latches shutdown if not already latched, terminating the backend
    /// process. Returns `true` if this call was the one that latched it.
    pub fn trigger(&self, reason: &str) -> bool {
        if self.latched.swap(true, Ordering::SeqCst) {
            return false;
        }

        if reason != "host closed its input" {
            log::error!(target: "oclsp_proxy::shutdown", "{reason}");
        }
        log::info!(target: "oclsp_proxy::shutdown", "triggering shutdown: {reason}");

        if let Some(child) = self.child.lock().unwrap().as_mut() {
            terminate(child);
        }
        true
    }

    /// Waits up to [`KILL_GRACE_PERIOD`] for the child to exit, then kills
    /// it if it hasn't. Call once, after the pumps have been told to stop.
    pub fn wait_then_kill(&self) -> Option<std::process::ExitStatus> {
        let mut guard = self.child.lock().unwrap();
        let child = guard.as_mut()?;

        let deadline = std::time::Instant::now() + KILL_GRACE_PERIOD;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Some(status),
                Ok(None) => {
                    if std::time::Instant::now() >= deadline {
                        log::warn!(target: "oclsp_proxy::shutdown", "backend did not exit in time, killing");
                        let _ = child.kill();
                        return child.wait().ok();
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
                Err(e) => {
                    log::warn!(target: "oclsp_proxy::shutdown", "error polling backend exit status: {e}");
                    return None;
                }
            }
        }
    }
}

#[cfg(unix)]
fn terminate(child: &mut Child) {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let pid = Pid::from_raw(child.id() as i32);
    if let Err(e) = signal::kill(pid, Signal::SIGTERM) {
        log::warn!(target: "oclsp_proxy::shutdown", "SIGTERM failed ({e}), falling back to kill()");
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    let _ = child.kill();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    fn sleepy_child() -> Child {
        Command::new("sleep")
            .arg("5")
            .spawn()
            .expect("spawn sleep(1) for test")
    }

    #[test]
    fn second_trigger_is_a_no_op() {
        let s = Shutdown::new(sleepy_child());
        assert!(s.trigger("first"));
        assert!(!s.trigger("second"));
        assert!(s.is_latched());
        s.wait_then_kill();
    }

    #[test]
    fn trigger_terminates_the_child() {
        let s = Shutdown::new(sleepy_child());
        s.trigger("test shutdown");
        let status = s.wait_then_kill();
        assert!(status.is_some());
    }
}
