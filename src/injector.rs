//! Thread-safe FIFO of proxy-originated messages awaiting delivery to the
//! backend (§4.6).
//!
//! A plain `std::sync::mpsc` channel already provides exactly the
//! properties §5 asks for — a one-second-tick blocking receive so the
//! injector pump can observe the shutdown latch between drains — without
//! pulling in a separate queue crate.

use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;

/// How long [`Injector::recv`] blocks before returning control to the
/// caller to re-check the shutdown latch (§5: "queue get with a one-second
/// timeout").
const RECV_TICK: Duration = Duration::from_secs(1);

pub struct Injector {
    sender: Sender<Value>,
    receiver: Mutex<Receiver<Value>>,
}

impl Default for Injector {
    fn default() -> Self {
        Self::new()
    }
}

impl Injector {
    pub fn new() -> Self {
        let (sender, receiver) = std::sync::mpsc::channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    /// Enqueues a fully-formed JSON-RPC message for the injector pump to
    /// write to the backend's stdin.
    pub fn push(&self, message: Value) {
        // The only way this fails is if the receiver half has been dropped,
        // which only happens if this `Injector` itself was dropped.
        let _ = self.sender.send(message);
    }

    /// Blocks for up to [`RECV_TICK`] for the next queued message. Returns
    /// `None` on timeout (the caller should re-check shutdown and retry) or
    /// if the channel has been disconnected.
    pub fn recv(&self) -> Option<Value> {
        let receiver = self.receiver.lock().unwrap();
        match receiver.recv_timeout(RECV_TICK) {
            Ok(message) => Some(message),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn push_then_recv_round_trips_in_fifo_order() {
        let injector = Injector::new();
        injector.push(json!({"id": 1}));
        injector.push(json!({"id": 2}));
        assert_eq!(injector.recv(), Some(json!({"id": 1})));
        assert_eq!(injector.recv(), Some(json!({"id": 2})));
    }

    #[test]
    fn recv_times_out_on_empty_queue() {
        let injector = Injector::new();
        assert_eq!(injector.recv(), None);
    }
}
