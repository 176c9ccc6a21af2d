//! Request-id allocation and host/backend correlation.
//!
//! Grounded on `lsp/bridge/protocol/request_id.rs` (the `RequestId` newtype
//! and its `from_json`/`matches` helpers) and the alias/pending-id bookkeeping
//! in `lsp/bridge/pool/` — generalized here to the proxy's single global
//! counter shared between real aliases and proxy-originated ids (§3 of the
//! spec: they share a counter so disjointness is automatic).

use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::{DashMap, DashSet};
use serde_json::Value;

/// JSON-RPC request id. LSP allows string ids too, but this proxy only ever
/// allocates integer ids and never forwards a non-integer id through the
/// alias path — unknown/non-integer ids are passed through unchanged by
/// whoever reads the raw message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(i64);

impl RequestId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(self) -> i64 {
        self.0
    }

    /// Extracts an integer request id from a JSON-RPC message, if present.
    pub fn from_json(message: &Value) -> Option<Self> {
        message.get("id")?.as_i64().map(Self)
    }
}

/// What a forwarded host request's backend-side id maps back to.
#[derive(Debug, Clone)]
pub struct Alias {
    pub host_id: i64,
    /// The method name actually written to the backend, i.e. *after*
    /// request-side translation (`cpptools/hover`, not `textDocument/hover`)
    /// — this is what response-side dispatch keys on.
    pub host_method: String,
}

/// Monotonic id source plus the two correlation structures described in
/// §4.3: the alias map (backend_id -> (host_id, host_method)) and the
/// proxy-originated id set. Both are `dashmap` collections rather than a
/// single coarse mutex — the spec allows either; a sharded concurrent map
/// is the idiom this codebase already reaches for (see its own pending-
/// request tracking) and avoids contention between the two pumps that touch
/// this table from opposite directions.
pub struct Correlator {
    counter: AtomicI64,
    aliases: DashMap<i64, Alias>,
    proxy_originated: DashSet<i64>,
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}

impl Correlator {
    pub fn new() -> Self {
        Self {
            counter: AtomicI64::new(1),
            aliases: DashMap::new(),
            proxy_originated: DashSet::new(),
        }
    }

    fn next_id(&self) -> i64 {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Allocates a backend id for a forwarded host request and records the
    /// alias, keyed by the method that will actually be written to the
    /// backend (post request-side translation). Returns the backend id to
    /// write into the outgoing message.
    pub fn allocate_alias(&self, host_id: i64, host_method: impl Into<String>) -> i64 {
        let backend_id = self.next_id();
        self.aliases.insert(
            backend_id,
            Alias {
                host_id,
                host_method: host_method.into(),
            },
        );
        backend_id
    }

    /// Allocates a backend id for a proxy-originated (injected) request.
    pub fn allocate_proxy_originated(&self) -> i64 {
        let id = self.next_id();
        self.proxy_originated.insert(id);
        id
    }

    /// Outcome of resolving a backend-side message id, per §4.3.
    pub fn resolve(&self, backend_id: i64) -> Resolution {
        if self.proxy_originated.remove(&backend_id).is_some() {
            return Resolution::Swallow;
        }
        if let Some((_, alias)) = self.aliases.remove(&backend_id) {
            return Resolution::Alias(alias);
        }
        Resolution::Unrecognized
    }

    #[cfg(test)]
    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    #[cfg(test)]
    pub fn proxy_originated_count(&self) -> usize {
        self.proxy_originated.len()
    }
}

#[derive(Debug)]
pub enum Resolution {
    /// A proxy-originated request's response: drop it, never forward.
    Swallow,
    /// A forwarded host request's response: rewrite id back, dispatch by method.
    Alias(Alias),
    /// Neither: a server-initiated request/response with its own id scheme.
    Unrecognized,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocated_ids_are_disjoint_by_construction() {
        let c = Correlator::new();
        let a = c.allocate_alias(1, "textDocument/hover");
        let b = c.allocate_proxy_originated();
        assert_ne!(a, b);
    }

    #[test]
    fn alias_resolves_and_is_consumed_once() {
        let c = Correlator::new();
        let backend_id = c.allocate_alias(7, "textDocument/hover");
        assert_eq!(c.alias_count(), 1);

        match c.resolve(backend_id) {
            Resolution::Alias(alias) => {
                assert_eq!(alias.host_id, 7);
                assert_eq!(alias.host_method, "textDocument/hover");
            }
            other => panic!("expected Alias, got {other:?}"),
        }
        assert_eq!(c.alias_count(), 0);
        assert!(matches!(c.resolve(backend_id), Resolution::Unrecognized));
    }

    #[test]
    fn proxy_originated_is_swallowed_and_consumed_once() {
        let c = Correlator::new();
        let id = c.allocate_proxy_originated();
        assert!(matches!(c.resolve(id), Resolution::Swallow));
        assert_eq!(c.proxy_originated_count(), 0);
        assert!(matches!(c.resolve(id), Resolution::Unrecognized));
    }

    #[test]
    fn unknown_id_is_unrecognized_and_forwarded() {
        let c = Correlator::new();
        assert!(matches!(c.resolve(999), Resolution::Unrecognized));
    }

    #[test]
    fn request_id_from_json_ignores_notifications() {
        let msg = serde_json::json!({"jsonrpc":"2.0","method":"initialized","params":{}});
        assert!(RequestId::from_json(&msg).is_none());
    }
}
