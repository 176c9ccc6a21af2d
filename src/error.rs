//! Error taxonomy for the proxy daemon.

use thiserror::Error;

/// Errors that can abort the supervisor before any pump starts.
///
/// Once the pumps are running, failures are handled by the shutdown
/// coordinator (§4.2/§7): a pump that hits a read/write/framing error
/// triggers `Shutdown::trigger` with a reason string rather than
/// propagating a typed error, since by that point there is no caller left
/// to receive a `Result` — the failure ends a background thread, not a
/// function call. Translator-level problems (malformed body, missing
/// template, bad config) are logged and degraded gracefully per §7 and
/// never reach this type either. `ProxyError` exists solely for the one
/// condition that can abort startup itself: the backend process failing
/// to spawn.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("failed to spawn backend process: {0}")]
    BackendSpawn(std::io::Error),
}

pub type ProxyResult<T> = Result<T, ProxyError>;
