//! Bidirectional LSP dialect-bridging proxy between a classical LSP host
//! and a vendor-extended cpptools-style backend.
//!
//! See `DESIGN.md` for the module-by-module grounding ledger.

pub mod config;
pub mod env;
pub mod error;
pub mod ids;
pub mod injector;
pub mod json_ext;
pub mod logging;
pub mod pump;
pub mod shutdown;
pub mod supervisor;
pub mod transport;
pub mod translate;
