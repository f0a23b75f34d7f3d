//! conformkit version information.
//!
//! Taken from Cargo metadata (`CARGO_PKG_VERSION`) at compile time. Prefer this constant over repeating
//! `env!("CARGO_PKG_VERSION")`.

/// The conformkit version string (for example, `0.1.0-alpha.1`).
pub const CONFORMKIT_VERSION: &str = env!("CARGO_PKG_VERSION");
