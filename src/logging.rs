//! Tracing subscriber setup for binaries and tests embedding the core.
//!
//! The crate itself only emits `tracing` events; installing a subscriber is
//! the embedder's choice. This helper wires up the common case.

use tracing_subscriber::EnvFilter;

/// Install a formatted `tracing` subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

/// Like [`init`], but emits JSON lines — the structured form log collectors
/// expect in production.
pub fn init_json() {
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
