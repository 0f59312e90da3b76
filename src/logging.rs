//! Logging configuration for viewmerge.
//!
//! The crate itself only emits `tracing` events; installing a subscriber is
//! the embedding application's choice. This module provides a small helper
//! for applications and test harnesses that want a sensible default.

use tracing_subscriber::EnvFilter;

/// Initializes logging to stderr.
///
/// Respects `RUST_LOG` via `EnvFilter`, defaulting to `info`. Calling this
/// more than once panics in `tracing-subscriber`; use `try_init_stderr_logging`
/// when initialization may race with another subscriber.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Like [`init_stderr_logging`], but quietly does nothing when a global
/// subscriber is already installed.
pub fn try_init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
