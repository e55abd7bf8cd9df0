//! Logging setup.
//!
//! Every component logs through the `tracing` macros; nothing holds a logger
//! handle. Tests that want to inspect output install their own subscriber.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes the global subscriber. Call once at startup.
///
/// The filter defaults to `info` and can be overridden with `RUST_LOG`.
/// Calling twice is harmless; the second call is ignored.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
