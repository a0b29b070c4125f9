//! Tracing subscriber setup.

use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `default_level` when set.
///
/// Returns false when a subscriber was already installed (tests, embedding).
pub fn init_tracing(default_level: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt().with_env_filter(filter).with_target(false).try_init().is_ok()
}
