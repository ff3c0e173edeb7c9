//! Structured logging setup for the gateway binary.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither an explicit filter nor `RUST_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Installs a JSON log formatter.
///
/// An explicit `filter` wins over `RUST_LOG`, which wins over
/// [`DEFAULT_LOG_FILTER`].
///
/// # Errors
///
/// Returns an error when a global subscriber is already installed.
pub fn init_tracing(filter: Option<&str>) -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter = filter.map_or_else(
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        EnvFilter::new,
    );
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json())
        .try_init()
}
