use std::io;

use tracing::warn;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Installs the stderr subscriber. An unparsable directive falls back to
/// [`DEFAULT_LOG_FILTER`] and is reported once logging is up.
pub fn init(directive: Option<&str>) {
    let (filter, rejected) = match directive.map(EnvFilter::try_new) {
        Some(Ok(filter)) => (filter, None),
        Some(Err(error)) => (EnvFilter::new(DEFAULT_LOG_FILTER), Some(error)),
        None => (EnvFilter::new(DEFAULT_LOG_FILTER), None),
    };

    // A subscriber may already be installed by an embedding test harness.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();

    if let Some(error) = rejected {
        warn!(%error, "ignoring invalid log filter");
    }
}
