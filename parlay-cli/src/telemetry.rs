//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::error::{CliError, CliResult};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "parlay=info";

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays pipeable.
pub fn init_tracing() -> CliResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| CliError::Telemetry(e.to_string()))
}
