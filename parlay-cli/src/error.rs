//! Error types for the CLI.

use parlay_core::{ConfigError, ParlayError};
use parlay_storage::local::lmdb::LmdbOpenError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Parlay(#[from] ParlayError),
    #[error("Failed to open local store: {0}")]
    LocalStore(#[from] LmdbOpenError),
    #[error("Failed to initialize logging: {0}")]
    Telemetry(String),
}

pub type CliResult<T> = Result<T, CliError>;
