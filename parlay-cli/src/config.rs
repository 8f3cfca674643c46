//! Configuration loading for the parlay CLI.
//!
//! The local store fields are required. The remote tier, AI provider and
//! storage overrides are optional sections; leaving `[remote]` out runs in
//! local storage mode.

use parlay_core::ConfigError;
use parlay_storage::StorageConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    pub local_store_path: PathBuf,
    pub local_store_max_mb: usize,
    #[serde(default)]
    pub remote: Option<RemoteSection>,
    #[serde(default)]
    pub ai: Option<AiSection>,
    #[serde(default)]
    pub storage: StorageOverrides,
}

#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteSection {
    pub url: String,
    pub api_key: String,
}

impl std::fmt::Debug for RemoteSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSection")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AiSection {
    /// Falls back to `GEMINI_API_KEY` when absent.
    pub api_key: Option<String>,
    pub model: Option<String>,
}

impl std::fmt::Debug for AiSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiSection")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .finish()
    }
}

/// Per-field overrides applied on top of the environment-derived storage config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageOverrides {
    pub matchup_ttl_secs: Option<u64>,
    pub schedule_ttl_secs: Option<u64>,
    pub eviction_batch: Option<usize>,
    pub remote_timeout_ms: Option<u64>,
    pub rehydrate_local: Option<bool>,
}

impl CliConfig {
    /// Read, parse and validate the file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::from_path(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            reason: format!("{}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.local_store_path.as_os_str().is_empty() {
            return Err(invalid("local_store_path", "must not be empty"));
        }
        if self.local_store_max_mb == 0 {
            return Err(invalid("local_store_max_mb", "must be > 0"));
        }
        if let Some(remote) = &self.remote {
            let url = remote.url.trim();
            if url.is_empty() {
                return Err(invalid("remote.url", "must not be empty"));
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(invalid("remote.url", "must start with http:// or https://"));
            }
            if remote.api_key.trim().is_empty() {
                return Err(invalid("remote.api_key", "must not be empty"));
            }
        }
        if let Some(model) = self.ai.as_ref().and_then(|ai| ai.model.as_deref()) {
            if model.trim().is_empty() {
                return Err(invalid("ai.model", "must not be empty"));
            }
        }

        let storage = &self.storage;
        if storage.matchup_ttl_secs == Some(0) {
            return Err(invalid("storage.matchup_ttl_secs", "must be > 0"));
        }
        if storage.schedule_ttl_secs == Some(0) {
            return Err(invalid("storage.schedule_ttl_secs", "must be > 0"));
        }
        if storage.eviction_batch == Some(0) {
            return Err(invalid("storage.eviction_batch", "must be > 0"));
        }
        if storage.remote_timeout_ms == Some(0) {
            return Err(invalid("storage.remote_timeout_ms", "must be > 0"));
        }
        Ok(())
    }

    /// Environment-derived storage config with this file's overrides applied.
    pub fn storage_config(&self) -> StorageConfig {
        self.storage.apply(StorageConfig::from_env())
    }
}

impl StorageOverrides {
    pub fn apply(&self, mut base: StorageConfig) -> StorageConfig {
        if let Some(secs) = self.matchup_ttl_secs {
            base.matchup_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = self.schedule_ttl_secs {
            base.schedule_ttl = Duration::from_secs(secs);
        }
        if let Some(batch) = self.eviction_batch {
            base = base.with_eviction_batch(batch);
        }
        if let Some(ms) = self.remote_timeout_ms {
            base = base.with_remote_timeout(Duration::from_millis(ms));
        }
        if let Some(enabled) = self.rehydrate_local {
            base = base.with_rehydrate_local(enabled);
        }
        base
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
