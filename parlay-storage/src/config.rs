//! Storage configuration.
//!
//! Loaded from environment variables with defaults matching the product
//! policy (24h matchups, 6h schedules, evict five entries at a time).

use parlay_core::Namespace;
use std::time::Duration;

/// Default number of entries removed when the local tier reports a quota error.
pub const DEFAULT_EVICTION_BATCH: usize = 5;

/// Default bound on every remote-tier call.
pub const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 8_000;

#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    pub matchup_ttl: Duration,
    pub schedule_ttl: Duration,
    /// Entries evicted per quota failure.
    pub eviction_batch: usize,
    /// Timeout applied to each remote call; expiry counts as a transient failure.
    pub remote_timeout: Duration,
    /// Copy remote hits into the local tier.
    pub rehydrate_local: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            matchup_ttl: Namespace::Matchup.default_ttl(),
            schedule_ttl: Namespace::Schedule.default_ttl(),
            eviction_batch: DEFAULT_EVICTION_BATCH,
            remote_timeout: Duration::from_millis(DEFAULT_REMOTE_TIMEOUT_MS),
            rehydrate_local: true,
        }
    }
}

impl StorageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a StorageConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `PARLAY_MATCHUP_TTL_SECS`: matchup entry TTL (default: 86400)
    /// - `PARLAY_SCHEDULE_TTL_SECS`: schedule entry TTL (default: 21600)
    /// - `PARLAY_EVICTION_BATCH`: entries evicted per quota failure (default: 5)
    /// - `PARLAY_REMOTE_TIMEOUT_MS`: remote call timeout (default: 8000)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let secs = |name: &str, fallback: Duration| {
            lookup(name)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(fallback)
        };

        let eviction_batch = lookup("PARLAY_EVICTION_BATCH")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.eviction_batch);

        let remote_timeout = lookup("PARLAY_REMOTE_TIMEOUT_MS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.remote_timeout);

        Self {
            matchup_ttl: secs("PARLAY_MATCHUP_TTL_SECS", defaults.matchup_ttl),
            schedule_ttl: secs("PARLAY_SCHEDULE_TTL_SECS", defaults.schedule_ttl),
            eviction_batch,
            remote_timeout,
            rehydrate_local: defaults.rehydrate_local,
        }
    }

    pub fn ttl_for(&self, namespace: Namespace) -> Duration {
        match namespace {
            Namespace::Matchup => self.matchup_ttl,
            Namespace::Schedule => self.schedule_ttl,
        }
    }

    pub fn with_ttl(mut self, namespace: Namespace, ttl: Duration) -> Self {
        match namespace {
            Namespace::Matchup => self.matchup_ttl = ttl,
            Namespace::Schedule => self.schedule_ttl = ttl,
        }
        self
    }

    pub fn with_eviction_batch(mut self, batch: usize) -> Self {
        self.eviction_batch = batch.max(1);
        self
    }

    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    pub fn with_rehydrate_local(mut self, enabled: bool) -> Self {
        self.rehydrate_local = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.ttl_for(Namespace::Matchup), Duration::from_secs(86_400));
        assert_eq!(config.ttl_for(Namespace::Schedule), Duration::from_secs(21_600));
        assert_eq!(config.eviction_batch, 5);
        assert_eq!(config.remote_timeout, Duration::from_secs(8));
        assert!(config.rehydrate_local);
    }

    #[test]
    fn test_builder() {
        let config = StorageConfig::new()
            .with_ttl(Namespace::Schedule, Duration::from_secs(60))
            .with_eviction_batch(0)
            .with_remote_timeout(Duration::from_millis(250))
            .with_rehydrate_local(false);

        assert_eq!(config.schedule_ttl, Duration::from_secs(60));
        assert_eq!(config.matchup_ttl, Duration::from_secs(86_400));
        assert_eq!(config.eviction_batch, 1);
        assert_eq!(config.remote_timeout, Duration::from_millis(250));
        assert!(!config.rehydrate_local);
    }

    #[test]
    fn test_from_lookup_overrides_and_ignores_garbage() {
        let vars: HashMap<&str, &str> = [
            ("PARLAY_MATCHUP_TTL_SECS", "3600"),
            ("PARLAY_SCHEDULE_TTL_SECS", "soon"),
            ("PARLAY_EVICTION_BATCH", "0"),
            ("PARLAY_REMOTE_TIMEOUT_MS", " 1500 "),
        ]
        .into_iter()
        .collect();

        let config = StorageConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.matchup_ttl, Duration::from_secs(3600));
        assert_eq!(config.schedule_ttl, Duration::from_secs(21_600));
        assert_eq!(config.eviction_batch, 5);
        assert_eq!(config.remote_timeout, Duration::from_millis(1500));
    }
}
