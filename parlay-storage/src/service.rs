//! Tiered storage service.
//!
//! Routes reads and writes between the remote record store and the local
//! key-value store:
//!
//! - `get` is cache-aside: remote first while the circuit is closed, then
//!   the local tier. Expired entries are treated as absent wherever found
//!   and deleted from the local tier when it served them.
//! - `save` writes through: remote upsert while the circuit is closed, and
//!   always a local write afterwards. A full local tier triggers eviction
//!   and exactly one retry.
//! - Remote failures never reach the caller. Transient and permission
//!   failures open the circuit; only `verify_connection` closes it again.
//!
//! Only caller mistakes (empty key, non-JSON payload, wrong target type)
//! come back as errors.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parlay_core::{
    CacheEntry, Clock, LocalKey, Namespace, ParlayResult, RemoteError, RemoteErrorKind,
    SystemClock, ValidationError,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::circuit::{CircuitBreaker, CircuitState};
use crate::config::StorageConfig;
use crate::eviction::EvictionPolicy;
use crate::local::{owned_keys, LocalStore};
use crate::remote::{RemoteRecord, RemoteStore};
use crate::stats::{PruneReport, StorageStats, TierStatus};

pub struct StorageService {
    local: Arc<dyn LocalStore>,
    remote: Option<Arc<dyn RemoteStore>>,
    circuit: CircuitBreaker,
    eviction: EvictionPolicy,
    clock: Arc<dyn Clock>,
    config: StorageConfig,
}

impl StorageService {
    /// Build a service over both tiers.
    ///
    /// The circuit starts open when there is no remote store or the remote
    /// store reports it is not configured.
    pub fn new(
        local: Arc<dyn LocalStore>,
        remote: Option<Arc<dyn RemoteStore>>,
        config: StorageConfig,
    ) -> Self {
        let initially_open = remote.as_ref().map_or(true, |r| !r.is_configured());
        if initially_open {
            info!("No remote tier configured, using local storage only");
        }

        Self {
            local,
            remote,
            circuit: CircuitBreaker::new(initially_open),
            eviction: EvictionPolicy::oldest_first(config.eviction_batch),
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn local_only(local: Arc<dyn LocalStore>, config: StorageConfig) -> Self {
        Self::new(local, None, config)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn circuit(&self) -> &CircuitBreaker {
        &self.circuit
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit.state()
    }

    // ========================================================================
    // WRITES
    // ========================================================================

    /// Cache `payload` under `key`, stamped with the current time.
    ///
    /// Succeeds even when neither tier accepted the write; the only errors
    /// are an empty key and a payload that is not representable as JSON.
    pub async fn save<T>(&self, namespace: Namespace, key: &str, payload: &T) -> ParlayResult<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        validate_key(key)?;
        let entry = CacheEntry::capture(payload, self.clock.now_millis())?;
        let raw = entry.encode()?;

        if let Some(remote) = self.active_remote() {
            let record = RemoteRecord::from_entry(namespace, key, &entry);
            match self
                .call_remote(remote.upsert(namespace.remote_table(), &record))
                .await
            {
                Ok(()) => debug!(namespace = %namespace, key, "Saved to remote tier"),
                Err(e) => self.absorb_remote_failure(namespace, "upsert", &e),
            }
        }

        self.write_local(namespace, key, &raw).await;
        Ok(())
    }

    /// Delete every local entry of `namespace`. Remote rows are untouched.
    pub async fn clear(&self, namespace: Namespace) -> ParlayResult<usize> {
        let mut removed = 0;
        for raw_key in owned_keys(self.local.as_ref(), Some(namespace)).await? {
            if self.local.delete(&raw_key).await? {
                removed += 1;
            }
        }
        info!(namespace = %namespace, removed, "Cleared local entries");
        Ok(removed)
    }

    /// Delete expired and unreadable local entries of `namespace`.
    pub async fn prune(&self, namespace: Namespace) -> ParlayResult<PruneReport> {
        let now = self.clock.now_millis();
        let ttl = self.config.ttl_for(namespace);
        let mut report = PruneReport::default();

        for raw_key in owned_keys(self.local.as_ref(), Some(namespace)).await? {
            let Some(raw) = self.local.get(&raw_key).await? else {
                continue;
            };
            match CacheEntry::decode(&raw) {
                Ok(entry) if entry.is_valid(now, ttl) => continue,
                Ok(_) => {
                    self.local.delete(&raw_key).await?;
                    report.expired += 1;
                }
                Err(_) => {
                    self.local.delete(&raw_key).await?;
                    report.corrupt += 1;
                }
            }
        }

        info!(
            namespace = %namespace,
            expired = report.expired,
            corrupt = report.corrupt,
            "Pruned local entries"
        );
        Ok(report)
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// Fetch and decode a cached payload.
    pub async fn get<T: DeserializeOwned>(
        &self,
        namespace: Namespace,
        key: &str,
    ) -> ParlayResult<Option<T>> {
        let Some(value) = self.get_value(namespace, key).await? else {
            return Ok(None);
        };

        serde_json::from_value(value).map(Some).map_err(|e| {
            ValidationError::PayloadMismatch {
                namespace,
                key: key.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Fetch a cached payload as raw JSON.
    pub async fn get_value(&self, namespace: Namespace, key: &str) -> ParlayResult<Option<Value>> {
        validate_key(key)?;
        let now = self.clock.now_millis();
        let ttl = self.config.ttl_for(namespace);

        if let Some(remote) = self.active_remote() {
            match self
                .call_remote(remote.fetch(namespace.remote_table(), key))
                .await
            {
                Ok(Some(record)) => {
                    let entry = record.into_entry();
                    if entry.is_valid(now, ttl) {
                        debug!(namespace = %namespace, key, "Remote hit");
                        if self.config.rehydrate_local {
                            self.rehydrate(namespace, key, &entry).await;
                        }
                        return Ok(Some(entry.payload));
                    }
                    debug!(namespace = %namespace, key, "Remote entry expired");
                }
                Ok(None) => debug!(namespace = %namespace, key, "Remote miss"),
                Err(e) if e.kind == RemoteErrorKind::NotFound => {
                    debug!(namespace = %namespace, key, "Remote miss")
                }
                Err(e) => self.absorb_remote_failure(namespace, "fetch", &e),
            }
        }

        Ok(self.read_local(namespace, key, now, ttl).await)
    }

    /// Every id cached in either tier, expired entries included.
    pub async fn list_keys(&self, namespace: Namespace) -> BTreeSet<String> {
        let mut ids: BTreeSet<String> = match owned_keys(self.local.as_ref(), Some(namespace)).await
        {
            Ok(raw_keys) => raw_keys
                .iter()
                .filter_map(|raw| LocalKey::parse(raw).map(|k| k.id.to_string()))
                .collect(),
            Err(e) => {
                warn!(namespace = %namespace, error = %e, "Failed to list local keys");
                BTreeSet::new()
            }
        };

        if let Some(remote) = self.active_remote() {
            match self.call_remote(remote.list_ids(namespace.remote_table())).await {
                Ok(remote_ids) => ids.extend(remote_ids),
                Err(e) => self.absorb_remote_failure(namespace, "list", &e),
            }
        }

        ids
    }

    pub async fn stats(&self, namespace: Namespace) -> StorageStats {
        let mut stats = StorageStats::default();

        match owned_keys(self.local.as_ref(), Some(namespace)).await {
            Ok(raw_keys) => {
                for raw_key in raw_keys {
                    if let Ok(Some(raw)) = self.local.get(&raw_key).await {
                        stats.local_count += 1;
                        stats.local_byte_size += raw.len();
                    }
                }
            }
            Err(e) => warn!(namespace = %namespace, error = %e, "Failed to read local stats"),
        }

        if let Some(remote) = self.active_remote() {
            match self.call_remote(remote.list_ids(namespace.remote_table())).await {
                Ok(ids) => stats.remote_count = ids.len(),
                Err(e) => self.absorb_remote_failure(namespace, "list", &e),
            }
        }

        stats.remote_connected = self.is_remote_active();
        stats
    }

    // ========================================================================
    // CONNECTIVITY
    // ========================================================================

    /// Probe the remote tier. The only way to close an open circuit.
    pub async fn verify_connection(&self) -> bool {
        let Some(remote) = self.remote.as_deref() else {
            self.circuit.trip("no remote tier configured");
            return false;
        };
        if !remote.is_configured() {
            self.circuit.trip("remote tier is missing configuration");
            return false;
        }

        match self
            .call_remote(remote.probe(Namespace::Matchup.remote_table()))
            .await
        {
            Ok(()) => {
                self.circuit.reset();
                info!("Remote tier reachable");
                true
            }
            Err(e) => {
                self.circuit.trip(e.to_string());
                warn!(kind = %e.kind, error = %e, "Remote probe failed, using local storage");
                false
            }
        }
    }

    pub fn is_remote_active(&self) -> bool {
        self.remote.is_some() && self.circuit.is_closed()
    }

    pub fn status(&self) -> TierStatus {
        TierStatus::from_remote_active(self.is_remote_active())
    }

    pub fn status_label(&self) -> &'static str {
        self.status().label()
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    fn active_remote(&self) -> Option<&dyn RemoteStore> {
        if self.circuit.is_closed() {
            self.remote.as_deref()
        } else {
            None
        }
    }

    async fn call_remote<T, F>(&self, call: F) -> Result<T, RemoteError>
    where
        F: Future<Output = Result<T, RemoteError>>,
    {
        let limit = self.config.remote_timeout;
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::transient(format!(
                "remote call timed out after {}ms",
                limit.as_millis()
            ))),
        }
    }

    fn absorb_remote_failure(&self, namespace: Namespace, op: &'static str, err: &RemoteError) {
        if self.circuit.record(err) {
            warn!(
                namespace = %namespace,
                op,
                kind = %err.kind,
                error = %err,
                "Remote tier disabled, falling back to local storage"
            );
        } else {
            warn!(
                namespace = %namespace,
                op,
                kind = %err.kind,
                error = %err,
                "Remote call failed"
            );
        }
    }

    async fn rehydrate(&self, namespace: Namespace, key: &str, entry: &CacheEntry) {
        match entry.encode() {
            Ok(raw) => self.write_local(namespace, key, &raw).await,
            Err(e) => warn!(namespace = %namespace, key, error = %e, "Cannot rehydrate local tier"),
        }
    }

    /// Best-effort local write with one eviction round on quota errors.
    async fn write_local(&self, namespace: Namespace, key: &str, raw: &str) {
        let local_key = namespace.local_key(key);

        let err = match self.local.set(&local_key, raw).await {
            Ok(()) => return,
            Err(e) => e,
        };

        if !err.is_quota() {
            warn!(namespace = %namespace, key, error = %err, "Local save failed");
            return;
        }

        match self.eviction.evict(self.local.as_ref()).await {
            Ok(evicted) => info!(
                namespace = %namespace,
                key,
                evicted = evicted.len(),
                "Local storage full, evicted oldest entries"
            ),
            Err(e) => warn!(namespace = %namespace, key, error = %e, "Eviction failed"),
        }

        if let Err(e) = self.local.set(&local_key, raw).await {
            warn!(
                namespace = %namespace,
                key,
                error = %e,
                "Local save dropped after eviction"
            );
        }
    }

    async fn read_local(
        &self,
        namespace: Namespace,
        key: &str,
        now: i64,
        ttl: Duration,
    ) -> Option<Value> {
        let local_key = namespace.local_key(key);

        let raw = match self.local.get(&local_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(namespace = %namespace, key, error = %e, "Local read failed");
                return None;
            }
        };

        match CacheEntry::decode(&raw) {
            Ok(entry) if entry.is_valid(now, ttl) => {
                debug!(namespace = %namespace, key, "Local hit");
                Some(entry.payload)
            }
            Ok(_) => {
                debug!(namespace = %namespace, key, "Local entry expired");
                self.discard_local(&local_key).await;
                None
            }
            Err(e) => {
                warn!(namespace = %namespace, key, error = %e, "Discarding corrupt local entry");
                self.discard_local(&local_key).await;
                None
            }
        }
    }

    async fn discard_local(&self, local_key: &str) {
        if let Err(e) = self.local.delete(local_key).await {
            warn!(key = local_key, error = %e, "Failed to delete local entry");
        }
    }
}

impl std::fmt::Debug for StorageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageService")
            .field("circuit", &self.circuit)
            .field("eviction", &self.eviction)
            .field("has_remote", &self.remote.is_some())
            .field("config", &self.config)
            .finish()
    }
}

fn validate_key(key: &str) -> Result<(), ValidationError> {
    if key.trim().is_empty() {
        return Err(ValidationError::InvalidKey {
            reason: "key must not be empty".to_string(),
        });
    }
    Ok(())
}
