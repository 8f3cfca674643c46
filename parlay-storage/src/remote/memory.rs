//! In-memory remote store with fault injection.
//!
//! Stands in for the shared cloud store in tests and offline runs. Every
//! operation is counted, and a configured failure is returned from every
//! call until [`InMemoryRemoteStore::heal`] is called.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use parlay_core::{RemoteError, RemoteErrorKind};

use super::{RemoteRecord, RemoteStore};

#[derive(Debug, Default)]
struct CallCounters {
    upsert: AtomicUsize,
    fetch: AtomicUsize,
    list: AtomicUsize,
    probe: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoteCallCounts {
    pub upsert: usize,
    pub fetch: usize,
    pub list: usize,
    pub probe: usize,
}

impl RemoteCallCounts {
    pub fn total(&self) -> usize {
        self.upsert + self.fetch + self.list + self.probe
    }
}

#[derive(Debug)]
pub struct InMemoryRemoteStore {
    tables: RwLock<HashMap<String, BTreeMap<String, RemoteRecord>>>,
    failure: RwLock<Option<RemoteError>>,
    latency: RwLock<Option<Duration>>,
    configured: AtomicBool,
    calls: CallCounters,
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            failure: RwLock::new(None),
            latency: RwLock::new(None),
            configured: AtomicBool::new(true),
            calls: CallCounters::default(),
        }
    }

    /// A store that reports missing configuration.
    pub fn unconfigured() -> Self {
        let store = Self::new();
        store.configured.store(false, Ordering::SeqCst);
        store
    }

    /// Fail every subsequent call with `kind`.
    pub fn fail_with(&self, kind: RemoteErrorKind) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = Some(RemoteError::new(kind, format!("injected {} failure", kind)));
        }
    }

    pub fn heal(&self) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = None;
        }
    }

    /// Delay every call; combine with a short service timeout to simulate hangs.
    pub fn set_latency(&self, latency: Option<Duration>) {
        if let Ok(mut guard) = self.latency.write() {
            *guard = latency;
        }
    }

    /// Seed a row directly, bypassing counters and failures.
    pub fn insert_record(&self, table: &str, record: RemoteRecord) {
        if let Ok(mut tables) = self.tables.write() {
            tables
                .entry(table.to_string())
                .or_default()
                .insert(record.id.clone(), record);
        }
    }

    pub fn record(&self, table: &str, id: &str) -> Option<RemoteRecord> {
        self.tables
            .read()
            .ok()
            .and_then(|tables| tables.get(table).and_then(|rows| rows.get(id).cloned()))
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .map(|tables| tables.get(table).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    pub fn calls(&self) -> RemoteCallCounts {
        RemoteCallCounts {
            upsert: self.calls.upsert.load(Ordering::SeqCst),
            fetch: self.calls.fetch.load(Ordering::SeqCst),
            list: self.calls.list.load(Ordering::SeqCst),
            probe: self.calls.probe.load(Ordering::SeqCst),
        }
    }

    async fn enter(&self, counter: &AtomicUsize) -> Result<(), RemoteError> {
        counter.fetch_add(1, Ordering::SeqCst);

        let latency = self.latency.read().ok().and_then(|l| *l);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let failure = self.failure.read().ok().and_then(|f| f.clone());
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn poisoned() -> RemoteError {
        RemoteError::transient("in-memory remote lock poisoned")
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    fn is_configured(&self) -> bool {
        self.configured.load(Ordering::SeqCst)
    }

    async fn upsert(&self, table: &str, record: &RemoteRecord) -> Result<(), RemoteError> {
        self.enter(&self.calls.upsert).await?;
        let mut tables = self.tables.write().map_err(|_| Self::poisoned())?;
        tables
            .entry(table.to_string())
            .or_default()
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn fetch(&self, table: &str, id: &str) -> Result<Option<RemoteRecord>, RemoteError> {
        self.enter(&self.calls.fetch).await?;
        let tables = self.tables.read().map_err(|_| Self::poisoned())?;
        Ok(tables.get(table).and_then(|rows| rows.get(id).cloned()))
    }

    async fn list_ids(&self, table: &str) -> Result<Vec<String>, RemoteError> {
        self.enter(&self.calls.list).await?;
        let tables = self.tables.read().map_err(|_| Self::poisoned())?;
        Ok(tables
            .get(table)
            .map(|rows| rows.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn probe(&self, _table: &str) -> Result<(), RemoteError> {
        self.enter(&self.calls.probe).await
    }
}
