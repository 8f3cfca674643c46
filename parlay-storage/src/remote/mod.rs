//! Remote record store tier.
//!
//! The remote tier is a shared table store (one table per namespace) that
//! outlives a single session. Implementations classify every failure into
//! a [`RemoteErrorKind`](parlay_core::RemoteErrorKind) before returning it;
//! the storage service only ever looks at the kind.

pub mod memory;
pub mod rest;

pub use memory::InMemoryRemoteStore;
pub use rest::RestRemoteStore;

use async_trait::async_trait;
use parlay_core::{CacheEntry, Namespace, RemoteError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of a namespace table.
///
/// Columns: `id | capturedAt | payload | sources | rawText`. The last two
/// are only filled for matchup rows and mirror fields of `payload`, which
/// always holds the complete cached value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRecord {
    pub id: String,
    pub captured_at: i64,
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

impl RemoteRecord {
    pub fn from_entry(namespace: Namespace, id: &str, entry: &CacheEntry) -> Self {
        let (sources, raw_text) = match (namespace, entry.payload.as_object()) {
            (Namespace::Matchup, Some(obj)) => (
                obj.get("sources").cloned(),
                obj.get("rawText").and_then(Value::as_str).map(str::to_string),
            ),
            _ => (None, None),
        };

        Self {
            id: id.to_string(),
            captured_at: entry.captured_at,
            payload: entry.payload.clone(),
            sources,
            raw_text,
        }
    }

    pub fn into_entry(self) -> CacheEntry {
        CacheEntry::new(self.captured_at, self.payload)
    }
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Whether the store has the settings it needs to be reached at all.
    /// An unconfigured store starts the session with the circuit open.
    fn is_configured(&self) -> bool {
        true
    }

    /// Insert or replace the row with `record.id`.
    async fn upsert(&self, table: &str, record: &RemoteRecord) -> Result<(), RemoteError>;

    /// Missing rows are `Ok(None)`, not an error.
    async fn fetch(&self, table: &str, id: &str) -> Result<Option<RemoteRecord>, RemoteError>;

    async fn list_ids(&self, table: &str) -> Result<Vec<String>, RemoteError>;

    /// Minimal bounded read used to decide whether the tier is reachable.
    async fn probe(&self, table: &str) -> Result<(), RemoteError>;
}
