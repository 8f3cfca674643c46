//! LMDB-backed local tier.
//!
//! Uses the heed crate (Rust bindings for LMDB) as a durable, memory-mapped
//! local store for the CLI. The map size is the capacity: once LMDB reports
//! `MDB_MAP_FULL` the write surfaces as `QuotaExceeded`, which the storage
//! service answers by evicting old entries and retrying.
//!
//! Reads use read transactions, each mutation its own write transaction.

use std::path::Path;

use async_trait::async_trait;
use heed::types::Str;
use heed::{Database, Env, EnvOpenOptions, MdbError};
use parlay_core::LocalStoreError;

use super::LocalStore;

/// Error opening the LMDB environment.
#[derive(Debug, thiserror::Error)]
pub enum LmdbOpenError {
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    #[error("Failed to open database: {0}")]
    DbOpen(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct LmdbLocalStore {
    env: Env,
    db: Database<Str, Str>,
}

impl LmdbLocalStore {
    /// Open (or create) a store under `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Map size in megabytes; writes beyond it hit the quota
    pub fn open<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbOpenError> {
        std::fs::create_dir_all(&path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb.max(1) * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbOpenError::EnvOpen(e.to_string()))?;

        let mut wtxn = env
            .write_txn()
            .map_err(|e| LmdbOpenError::Transaction(e.to_string()))?;

        let db: Database<Str, Str> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbOpenError::DbOpen(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbOpenError::Transaction(e.to_string()))?;

        Ok(Self { env, db })
    }

    fn map_write_error(key: &str, value: &str, e: heed::Error) -> LocalStoreError {
        match e {
            heed::Error::Mdb(MdbError::MapFull) => LocalStoreError::QuotaExceeded {
                key: key.to_string(),
                bytes: key.len() + value.len(),
            },
            other => backend(other),
        }
    }
}

fn backend(e: heed::Error) -> LocalStoreError {
    LocalStoreError::Backend {
        reason: e.to_string(),
    }
}

#[async_trait]
impl LocalStore for LmdbLocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError> {
        let rtxn = self.env.read_txn().map_err(backend)?;
        let value = self.db.get(&rtxn, key).map_err(backend)?;
        Ok(value.map(str::to_string))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError> {
        let mut wtxn = self.env.write_txn().map_err(backend)?;

        self.db
            .put(&mut wtxn, key, value)
            .map_err(|e| Self::map_write_error(key, value, e))?;

        wtxn.commit()
            .map_err(|e| Self::map_write_error(key, value, e))
    }

    async fn delete(&self, key: &str) -> Result<bool, LocalStoreError> {
        let mut wtxn = self.env.write_txn().map_err(backend)?;
        let deleted = self.db.delete(&mut wtxn, key).map_err(backend)?;
        wtxn.commit().map_err(backend)?;
        Ok(deleted)
    }

    async fn keys(&self) -> Result<Vec<String>, LocalStoreError> {
        let rtxn = self.env.read_txn().map_err(backend)?;
        let iter = self.db.iter(&rtxn).map_err(backend)?;

        let mut keys = Vec::new();
        for result in iter {
            match result {
                Ok((key, _)) => keys.push(key.to_string()),
                Err(_) => continue,
            }
        }
        Ok(keys)
    }
}

impl std::fmt::Debug for LmdbLocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LmdbLocalStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (LmdbLocalStore, TempDir) {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        let store = LmdbLocalStore::open(temp_dir.path(), 10).expect("open should succeed");
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (store, _temp_dir) = create_test_store();
        store
            .set("parlay:schedule:Week 1", r#"{"capturedAt":1,"payload":null}"#)
            .await
            .expect("set should succeed");

        let value = store
            .get("parlay:schedule:Week 1")
            .await
            .expect("get should succeed");
        assert_eq!(value.as_deref(), Some(r#"{"capturedAt":1,"payload":null}"#));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let (store, _temp_dir) = create_test_store();
        assert!(store.get("missing").await.expect("get should succeed").is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let (store, _temp_dir) = create_test_store();
        store.set("k", "v").await.expect("set should succeed");
        assert!(store.delete("k").await.expect("delete should succeed"));
        assert!(!store.delete("k").await.expect("delete should succeed"));
        assert!(store.get("k").await.expect("get should succeed").is_none());
    }

    #[tokio::test]
    async fn test_overwrite() {
        let (store, _temp_dir) = create_test_store();
        store.set("k", "old").await.expect("set should succeed");
        store.set("k", "new").await.expect("set should succeed");
        assert_eq!(store.get("k").await.expect("get").as_deref(), Some("new"));
        assert_eq!(store.keys().await.expect("keys").len(), 1);
    }

    #[tokio::test]
    async fn test_keys() {
        let (store, _temp_dir) = create_test_store();
        for key in ["parlay:matchup:a", "parlay:matchup:b", "other"] {
            store.set(key, "v").await.expect("set should succeed");
        }
        let mut keys = store.keys().await.expect("keys should succeed");
        keys.sort();
        assert_eq!(keys, vec!["other", "parlay:matchup:a", "parlay:matchup:b"]);
    }

    #[tokio::test]
    async fn test_full_map_reports_quota() {
        let (store, _temp_dir) = create_test_store();
        let chunk = "x".repeat(256 * 1024);
        let mut saw_quota = false;
        for i in 0..80 {
            match store.set(&format!("k{i}"), &chunk).await {
                Ok(()) => continue,
                Err(e) => {
                    assert!(e.is_quota(), "expected quota error, got {e}");
                    saw_quota = true;
                    break;
                }
            }
        }
        assert!(saw_quota, "a 10MB map cannot hold 20MB of values");
    }
}
