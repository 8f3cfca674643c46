//! In-memory local tier with a byte quota.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use parlay_core::LocalStoreError;

use super::LocalStore;

/// Map-backed local store.
///
/// Usage is measured as the sum of key and value lengths. A `set` that
/// would push usage past the capacity fails with `QuotaExceeded` and
/// leaves the store untouched.
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    entries: RwLock<HashMap<String, String>>,
    capacity_bytes: Option<usize>,
}

impl MemoryLocalStore {
    /// Unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_bytes(capacity_bytes: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity_bytes: Some(capacity_bytes),
        }
    }

    pub fn used_bytes(&self) -> usize {
        self.entries
            .read()
            .map(|entries| entries.iter().map(|(k, v)| k.len() + v.len()).sum())
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write a value without quota checks. Lets tests plant corrupt entries.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.into(), value.into());
        }
    }
}

fn poisoned() -> LocalStoreError {
    LocalStoreError::Backend {
        reason: "local store lock poisoned".to_string(),
    }
}

#[async_trait]
impl LocalStore for MemoryLocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;

        if let Some(capacity) = self.capacity_bytes {
            let used: usize = entries.iter().map(|(k, v)| k.len() + v.len()).sum();
            let replaced = entries.get(key).map_or(0, |old| key.len() + old.len());
            let incoming = key.len() + value.len();
            if used - replaced + incoming > capacity {
                return Err(LocalStoreError::QuotaExceeded {
                    key: key.to_string(),
                    bytes: incoming,
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, LocalStoreError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        Ok(entries.remove(key).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>, LocalStoreError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryLocalStore::new();
        store.set("a", "1").await.expect("set should succeed");
        assert_eq!(store.get("a").await.expect("get"), Some("1".to_string()));
        assert!(store.delete("a").await.expect("delete"));
        assert!(!store.delete("a").await.expect("delete"));
        assert_eq!(store.get("a").await.expect("get"), None);
    }

    #[tokio::test]
    async fn test_quota_rejects_without_writing() {
        let store = MemoryLocalStore::with_capacity_bytes(10);
        store.set("k1", "12345").await.expect("7 bytes fit");

        let err = store.set("k2", "12345").await.expect_err("14 bytes do not fit");
        assert!(err.is_quota());
        assert_eq!(store.get("k2").await.expect("get"), None);
        assert_eq!(store.used_bytes(), 7);
    }

    #[tokio::test]
    async fn test_overwrite_accounts_for_replaced_value() {
        let store = MemoryLocalStore::with_capacity_bytes(10);
        store.set("k", "12345678").await.expect("9 bytes fit");
        // replacing the same key must not double count
        store.set("k", "87654321").await.expect("overwrite fits");
        assert_eq!(store.len(), 1);
        assert_eq!(store.used_bytes(), 9);
    }

    #[tokio::test]
    async fn test_keys_lists_everything() {
        let store = MemoryLocalStore::new();
        store.set("parlay:matchup:a", "x").await.expect("set");
        store.insert_raw("theme", "dark");
        let mut keys = store.keys().await.expect("keys");
        keys.sort();
        assert_eq!(keys, vec!["parlay:matchup:a".to_string(), "theme".to_string()]);
    }
}
