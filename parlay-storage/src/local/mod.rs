//! Local key-value tier.
//!
//! The local tier is a flat string-to-string store with finite capacity,
//! the same contract a browser's local storage offers. Backends report a
//! full store as [`LocalStoreError::QuotaExceeded`] so the service can
//! evict and retry.

pub mod lmdb;
pub mod memory;

pub use lmdb::LmdbLocalStore;
pub use memory::MemoryLocalStore;

use async_trait::async_trait;
use parlay_core::{LocalKey, LocalStoreError, Namespace};

#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError>;

    /// Returns whether a value was removed.
    async fn delete(&self, key: &str) -> Result<bool, LocalStoreError>;

    /// Every key in the store, including keys this crate did not write.
    async fn keys(&self) -> Result<Vec<String>, LocalStoreError>;
}

/// Raw keys belonging to `namespace`, or to any namespace when `None`.
pub(crate) async fn owned_keys(
    store: &dyn LocalStore,
    namespace: Option<Namespace>,
) -> Result<Vec<String>, LocalStoreError> {
    let keys = store.keys().await?;
    Ok(keys
        .into_iter()
        .filter(|raw| match LocalKey::parse(raw) {
            Some(key) => namespace.map_or(true, |ns| key.namespace == ns),
            None => false,
        })
        .collect())
}
