//! Quota-triggered eviction of the oldest local entries.

use parlay_core::CacheEntry;
use tracing::debug;

use crate::config::DEFAULT_EVICTION_BATCH;
use crate::local::{owned_keys, LocalStore};
use parlay_core::LocalStoreError;

/// Picks which local entries to drop when the local tier is full.
///
/// The candidate set is every key under the `parlay:` prefix in every
/// namespace, since the quota is shared. Corrupt values count as
/// `capturedAt = 0` and therefore go first; ties are broken by key so the
/// choice is deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    batch: usize,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self::oldest_first(DEFAULT_EVICTION_BATCH)
    }
}

impl EvictionPolicy {
    pub fn oldest_first(batch: usize) -> Self {
        Self {
            batch: batch.max(1),
        }
    }

    pub fn batch(&self) -> usize {
        self.batch
    }

    /// Choose up to `batch` keys from `(key, captured_at)` candidates.
    pub fn select(&self, mut candidates: Vec<(String, i64)>) -> Vec<String> {
        candidates.sort_by(|(ka, ta), (kb, tb)| ta.cmp(tb).then_with(|| ka.cmp(kb)));
        candidates
            .into_iter()
            .take(self.batch)
            .map(|(key, _)| key)
            .collect()
    }

    /// Delete the oldest entries from `store`, returning the removed keys.
    pub async fn evict(&self, store: &dyn LocalStore) -> Result<Vec<String>, LocalStoreError> {
        let mut candidates = Vec::new();
        for key in owned_keys(store, None).await? {
            let captured_at = match store.get(&key).await? {
                Some(raw) => CacheEntry::captured_at_or_zero(&raw),
                None => continue,
            };
            candidates.push((key, captured_at));
        }

        let victims = self.select(candidates);
        for key in &victims {
            store.delete(key).await?;
        }

        debug!(evicted = victims.len(), "Evicted oldest local entries");
        Ok(victims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::MemoryLocalStore;
    use parlay_core::Namespace;
    use serde_json::json;

    #[test]
    fn test_select_oldest_with_tiebreak() {
        let policy = EvictionPolicy::oldest_first(3);
        let picked = policy.select(vec![
            ("d".to_string(), 40),
            ("b".to_string(), 10),
            ("a".to_string(), 10),
            ("c".to_string(), 0),
            ("e".to_string(), 50),
        ]);
        assert_eq!(picked, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_batch_is_at_least_one() {
        assert_eq!(EvictionPolicy::oldest_first(0).batch(), 1);
        assert_eq!(EvictionPolicy::default().batch(), 5);
    }

    #[tokio::test]
    async fn test_evict_prefers_corrupt_and_ignores_foreign_keys() {
        let store = MemoryLocalStore::new();
        for (i, ns) in [Namespace::Matchup, Namespace::Schedule].iter().enumerate() {
            for t in 0..3i64 {
                let entry = CacheEntry::new(100 + t * 10 + i as i64, json!({"t": t}));
                let raw = entry.encode().expect("encode should succeed");
                store.insert_raw(ns.local_key(&format!("id{t}")), raw);
            }
        }
        store.insert_raw(Namespace::Matchup.local_key("broken"), "{not json");
        store.insert_raw("theme", "dark");

        let policy = EvictionPolicy::oldest_first(2);
        let evicted = policy.evict(&store).await.expect("evict should succeed");

        assert_eq!(
            evicted,
            vec![
                Namespace::Matchup.local_key("broken"),
                Namespace::Matchup.local_key("id0"),
            ]
        );
        assert_eq!(store.get("theme").await.expect("get").as_deref(), Some("dark"));
        assert_eq!(store.len(), 6);
    }
}
