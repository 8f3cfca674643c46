//! Parlay Storage - tiered cache for research results
//!
//! A [`StorageService`] sits between the research UI and two unreliable
//! backends: a shared remote record store and a bounded local key-value
//! store. It provides cache-aside reads, write-through saves, lazy TTL
//! expiry, quota-triggered eviction and a circuit breaker that pins the
//! service to the local tier once the remote tier misbehaves.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use parlay_core::Namespace;
//! use parlay_storage::{MemoryLocalStore, StorageConfig, StorageService};
//!
//! # async fn demo() -> parlay_core::ParlayResult<()> {
//! let local = Arc::new(MemoryLocalStore::new());
//! let service = StorageService::local_only(local, StorageConfig::default());
//! let schedule = serde_json::json!({"week": "Week 12", "games": []});
//! service.save(Namespace::Schedule, "Week 12", &schedule).await?;
//! let cached: Option<serde_json::Value> = service.get(Namespace::Schedule, "Week 12").await?;
//! assert!(cached.is_some());
//! # Ok(())
//! # }
//! ```

pub mod circuit;
pub mod config;
pub mod eviction;
pub mod local;
pub mod remote;
pub mod service;
pub mod stats;

pub use circuit::{CircuitBreaker, CircuitState};
pub use config::{StorageConfig, DEFAULT_EVICTION_BATCH, DEFAULT_REMOTE_TIMEOUT_MS};
pub use eviction::EvictionPolicy;
pub use local::{LmdbLocalStore, LocalStore, MemoryLocalStore};
pub use remote::memory::RemoteCallCounts;
pub use remote::{InMemoryRemoteStore, RemoteRecord, RemoteStore, RestRemoteStore};
pub use service::StorageService;
pub use stats::{PruneReport, StorageStats, TierStatus};
