//! Local cache snapshots.
//!
//! A collection is either a `Persisted` snapshot (read from the device
//! store, stale-but-available) or a `Network` snapshot (fresh). A network
//! snapshot always supersedes a persisted one; on network failure the
//! persisted snapshot stays authoritative.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::store::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSource {
    Persisted,
    Network,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedCollection<T> {
    pub items: Vec<T>,
    pub source: CacheSource,
    pub last_refreshed: DateTime<Utc>,
}

impl<T> CachedCollection<T> {
    /// An empty, never-fetched collection. User-scoped collections are
    /// explicitly empty rather than absent when there is no session.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            source: CacheSource::Persisted,
            last_refreshed: DateTime::<Utc>::MIN_UTC,
        }
    }

    /// Wraps a fresh network result.
    pub fn from_network(items: Vec<T>) -> Self {
        Self {
            items,
            source: CacheSource::Network,
            last_refreshed: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for CachedCollection<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: DeserializeOwned> CachedCollection<T> {
    /// Loads the persisted snapshot under `key`, if any. Whatever the
    /// snapshot claimed when written, a loaded snapshot is `Persisted` —
    /// only a live fetch in this process may claim `Network`.
    pub async fn load(store: &dyn KeyValueStore, key: &str) -> Option<Self> {
        let raw = store.get(key).await?;
        match serde_json::from_str::<Self>(&raw) {
            Ok(mut snapshot) => {
                snapshot.source = CacheSource::Persisted;
                Some(snapshot)
            }
            Err(e) => {
                warn!("discarding unreadable cache snapshot '{key}': {e}");
                None
            }
        }
    }
}

impl<T: Serialize> CachedCollection<T> {
    /// Writes this snapshot under `key`. Serialization failures are logged,
    /// not surfaced; the in-memory copy already committed.
    pub async fn persist(&self, store: &dyn KeyValueStore, key: &str) {
        match serde_json::to_string(self) {
            Ok(raw) => store.set(key, &raw).await,
            Err(e) => warn!("failed to serialize cache snapshot '{key}': {e}"),
        }
    }
}
