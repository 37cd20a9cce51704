//! Persistent Key-Value Store boundary.
//!
//! The device store is an external collaborator: string values by key,
//! surviving process restarts. Two backends: `MemoryStore` for tests and
//! `FileStore` for real runs (a single JSON document on disk).
//!
//! Store reads and writes are suspension points; in-memory state is always
//! committed before the corresponding persisted write, so a crash between
//! the two loses at most the latest mutation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::warn;

/// Well-known store keys. User-scoped keys are cleared on logout; the
/// anonymous job cache, theme, and onboarding flag survive it.
pub mod keys {
    pub const TOKEN: &str = "session.token";
    pub const IDENTITY: &str = "session.identity";
    pub const THEME: &str = "prefs.theme";
    pub const ONBOARDING_COMPLETE: &str = "prefs.onboarding_complete";
    pub const JOBS: &str = "cache.jobs";
    pub const APPLICATIONS: &str = "cache.applications";
    pub const NOTIFICATIONS: &str = "cache.notifications";
    pub const SAVED_JOB_IDS: &str = "cache.saved_job_ids";
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: &str);
    async fn remove(&self, key: &str);
}

// ────────────────────────────────────────────────────────────────────────────
// MemoryStore — ephemeral backend for tests
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.map.lock().unwrap().get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str) {
        self.map
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    async fn remove(&self, key: &str) {
        self.map.lock().unwrap().remove(key);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// FileStore — one JSON document on disk
// ────────────────────────────────────────────────────────────────────────────

/// File-backed store. The whole map lives in memory and is rewritten to
/// disk after every mutation; a write failure is logged and the in-memory
/// value stays authoritative for the rest of the process lifetime.
pub struct FileStore {
    path: PathBuf,
    map: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Opens (or creates) the store file under `dir`.
    pub async fn open(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join("store.json");

        let map = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("store file {} is corrupt, starting empty: {e}", path.display());
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };

        Ok(Self {
            path,
            map: Mutex::new(map),
        })
    }

    async fn flush(&self) {
        let raw = {
            let map = self.map.lock().unwrap();
            serde_json::to_string(&*map).unwrap_or_else(|_| "{}".to_string())
        };
        if let Err(e) = tokio::fs::write(&self.path, raw).await {
            warn!("failed to persist store to {}: {e}", self.path.display());
        }
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.map.lock().unwrap().get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str) {
        self.map
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self.flush().await;
    }

    async fn remove(&self, key: &str) {
        self.map.lock().unwrap().remove(key);
        self.flush().await;
    }
}
