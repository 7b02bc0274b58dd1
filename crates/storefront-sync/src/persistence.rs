//! # Local Key-Value Persistence
//!
//! String-keyed, string-valued device storage: the offline product list,
//! purchased flags, session, theme and deferred deep link.
//!
//! ## Stored Keys
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Key               Value                          Written by            │
//! │  ────────────────  ─────────────────────────────  ───────────────────   │
//! │  products          JSON array of Product          coordinator (offline) │
//! │  purchased_ids     JSON array of product ids      coordinator (online)  │
//! │  user_data         JSON UserSession               accounts              │
//! │  app_theme         "light" | "dark"               preferences           │
//! │  pendingDeepLink   raw jualpc:// URL              app context           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## File Layout
//! `FileKeyValueStore` keeps every key in one JSON object file. Each write
//! goes to a sibling temp file first and is renamed over the original.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};

/// Storage key names.
pub mod keys {
    pub const PRODUCTS: &str = "products";
    pub const PURCHASED_IDS: &str = "purchased_ids";
    pub const USER_DATA: &str = "user_data";
    pub const APP_THEME: &str = "app_theme";
    pub const PENDING_DEEP_LINK: &str = "pendingDeepLink";
}

// =============================================================================
// KeyValueStore Trait
// =============================================================================

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> SyncResult<Option<String>>;

    async fn set(&self, key: &str, value: String) -> SyncResult<()>;

    /// Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> SyncResult<()>;

    /// Every stored pair, sorted by key.
    async fn entries(&self) -> SyncResult<BTreeMap<String, String>>;
}

// =============================================================================
// Helpers
// =============================================================================

/// Reads a key, logging and swallowing storage failures.
pub async fn read_or_absent(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key).await {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "Storage read failed, treating as absent");
            None
        }
    }
}

/// Reads and decodes a JSON value. Unreadable or malformed values are
/// logged and treated as absent.
pub async fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = read_or_absent(store, key).await?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "Stored value is not valid JSON, treating as absent");
            None
        }
    }
}

/// Encodes a value as JSON and stores it.
pub async fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> SyncResult<()> {
    let encoded = serde_json::to_string(value)?;
    store.set(key, encoded).await
}

// =============================================================================
// Memory Store
// =============================================================================

/// Process-local store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<BTreeMap<String, String>>,
    failing: AtomicBool,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every call fails with `SyncError::Storage`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> SyncResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SyncError::Storage("storage unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> SyncResult<Option<String>> {
        self.check()?;
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> SyncResult<()> {
        self.check()?;
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> SyncResult<()> {
        self.check()?;
        self.entries.write().remove(key);
        Ok(())
    }

    async fn entries(&self) -> SyncResult<BTreeMap<String, String>> {
        self.check()?;
        Ok(self.entries.read().clone())
    }
}

// =============================================================================
// File Store
// =============================================================================

/// Store backed by a single JSON object file.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles.
    lock: Mutex<()>,
}

impl FileKeyValueStore {
    /// Uses `path` as the backing file. It is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileKeyValueStore {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `storage.json` inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join("storage.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> SyncResult<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)
                .map_err(|e| SyncError::Storage(format!("{}: {}", self.path.display(), e)))?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, entries: &BTreeMap<String, String>) -> SyncResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let encoded = serde_json::to_string_pretty(entries)?;
        let temp = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp, encoded).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        debug!(path = %self.path.display(), keys = entries.len(), "Storage file written");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> SyncResult<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> SyncResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value);
        self.store(&entries).await
    }

    async fn remove(&self, key: &str) -> SyncResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.store(&entries).await?;
        }
        Ok(())
    }

    async fn entries(&self) -> SyncResult<BTreeMap<String, String>> {
        let _guard = self.lock.lock().await;
        self.load().await
    }
}
