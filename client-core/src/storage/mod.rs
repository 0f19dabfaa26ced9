//! Durable key-value storage for the on-device session state.
//!
//! The trait mirrors the platform's persistent dictionary: string keys,
//! string values, no transactions. `FileStore` is the shipping
//! implementation; `MemoryStore` backs tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error>;
    async fn set(&self, key: &str, value: &str) -> Result<(), anyhow::Error>;
    async fn remove(&self, key: &str) -> Result<(), anyhow::Error>;
    /// Removes several keys with a single write to the backing medium.
    async fn remove_many(&self, keys: &[&str]) -> Result<(), anyhow::Error>;
}

/// File-backed store persisting the whole dictionary as one JSON document.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write never leaves a torn document behind.
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FileStore {
    /// Opens the store at `path`, creating parent directories as needed.
    ///
    /// An unreadable or corrupt document degrades to an empty store with a
    /// warning; the file is rewritten on the next mutation.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, anyhow::Error> {
        let path = path.into();

        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<HashMap<String, String>>(&bytes) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Store file is corrupt, starting empty"
                    );
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to read store file {}: {}",
                    path.display(),
                    e
                ))
            }
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    async fn flush(&self, entries: &HashMap<String, String>) -> Result<(), anyhow::Error> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), anyhow::Error> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), anyhow::Error> {
        let mut entries = self.entries.write().await;
        if entries.remove(key).is_some() {
            self.flush(&entries).await?;
        }
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), anyhow::Error> {
        let mut entries = self.entries.write().await;
        let mut changed = false;
        for key in keys {
            changed |= entries.remove(*key).is_some();
        }
        if changed {
            self.flush(&entries).await?;
        }
        Ok(())
    }
}

/// In-memory store for tests.
pub struct MemoryStore {
    pub entries: std::sync::Mutex<HashMap<String, String>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: std::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("store mutex").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| anyhow::anyhow!("Store mutex poisoned: {}", e))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), anyhow::Error> {
        self.entries
            .lock()
            .map_err(|e| anyhow::anyhow!("Store mutex poisoned: {}", e))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), anyhow::Error> {
        self.entries
            .lock()
            .map_err(|e| anyhow::anyhow!("Store mutex poisoned: {}", e))?
            .remove(key);
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), anyhow::Error> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| anyhow::anyhow!("Store mutex poisoned: {}", e))?;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_store_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");

        let store = FileStore::open(&path).await.expect("open");
        store.set("access", "token-123").await.expect("set");
        store.set("userClub", r#"{"id":1}"#).await.expect("set");

        // A fresh handle over the same file sees the same entries.
        let reopened = FileStore::open(&path).await.expect("reopen");
        assert_eq!(
            reopened.get("access").await.expect("get"),
            Some("token-123".to_string())
        );
        assert_eq!(
            reopened.get("userClub").await.expect("get"),
            Some(r#"{"id":1}"#.to_string())
        );
    }

    #[tokio::test]
    async fn file_store_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");
        tokio::fs::write(&path, b"{ this is not json")
            .await
            .expect("write");

        let store = FileStore::open(&path).await.expect("open");
        assert_eq!(store.get("access").await.expect("get"), None);
    }

    #[tokio::test]
    async fn file_store_remove_many_clears_batch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");

        let store = FileStore::open(&path).await.expect("open");
        store.set("a", "1").await.expect("set");
        store.set("b", "2").await.expect("set");
        store.set("c", "3").await.expect("set");

        store.remove_many(&["a", "b", "missing"]).await.expect("remove");

        assert_eq!(store.get("a").await.expect("get"), None);
        assert_eq!(store.get("b").await.expect("get"), None);
        assert_eq!(store.get("c").await.expect("get"), Some("3".to_string()));
    }

    #[tokio::test]
    async fn memory_store_basics() {
        let store = MemoryStore::new();
        store.set("k", "v").await.expect("set");
        assert_eq!(store.get("k").await.expect("get"), Some("v".to_string()));
        store.remove("k").await.expect("remove");
        assert_eq!(store.get("k").await.expect("get"), None);
        assert!(store.is_empty());
    }
}
