//! JSON file key-value store
//!
//! Keeps the durable tier across runs. The whole map is loaded on first use
//! and rewritten on every change; a missing or corrupt file starts empty.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::storage::KeyValueStore;
use crate::domain::DomainError;

type Entries = BTreeMap<String, Value>;

/// Durable store persisted as one JSON object
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    max_bytes: Option<usize>,
    entries: Mutex<Option<Entries>>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_bytes: None,
            entries: Mutex::new(None),
        }
    }

    /// Caps the serialized file size; writes beyond it fail with a quota error
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Entries, DomainError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => {
                return Err(DomainError::storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Store file is corrupt, starting empty");
                Ok(Entries::new())
            }
        }
    }

    async fn persist(&self, entries: &Entries) -> Result<(), DomainError> {
        let content = serde_json::to_string(entries)
            .map_err(|e| DomainError::storage(format!("Failed to serialize store: {}", e)))?;

        if let Some(max_bytes) = self.max_bytes {
            if content.len() > max_bytes {
                return Err(DomainError::storage(format!(
                    "Storage quota exceeded: {} bytes > {} bytes",
                    content.len(),
                    max_bytes
                )));
            }
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::storage(format!("Failed to create {}: {}", parent.display(), e)))?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, content.as_bytes())
            .await
            .map_err(|e| DomainError::storage(format!("Failed to write {}: {}", temp_path.display(), e)))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to replace {}: {}", self.path.display(), e)))?;

        debug!(path = %self.path.display(), entries = entries.len(), "Store file written");
        Ok(())
    }

    /// Runs `f` on the loaded entries; persists if it reports a change.
    /// A failed write leaves the in-memory view untouched.
    async fn update<T>(
        &self,
        f: impl FnOnce(&mut Entries) -> (T, bool),
    ) -> Result<T, DomainError> {
        let mut guard = self.entries.lock().await;

        let mut entries = match guard.as_ref() {
            Some(entries) => entries.clone(),
            None => self.load().await?,
        };

        let (result, changed) = f(&mut entries);

        if changed {
            self.persist(&entries).await?;
        }

        *guard = Some(entries);
        Ok(result)
    }

    async fn read<T>(&self, f: impl FnOnce(&Entries) -> T) -> Result<T, DomainError> {
        let mut guard = self.entries.lock().await;

        if guard.is_none() {
            *guard = Some(self.load().await?);
        }

        let entries = guard.get_or_insert_with(Entries::new);
        Ok(f(entries))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        self.read(|entries| entries.get(key).map(Value::to_string))
            .await
    }

    async fn set_raw(&self, key: &str, value: &str) -> Result<(), DomainError> {
        let value: Value = serde_json::from_str(value)
            .map_err(|e| DomainError::storage(format!("Value for {} is not JSON: {}", key, e)))?;

        self.update(|entries| {
            entries.insert(key.to_string(), value);
            ((), true)
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<bool, DomainError> {
        self.update(|entries| {
            let removed = entries.remove(key).is_some();
            (removed, removed)
        })
        .await
    }

    async fn keys(&self) -> Result<Vec<String>, DomainError> {
        self.read(|entries| entries.keys().cloned().collect()).await
    }

    async fn clear_prefix(&self, prefix: &str) -> Result<usize, DomainError> {
        self.update(|entries| {
            let before = entries.len();
            entries.retain(|key, _| !key.starts_with(prefix));
            let removed = before - entries.len();
            (removed, removed > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::StoreExt;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> FileStore {
        FileStore::new(dir.path().join("durable.json"))
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();

        store_in(&dir)
            .set("prep_cache:~snapshot", &json!({"company": "Google"}))
            .await
            .unwrap();

        let reopened = store_in(&dir);
        let value: Option<Value> = reopened.get("prep_cache:~snapshot").await.unwrap();
        assert_eq!(value, Some(json!({"company": "Google"})));
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert!(store.get_raw("anything").await.unwrap().is_none());
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_treated_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("durable.json");
        std::fs::write(&path, "{ this is not json").unwrap();

        let store = FileStore::new(&path);
        assert!(store.get_raw("key").await.unwrap().is_none());

        store.set("key", &1).await.unwrap();
        let reopened = FileStore::new(&path);
        let value: Option<i32> = reopened.get("key").await.unwrap();
        assert_eq!(value, Some(1));
    }

    #[tokio::test]
    async fn test_quota_exceeded_rejects_write() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).with_max_bytes(32);

        store.set("small", &"ok").await.unwrap();
        let result = store.set("large", &"x".repeat(64)).await;

        assert!(matches!(result, Err(DomainError::Storage { .. })));
        assert!(store.get_raw("large").await.unwrap().is_none());
        assert!(store.get_raw("small").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clear_prefix_and_remove() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set("prep_cache:~last", &1).await.unwrap();
        store.set("prep_cache:~snapshot", &2).await.unwrap();
        store.set("other", &3).await.unwrap();

        assert_eq!(store.clear_prefix("prep_cache:").await.unwrap(), 2);
        assert!(store.remove("other").await.unwrap());
        assert!(!store.remove("other").await.unwrap());
        assert!(store.keys().await.unwrap().is_empty());
    }
}
