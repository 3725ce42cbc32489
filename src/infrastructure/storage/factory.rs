//! Store factory for runtime backend selection

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::storage::KeyValueStore;
use crate::domain::DomainError;

use super::file::FileStore;
use super::in_memory::{InMemoryStore, InMemoryStoreConfig};

/// Supported store backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Process-local store using moka
    #[default]
    InMemory,
    /// JSON file on disk
    File,
}

impl std::fmt::Display for StoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreType::InMemory => write!(f, "in_memory"),
            StoreType::File => write!(f, "file"),
        }
    }
}

impl std::str::FromStr for StoreType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(StoreType::InMemory),
            "file" | "json" => Ok(StoreType::File),
            _ => Err(DomainError::configuration(format!(
                "Unknown store type: {}. Valid types: in_memory, file",
                s
            ))),
        }
    }
}

/// Configuration for one store
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    pub store_type: StoreType,
    /// File path (required for the file type)
    pub path: Option<PathBuf>,
    /// Maximum entries (in-memory only)
    pub max_capacity: Option<u64>,
    /// Hard eviction bound (in-memory only)
    pub time_to_live: Option<Duration>,
    /// Maximum serialized size (file only)
    pub max_bytes: Option<usize>,
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self {
            store_type: StoreType::InMemory,
            ..Default::default()
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            store_type: StoreType::File,
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = Some(capacity);
        self
    }

    pub fn with_time_to_live(mut self, ttl: Duration) -> Self {
        self.time_to_live = Some(ttl);
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }
}

/// Factory for creating store instances
#[derive(Debug, Default)]
pub struct StoreFactory;

impl StoreFactory {
    pub fn new() -> Self {
        Self
    }

    /// Creates a store based on configuration
    pub fn create(&self, config: &StoreConfig) -> Result<Arc<dyn KeyValueStore>, DomainError> {
        match config.store_type {
            StoreType::InMemory => {
                let mut store_config = InMemoryStoreConfig::default();

                if let Some(capacity) = config.max_capacity {
                    store_config = store_config.with_max_capacity(capacity);
                }

                if let Some(ttl) = config.time_to_live {
                    store_config = store_config.with_time_to_live(ttl);
                }

                Ok(Arc::new(InMemoryStore::with_config(store_config)))
            }
            StoreType::File => {
                let path = config.path.clone().ok_or_else(|| {
                    DomainError::configuration("A path is required for the file store type")
                })?;

                let mut store = FileStore::new(path);

                if let Some(max_bytes) = config.max_bytes {
                    store = store.with_max_bytes(max_bytes);
                }

                Ok(Arc::new(store))
            }
        }
    }

    /// Creates an in-memory store with default settings
    pub fn create_in_memory(&self) -> Arc<dyn KeyValueStore> {
        Arc::new(InMemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::StoreExt;

    #[test]
    fn test_store_type_from_str() {
        assert_eq!("in_memory".parse::<StoreType>().unwrap(), StoreType::InMemory);
        assert_eq!("memory".parse::<StoreType>().unwrap(), StoreType::InMemory);
        assert_eq!("FILE".parse::<StoreType>().unwrap(), StoreType::File);
        assert!("redis".parse::<StoreType>().is_err());
    }

    #[test]
    fn test_store_type_display() {
        assert_eq!(StoreType::InMemory.to_string(), "in_memory");
        assert_eq!(StoreType::File.to_string(), "file");
    }

    #[tokio::test]
    async fn test_factory_create_in_memory() {
        let store = StoreFactory::new()
            .create(&StoreConfig::in_memory().with_max_capacity(10))
            .unwrap();

        store.set("test", &"value").await.unwrap();

        let result: Option<String> = store.get("test").await.unwrap();
        assert_eq!(result, Some("value".to_string()));
        assert_eq!(store.name(), "in_memory");
    }

    #[test]
    fn test_factory_file_requires_path() {
        let config = StoreConfig {
            store_type: StoreType::File,
            ..Default::default()
        };

        assert!(StoreFactory::new().create(&config).is_err());
    }

    #[test]
    fn test_factory_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreFactory::new()
            .create(&StoreConfig::file(dir.path().join("store.json")).with_max_bytes(1024))
            .unwrap();

        assert_eq!(store.name(), "file");
    }
}
