//! Key-value store trait definition

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::domain::DomainError;

/// String key-value store backing one cache tier
///
/// Values are JSON strings so the trait stays dyn-compatible.
/// Use the `StoreExt` helpers for typed access.
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Backend name used in logs and metrics
    fn name(&self) -> &'static str;

    /// Gets a raw JSON value
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Stores a raw JSON value, replacing any previous one
    async fn set_raw(&self, key: &str, value: &str) -> Result<(), DomainError>;

    /// Removes a value, returns true if it existed
    async fn remove(&self, key: &str) -> Result<bool, DomainError>;

    /// Lists all keys
    async fn keys(&self) -> Result<Vec<String>, DomainError>;

    /// Removes every key starting with `prefix`, returns how many were removed
    async fn clear_prefix(&self, prefix: &str) -> Result<usize, DomainError> {
        let mut removed = 0;

        for key in self.keys().await? {
            if key.starts_with(prefix) && self.remove(&key).await? {
                removed += 1;
            }
        }

        Ok(removed)
    }

    /// Number of stored keys
    async fn len(&self) -> Result<usize, DomainError> {
        Ok(self.keys().await?.len())
    }
}

/// Extension trait providing typed get/set operations
pub trait StoreExt: KeyValueStore {
    /// Gets a typed value
    fn get<'a, V>(
        &'a self,
        key: &'a str,
    ) -> impl std::future::Future<Output = Result<Option<V>, DomainError>> + Send
    where
        V: DeserializeOwned + Send,
    {
        async move {
            match self.get_raw(key).await? {
                Some(data) => {
                    let value: V = serde_json::from_str(&data).map_err(|e| {
                        DomainError::storage(format!("Failed to deserialize value for {}: {}", key, e))
                    })?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    /// Stores a typed value
    fn set<'a, V>(
        &'a self,
        key: &'a str,
        value: &'a V,
    ) -> impl std::future::Future<Output = Result<(), DomainError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let data = serde_json::to_string(value).map_err(|e| {
                DomainError::storage(format!("Failed to serialize value for {}: {}", key, e))
            })?;
            self.set_raw(key, &data).await
        }
    }
}

// Blanket implementation for all types implementing KeyValueStore
impl<T: KeyValueStore + ?Sized> StoreExt for T {}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Mock store for testing
    #[derive(Debug, Default)]
    pub struct MockStore {
        entries: Mutex<BTreeMap<String, String>>,
        error: Mutex<Option<String>>,
    }

    impl MockStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_entry<V: Serialize>(self, key: &str, value: &V) -> Self {
            let json = serde_json::to_string(value).unwrap();
            self.entries.lock().unwrap().insert(key.to_string(), json);
            self
        }

        pub fn with_raw(self, key: &str, raw: &str) -> Self {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), raw.to_string());
            self
        }

        pub fn with_error(self, error: impl Into<String>) -> Self {
            self.set_error(Some(error.into()));
            self
        }

        /// Switches failure mode on or off after construction
        pub fn set_error(&self, error: Option<String>) {
            *self.error.lock().unwrap() = error;
        }

        pub fn contains(&self, key: &str) -> bool {
            self.entries.lock().unwrap().contains_key(key)
        }

        pub fn raw(&self, key: &str) -> Option<String> {
            self.entries.lock().unwrap().get(key).cloned()
        }

        fn check_error(&self) -> Result<(), DomainError> {
            if let Some(error) = self.error.lock().unwrap().clone() {
                return Err(DomainError::storage(error));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl KeyValueStore for MockStore {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
            self.check_error()?;
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set_raw(&self, key: &str, value: &str) -> Result<(), DomainError> {
            self.check_error()?;
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<bool, DomainError> {
            self.check_error()?;
            Ok(self.entries.lock().unwrap().remove(key).is_some())
        }

        async fn keys(&self) -> Result<Vec<String>, DomainError> {
            self.check_error()?;
            Ok(self.entries.lock().unwrap().keys().cloned().collect())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_store_set_get() {
            let store = MockStore::new();
            store.set("key1", &"value1").await.unwrap();

            let result: Option<String> = store.get("key1").await.unwrap();
            assert_eq!(result, Some("value1".to_string()));
        }

        #[tokio::test]
        async fn test_mock_store_get_missing() {
            let store = MockStore::new();

            let result: Option<String> = store.get("missing").await.unwrap();
            assert!(result.is_none());
        }

        #[tokio::test]
        async fn test_mock_store_corrupt_value() {
            let store = MockStore::new().with_raw("key", "{not json");

            let result: Result<Option<Vec<u32>>, _> = store.get("key").await;
            assert!(matches!(result, Err(DomainError::Storage { .. })));
        }

        #[tokio::test]
        async fn test_mock_store_with_error() {
            let store = MockStore::new().with_error("quota exceeded");

            let result: Result<Option<String>, _> = store.get("key").await;
            assert!(result.is_err());
        }

        #[tokio::test]
        async fn test_clear_prefix_default_impl() {
            let store = MockStore::new()
                .with_entry("prep_cache:a", &1)
                .with_entry("prep_cache:b", &2)
                .with_entry("other:c", &3);

            let removed = store.clear_prefix("prep_cache:").await.unwrap();

            assert_eq!(removed, 2);
            assert_eq!(store.len().await.unwrap(), 1);
            assert!(store.contains("other:c"));
        }
    }
}
