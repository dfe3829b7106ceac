//! String key-value stores backing the session.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tower_sessions::Session;

/// Errors from the underlying session store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Session store error: {0}")]
    Backend(String),
}

impl From<tower_sessions::session::Error> for StoreError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

/// A per-browser string store.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete a value. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl KeyValueStore for Session {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(Self::get::<String>(self, key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Ok(self.insert(key, value).await?)
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        Self::remove::<serde_json::Value>(self, key).await?;
        Ok(())
    }
}

/// In-process store, one per simulated browser.
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryKeyStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with `entries`.
    #[must_use]
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let values = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            values: Mutex::new(values),
        }
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Current value of `key`.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryKeyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_set_get_remove() {
        let store = MemoryKeyStore::new();
        assert_eq!(store.get("role").await.unwrap(), None);

        store.set("role", "owner").await.unwrap();
        assert_eq!(store.get("role").await.unwrap().as_deref(), Some("owner"));

        store.set("role", "staff").await.unwrap();
        assert_eq!(store.value("role").as_deref(), Some("staff"));

        store.remove("role").await.unwrap();
        assert!(!store.contains("role"));
    }

    #[tokio::test]
    async fn test_memory_store_remove_missing_key_is_ok() {
        let store = MemoryKeyStore::new();
        assert!(store.remove("nothing").await.is_ok());
    }

    #[test]
    fn test_with_entries() {
        let store = MemoryKeyStore::with_entries([("a", "1"), ("b", "2")]);
        assert!(store.contains("a"));
        assert_eq!(store.value("b").as_deref(), Some("2"));
    }
}
