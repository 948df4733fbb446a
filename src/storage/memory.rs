//! In-memory key/value storage.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::instrument;

use super::{KeyValueStore, StorageError};

/// In-memory key/value storage.
///
/// Uses `Arc<RwLock<BTreeMap>>` so clones share the same map. Backs the
/// session-scoped store and every store used in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStore {
    /// Create a new empty MemoryStore.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a MemoryStore pre-populated with `entries`.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }
}

impl KeyValueStore for MemoryStore {
    #[instrument(skip(self))]
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self.inner.read().expect("lock poisoned");
        Ok(guard.get(key).cloned())
    }

    #[instrument(skip(self, value))]
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self.inner.write().expect("lock poisoned");
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    #[instrument(skip(self))]
    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self.inner.write().expect("lock poisoned");
        guard.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let guard = self.inner.read().expect("lock poisoned");
        Ok(guard.keys().cloned().collect())
    }

    // Single write lock so a concurrent reader never sees the value after it
    // has been handed out.
    fn take(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut guard = self.inner.write().expect("lock poisoned");
        Ok(guard.remove(key))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
