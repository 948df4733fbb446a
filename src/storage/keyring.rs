//! System keyring storage.
//!
//! Each key becomes one keyring entry under a shared service name. The
//! keyring cannot enumerate entries, so [`KeyValueStore::keys`] only reports
//! the well-known keys this crate writes.

#[cfg(feature = "system-keyring")]
use tracing::instrument;

#[cfg(feature = "system-keyring")]
use super::{CREDENTIAL_KEYS, KeyValueStore, STATE_KEY, StorageError};

/// Keyring-based key/value storage.
///
/// Feature-gated behind `system-keyring`.
#[cfg(feature = "system-keyring")]
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

#[cfg(feature = "system-keyring")]
impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "system-keyring")]
impl KeyringStore {
    /// Service name for keyring entries.
    const SERVICE_NAME: &str = "bungie-link";

    /// Create a new KeyringStore with the default service name.
    pub fn new() -> Self {
        Self {
            service: Self::SERVICE_NAME.to_string(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry, StorageError> {
        keyring::Entry::new(&self.service, key)
            .map_err(|e| StorageError::Keyring(format!("Failed to create keyring entry: {}", e)))
    }
}

#[cfg(feature = "system-keyring")]
impl KeyValueStore for KeyringStore {
    #[instrument(skip(self))]
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StorageError::Keyring(e.to_string())),
        }
    }

    #[instrument(skip(self, value))]
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| StorageError::Keyring(e.to_string()))
    }

    #[instrument(skip(self))]
    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StorageError::Keyring(e.to_string())),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        for key in CREDENTIAL_KEYS.iter().chain(std::iter::once(&STATE_KEY)) {
            if self.get(key)?.is_some() {
                keys.push((*key).to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn name(&self) -> &str {
        "keyring"
    }
}
