//! Session context shared by the login, callback, and profile handlers.

use std::sync::Arc;

use tracing::{debug, info};

use super::{
    ACCESS_TOKEN_KEY, CREDENTIAL_KEYS, FileStore, KeyValueStore, MEMBERSHIP_ID_KEY, MemoryStore,
    STATE_KEY, StorageError,
};
use crate::config::{StorageBackend, StorageConfig};

/// The two storage scopes a login session works against.
///
/// `transient` holds the login state token and lives as long as the process;
/// `persistent` holds the credential bundle across runs. Handlers receive the
/// session by reference and never reach for global storage.
#[derive(Clone)]
pub struct Session {
    transient: Arc<dyn KeyValueStore>,
    persistent: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("transient", &self.transient.name())
            .field("persistent", &self.persistent.name())
            .finish()
    }
}

impl Session {
    /// Create a session from explicit stores.
    pub fn new(transient: Arc<dyn KeyValueStore>, persistent: Arc<dyn KeyValueStore>) -> Self {
        Self {
            transient,
            persistent,
        }
    }

    /// Create a session whose stores are both in memory.
    pub fn ephemeral() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// Create a session using the persistent backend selected in config.
    pub fn from_config(config: &StorageConfig) -> Self {
        let persistent: Arc<dyn KeyValueStore> = match config.backend {
            StorageBackend::File => Arc::new(FileStore::new(&config.dir)),
            #[cfg(feature = "system-keyring")]
            StorageBackend::Keyring => Arc::new(super::KeyringStore::new()),
            #[cfg(not(feature = "system-keyring"))]
            StorageBackend::Keyring => {
                tracing::warn!(
                    "Keyring storage requested but system-keyring feature not enabled, falling back to file storage"
                );
                Arc::new(FileStore::new(&config.dir))
            }
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
        };

        info!(backend = persistent.name(), "Persistent storage ready");
        Self::new(Arc::new(MemoryStore::new()), persistent)
    }

    /// Session-scoped store.
    pub fn transient(&self) -> &dyn KeyValueStore {
        self.transient.as_ref()
    }

    /// Persistent store.
    pub fn persistent(&self) -> &dyn KeyValueStore {
        self.persistent.as_ref()
    }

    /// Remember the state token of an outbound authorization request.
    pub fn store_state(&self, state: &str) -> Result<(), StorageError> {
        self.transient.set(STATE_KEY, state)
    }

    /// Consume the stored state token. A second call returns `None`.
    pub fn take_state(&self) -> Result<Option<String>, StorageError> {
        self.transient.take(STATE_KEY)
    }

    /// Stored access token, if a login has completed.
    pub fn access_token(&self) -> Result<Option<String>, StorageError> {
        self.persistent.get(ACCESS_TOKEN_KEY)
    }

    /// Stored Bungie.net membership id, if a login has completed.
    pub fn membership_id(&self) -> Result<Option<String>, StorageError> {
        self.persistent.get(MEMBERSHIP_ID_KEY)
    }

    /// Remove every credential key from persistent storage.
    pub fn clear_credentials(&self) -> Result<(), StorageError> {
        for key in CREDENTIAL_KEYS {
            self.persistent.remove(key)?;
        }
        debug!("Credentials cleared");
        Ok(())
    }
}
