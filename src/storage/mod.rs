//! Client-side key/value storage.
//!
//! Stands in for the browser's storage areas: a session-scoped store that
//! holds the login state token, and a persistent store that holds the
//! credential bundle between runs.
//!
//! - [`KeyValueStore`] - Backend trait (string keys, string values)
//! - [`MemoryStore`] - In-memory backend (session scope, tests)
//! - [`FileStore`] - Single JSON document on disk
//! - [`KeyringStore`] - System keyring (requires `system-keyring` feature)
//! - [`Session`] - The pair of stores handed to every handler

pub mod file;
pub mod keyring;
pub mod memory;
pub mod session;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use session::Session;

#[cfg(feature = "system-keyring")]
pub use keyring::KeyringStore;

use std::sync::Arc;

/// Session-scoped key holding the outbound login state token.
pub const STATE_KEY: &str = "token";

/// Persistent key for the Bungie access token.
pub const ACCESS_TOKEN_KEY: &str = "bungie_access_token";

/// Persistent key for the access token lifetime in seconds.
pub const EXPIRES_IN_KEY: &str = "bungie_expires_in";

/// Persistent key for the Bungie.net membership id.
pub const MEMBERSHIP_ID_KEY: &str = "bungie_membership_id";

/// Keys of the credential bundle, in write order.
pub const CREDENTIAL_KEYS: &[&str] = &[ACCESS_TOKEN_KEY, EXPIRES_IN_KEY, MEMBERSHIP_ID_KEY];

/// Errors raised by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing medium failed.
    #[error("Storage I/O error: {0}")]
    Io(String),

    /// The stored document could not be parsed.
    #[error("Corrupt storage data: {0}")]
    Corrupt(String),

    /// The system keyring rejected the operation.
    #[error("Keyring error: {0}")]
    Keyring(String),
}

/// Trait for key/value storage backends.
///
/// All implementations must be thread-safe (`Send + Sync`). Writers are
/// expected to be serialized by the caller; backends only guarantee that a
/// single call is atomic.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// List the keys currently present, sorted.
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Read and remove `key` in one step.
    fn take(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self.get(key)?;
        if value.is_some() {
            self.remove(key)?;
        }
        Ok(value)
    }

    /// Get the name of this storage backend.
    fn name(&self) -> &str;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
    fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }
    fn take(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).take(key)
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
    fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }
    fn take(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).take(key)
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}
