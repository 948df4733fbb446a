//! File-backed key/value storage.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::instrument;

use super::{KeyValueStore, StorageError};

/// File name of the storage document inside the storage directory.
const STORE_FILE_NAME: &str = "storage.json";

/// File permissions for the storage document (Unix only): owner read/write.
#[cfg(unix)]
const FILE_MODE: u32 = 0o600;

/// Directory permissions (Unix only): owner read/write/execute.
#[cfg(unix)]
const DIR_MODE: u32 = 0o700;

/// File-based key/value storage.
///
/// Keeps every entry in one JSON object at `{dir}/storage.json`. Each write
/// rewrites the whole document through a temp file and a rename.
///
/// # Security
/// - File permissions are set to 0600 (owner read/write only) on Unix
/// - Parent directories are created with 0700 permissions
/// - Values are stored in plain text
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Create a new FileStore rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Get the directory holding the storage document.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the path of the storage document.
    pub fn path(&self) -> PathBuf {
        self.dir.join(STORE_FILE_NAME)
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let path = self.path();
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(StorageError::Io(format!(
                    "Failed to read storage file '{}': {}",
                    path.display(),
                    e
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            StorageError::Corrupt(format!(
                "Failed to parse storage file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        self.ensure_dir()?;

        let path = self.path();
        let content = serde_json::to_string_pretty(map)
            .map_err(|e| StorageError::Io(format!("Failed to serialize storage: {}", e)))?;

        let temp_path = path.with_extension("tmp");

        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(FILE_MODE)
                .open(&temp_path)
                .map_err(|e| {
                    StorageError::Io(format!(
                        "Failed to create temp file '{}': {}",
                        temp_path.display(),
                        e
                    ))
                })?;
            file.write_all(content.as_bytes()).map_err(|e| {
                StorageError::Io(format!(
                    "Failed to write temp file '{}': {}",
                    temp_path.display(),
                    e
                ))
            })?;
            file.sync_all().map_err(|e| {
                StorageError::Io(format!(
                    "Failed to sync temp file '{}': {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        #[cfg(not(unix))]
        {
            std::fs::write(&temp_path, &content).map_err(|e| {
                StorageError::Io(format!(
                    "Failed to write temp file '{}': {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if let Err(e) = std::fs::rename(&temp_path, &path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(StorageError::Io(format!(
                "Failed to rename '{}' to '{}': {}",
                temp_path.display(),
                path.display(),
                e
            )));
        }

        Ok(())
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        if self.dir.exists() {
            return Ok(());
        }

        std::fs::create_dir_all(&self.dir).map_err(|e| {
            StorageError::Io(format!(
                "Failed to create storage directory '{}': {}",
                self.dir.display(),
                e
            ))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(DIR_MODE);
            std::fs::set_permissions(&self.dir, perms).map_err(|e| {
                StorageError::Io(format!(
                    "Failed to set directory permissions on '{}': {}",
                    self.dir.display(),
                    e
                ))
            })?;
        }

        Ok(())
    }

    fn modify<R>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, String>) -> R,
    ) -> Result<R, StorageError> {
        let _guard = self.write_lock.lock().expect("lock poisoned");
        let mut map = self.read_map()?;
        let result = f(&mut map);
        self.write_map(&map)?;
        Ok(result)
    }
}

impl KeyValueStore for FileStore {
    #[instrument(skip(self))]
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_map()?.remove(key))
    }

    #[instrument(skip(self, value))]
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.modify(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    #[instrument(skip(self))]
    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if !self.path().exists() {
            return Ok(());
        }
        self.modify(|map| {
            map.remove(key);
        })
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.read_map()?.into_keys().collect())
    }

    fn take(&self, key: &str) -> Result<Option<String>, StorageError> {
        if !self.path().exists() {
            return Ok(None);
        }
        self.modify(|map| map.remove(key))
    }

    fn name(&self) -> &str {
        "file"
    }
}
