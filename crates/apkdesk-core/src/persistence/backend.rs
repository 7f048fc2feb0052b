//! Durable key-value store backends

use crate::error::{Result, StoreError};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// Trait for string-keyed durable storage
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Remove every key
    fn clear(&self) -> Result<()>;
}

/// Disk-based store, one JSON file per key
pub struct DiskStore {
    directory: PathBuf,
}

impl DiskStore {
    /// Create a new disk store rooted at `directory`
    pub fn new(directory: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&directory)?;
        Ok(Self { directory })
    }

    /// Storage directory
    pub fn directory(&self) -> &std::path::Path {
        &self.directory
    }

    fn key_to_path(&self, key: &str) -> PathBuf {
        let hash = blake3::hash(key.as_bytes());
        self.directory.join(format!("{}.json", hash.to_hex()))
    }
}

impl KeyValueStore for DiskStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.key_to_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        // Write beside the target and rename so readers never see a partial slot
        let mut staged = tempfile::NamedTempFile::new_in(&self.directory)?;
        staged.write_all(value.as_bytes())?;
        staged.as_file().sync_all()?;
        staged
            .persist(self.key_to_path(key))
            .map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.key_to_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> Result<()> {
        if self.directory.exists() {
            for entry in std::fs::read_dir(&self.directory)? {
                let entry = entry?;
                if entry.path().extension().map(|e| e == "json").unwrap_or(false) {
                    std::fs::remove_file(entry.path())?;
                }
            }
        }
        Ok(())
    }
}

/// In-memory store
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| StoreError::Persistence("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.values()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values()?.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.values()?.clear();
        Ok(())
    }
}

/// No-op store (persistence disabled)
pub struct NullStore;

impl KeyValueStore for NullStore {
    fn read(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn write(&self, _key: &str, _value: &str) -> Result<()> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        Ok(())
    }
}
