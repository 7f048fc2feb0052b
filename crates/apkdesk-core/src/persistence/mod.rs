//! Durable storage for the history ledger and the last analysis
//!
//! Two independent slots live in a string-keyed store. Loads never fail the
//! caller: a missing or undecodable payload reads as "no prior state".
//! Saves report failures but leave in-memory state alone.

mod backend;

pub use backend::{DiskStore, KeyValueStore, MemoryStore, NullStore};

use crate::config::StorageConfig;
use crate::error::{Result, StoreError};
use crate::types::{HistoryEntry, LastAnalysis};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Named storage slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Serialized history ledger
    History,
    /// Snapshot of the currently displayed analysis
    LastAnalysis,
}

impl Slot {
    /// Storage key for this slot
    pub fn key(&self) -> &'static str {
        match self {
            Slot::History => "apk-analyzer-history",
            Slot::LastAnalysis => "apk-analyzer-last-analysis",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::History => write!(f, "history"),
            Slot::LastAnalysis => write!(f, "last analysis"),
        }
    }
}

/// In-memory outcome of a mutation together with its persistence status.
///
/// The value is authoritative whether or not the write succeeded.
#[derive(Debug)]
#[must_use]
pub struct Committed<T> {
    pub value: T,
    pub persist_error: Option<StoreError>,
}

impl<T> Committed<T> {
    /// Pair `value` with the result of persisting it
    pub fn new(value: T, persisted: Result<()>) -> Self {
        Self {
            value,
            persist_error: persisted.err(),
        }
    }

    /// Whether the write reached durable storage
    pub fn persisted(&self) -> bool {
        self.persist_error.is_none()
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Committed<U> {
        Committed {
            value: f(self.value),
            persist_error: self.persist_error,
        }
    }
}

/// Typed access to the history and last-analysis slots
#[derive(Clone)]
pub struct PersistenceAdapter {
    store: Arc<dyn KeyValueStore>,
}

impl PersistenceAdapter {
    /// Create an adapter over any store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Adapter over a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Adapter that persists nothing
    pub fn disabled() -> Self {
        Self::new(Arc::new(NullStore))
    }

    /// Build the adapter described by `config`
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        if !config.enabled {
            debug!("Persistence disabled");
            return Ok(Self::disabled());
        }
        let store = DiskStore::new(config.directory.clone()).map_err(|e| {
            StoreError::Persistence(format!(
                "Failed to open storage at {}: {}",
                config.directory.display(),
                e
            ))
        })?;
        debug!("Persisting state in {}", config.directory.display());
        Ok(Self::new(Arc::new(store)))
    }

    /// Serialize `value` into `slot`
    pub fn save<T: Serialize + ?Sized>(&self, slot: Slot, value: &T) -> Result<()> {
        let content = serde_json::to_string(value)
            .map_err(|e| StoreError::Persistence(format!("Failed to encode {}: {}", slot, e)))?;
        self.store
            .write(slot.key(), &content)
            .map_err(|e| StoreError::Persistence(format!("Failed to save {}: {}", slot, e)))
    }

    /// Decode the value in `slot`, or `None` if absent or unreadable
    pub fn load<T: DeserializeOwned>(&self, slot: Slot) -> Option<T> {
        let content = match self.store.read(slot.key()) {
            Ok(Some(content)) => content,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read {}: {}", slot, e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding undecodable {}: {}", slot, e);
                None
            }
        }
    }

    /// Remove `slot`
    pub fn delete(&self, slot: Slot) -> Result<()> {
        self.store
            .remove(slot.key())
            .map_err(|e| StoreError::Persistence(format!("Failed to delete {}: {}", slot, e)))
    }

    pub fn save_history(&self, entries: &[HistoryEntry]) -> Result<()> {
        self.save(Slot::History, entries)
    }

    /// Load the persisted ledger, newest first. Empty when nothing usable is stored.
    pub fn load_history(&self) -> Vec<HistoryEntry> {
        self.load::<Vec<HistoryEntry>>(Slot::History)
            .unwrap_or_default()
    }

    pub fn save_last(&self, snapshot: &LastAnalysis) -> Result<()> {
        self.save(Slot::LastAnalysis, snapshot)
    }

    pub fn load_last(&self) -> Option<LastAnalysis> {
        self.load(Slot::LastAnalysis)
    }

    pub fn delete_last(&self) -> Result<()> {
        self.delete(Slot::LastAnalysis)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ReadOnlyStore;
    use super::*;
    use crate::types::fixtures;
    use crate::types::FileOrigin;
    use chrono::Utc;
    use tempfile::TempDir;

    fn entries(n: usize) -> Vec<HistoryEntry> {
        (0..n)
            .map(|i| HistoryEntry::new(fixtures::result(&format!("com.app{}", i), "1.0"), None, Utc::now()))
            .collect()
    }

    #[test]
    fn test_history_round_trip_keeps_order() {
        let dir = TempDir::new().unwrap();
        let config = StorageConfig {
            enabled: true,
            directory: dir.path().to_path_buf(),
        };
        let saved = entries(7);

        PersistenceAdapter::from_config(&config)
            .unwrap()
            .save_history(&saved)
            .unwrap();

        // Fresh adapter over the same directory, as after a restart
        let restored = PersistenceAdapter::from_config(&config).unwrap().load_history();
        assert_eq!(restored, saved);
    }

    #[test]
    fn test_last_analysis_slot_is_independent() {
        let adapter = PersistenceAdapter::in_memory();
        let result = fixtures::result("com.example", "1.0");
        let snapshot = LastAnalysis {
            origin: FileOrigin::synthesized(&result),
            result,
        };

        adapter.save_last(&snapshot).unwrap();
        adapter.save_history(&entries(2)).unwrap();
        adapter.delete_last().unwrap();

        assert_eq!(adapter.load_last(), None);
        assert_eq!(adapter.load_history().len(), 2);
    }

    #[test]
    fn test_undecodable_payload_reads_as_empty() {
        let store = Arc::new(MemoryStore::new());
        store.write(Slot::History.key(), "{not json").unwrap();
        store.write(Slot::LastAnalysis.key(), "[1, 2, 3]").unwrap();

        let adapter = PersistenceAdapter::new(store);
        assert!(adapter.load_history().is_empty());
        assert_eq!(adapter.load_last(), None);
    }

    #[test]
    fn test_save_failure_is_reported() {
        let adapter = PersistenceAdapter::new(Arc::new(ReadOnlyStore::default()));
        let err = adapter.save_history(&entries(1)).unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
        assert!(err.is_persistence());
        assert!(adapter.delete_last().is_err());
    }

    #[test]
    fn test_disabled_adapter_remembers_nothing() {
        let config = StorageConfig {
            enabled: false,
            directory: std::path::PathBuf::from("/nonexistent"),
        };
        let adapter = PersistenceAdapter::from_config(&config).unwrap();
        adapter.save_history(&entries(3)).unwrap();
        assert!(adapter.load_history().is_empty());
    }

    #[test]
    fn test_committed_carries_error() {
        let ok = Committed::new(3, Ok(()));
        assert!(ok.persisted());

        let failed = Committed::new(3, Err(StoreError::Persistence("quota".into()))).map(|v| v * 2);
        assert!(!failed.persisted());
        assert_eq!(failed.value, 6);
    }
}
