//! History ledger
//!
//! Ordered, capacity-bounded record of past analyses, newest first. No two
//! entries share a (package name, version name) identity. Every mutation
//! writes the full ledger through the persistence adapter.

use crate::persistence::{Committed, PersistenceAdapter};
use crate::types::{AnalysisResult, FileOrigin, HistoryEntry, PackageIdentity};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Number of entries kept unless configured otherwise
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

pub struct HistoryLedger {
    entries: Vec<HistoryEntry>,
    capacity: usize,
    persistence: PersistenceAdapter,
}

impl HistoryLedger {
    /// Create an empty ledger. A capacity of zero is treated as one.
    pub fn new(persistence: PersistenceAdapter, capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
            persistence,
        }
    }

    /// Create a ledger seeded from persisted state.
    ///
    /// Entries with inconsistent permission data, repeated identities and
    /// anything beyond capacity are dropped; the newest copy wins.
    pub fn restore(persistence: PersistenceAdapter, capacity: usize) -> Self {
        let mut ledger = Self::new(persistence, capacity);
        let stored = ledger.persistence.load_history();
        let stored_len = stored.len();

        let mut seen = HashSet::new();
        for entry in stored {
            if ledger.entries.len() == ledger.capacity {
                break;
            }
            if !entry.result.is_consistent() {
                warn!("Dropping history entry {} with inconsistent permission data", entry.id);
                continue;
            }
            if seen.insert(entry.identity()) {
                ledger.entries.push(entry);
            }
        }

        if ledger.entries.len() != stored_len {
            debug!(
                "Restored {} of {} stored history entries",
                ledger.entries.len(),
                stored_len
            );
        }
        ledger
    }

    /// Record a successful analysis at the front of the ledger
    pub fn upsert(&mut self, result: AnalysisResult, origin: Option<FileOrigin>) -> Committed<HistoryEntry> {
        self.upsert_at(result, origin, Utc::now())
    }

    /// Record a successful analysis captured at `analyzed_at`.
    ///
    /// An existing entry with the same identity is removed from its position
    /// and the new entry goes to the front. The tail is evicted past capacity.
    pub fn upsert_at(
        &mut self,
        result: AnalysisResult,
        origin: Option<FileOrigin>,
        analyzed_at: DateTime<Utc>,
    ) -> Committed<HistoryEntry> {
        let identity = result.identity();

        if let Some(index) = self.position_of(&identity) {
            let replaced = self.entries.remove(index);
            debug!("Replacing history entry {} for {}", replaced.id, identity);
        }

        let entry = HistoryEntry::new(result, origin, analyzed_at);
        self.entries.insert(0, entry.clone());

        if self.entries.len() > self.capacity {
            for evicted in self.entries.drain(self.capacity..) {
                debug!("Evicting history entry {} for {}", evicted.id, evicted.identity());
            }
        }

        Committed::new(entry, self.persist())
    }

    /// Remove the entry with generated identifier `id`
    pub fn remove(&mut self, id: &str) -> Committed<bool> {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        let removed = self.entries.len() != before;
        if removed {
            debug!("Removed history entry {}", id);
        }
        Committed::new(removed, self.persist())
    }

    /// Remove every entry
    pub fn clear(&mut self) -> Committed<()> {
        self.entries.clear();
        debug!("Cleared history");
        Committed::new((), self.persist())
    }

    /// Look up an entry by generated identifier
    pub fn find(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Position of the entry with the given identity
    pub fn position_of(&self, identity: &PackageIdentity) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.identity() == identity)
    }

    /// Entries, newest first
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn persist(&self) -> crate::error::Result<()> {
        let persisted = self.persistence.save_history(&self.entries);
        if let Err(ref e) = persisted {
            warn!("History not persisted: {}", e);
        }
        persisted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::testing::ReadOnlyStore;
    use crate::persistence::{KeyValueStore, MemoryStore, Slot};
    use crate::types::fixtures;
    use std::sync::Arc;

    fn ledger() -> HistoryLedger {
        HistoryLedger::new(PersistenceAdapter::in_memory(), DEFAULT_HISTORY_CAPACITY)
    }

    fn identities(ledger: &HistoryLedger) -> Vec<String> {
        ledger.entries().iter().map(|e| e.identity().to_string()).collect()
    }

    #[test]
    fn test_duplicate_identity_moves_to_front() {
        let mut ledger = ledger();

        ledger.upsert(fixtures::result("com.a", "1.0"), None).into_value();
        ledger.upsert(fixtures::result("com.b", "1.0"), None).into_value();
        let newest = ledger.upsert(fixtures::result("com.a", "1.0"), None).into_value();

        assert_eq!(identities(&ledger), ["com.a@1.0", "com.b@1.0"]);
        assert_eq!(ledger.entries()[0].id, newest.id);
    }

    #[test]
    fn test_same_identity_twice_keeps_length() {
        let mut ledger = ledger();
        ledger.upsert(fixtures::result("com.a", "1.0"), None).into_value();
        ledger.upsert(fixtures::result("com.a", "1.0"), None).into_value();
        assert_eq!(ledger.len(), 1);

        // A different version is a different identity
        ledger.upsert(fixtures::result("com.a", "1.1"), None).into_value();
        assert_eq!(identities(&ledger), ["com.a@1.1", "com.a@1.0"]);
    }

    #[test]
    fn test_eleventh_entry_evicts_oldest() {
        let mut ledger = ledger();
        for i in 0..11 {
            ledger
                .upsert(fixtures::result(&format!("com.app{}", i), "1.0"), None)
                .into_value();
        }

        assert_eq!(ledger.len(), 10);
        let expected: Vec<String> = (1..11).rev().map(|i| format!("com.app{}@1.0", i)).collect();
        assert_eq!(identities(&ledger), expected);
        assert!(ledger
            .position_of(&fixtures::result("com.app0", "1.0").identity())
            .is_none());
    }

    #[test]
    fn test_reinserting_existing_identity_at_capacity_evicts_nothing() {
        let mut ledger = ledger();
        for i in 0..10 {
            ledger
                .upsert(fixtures::result(&format!("com.app{}", i), "1.0"), None)
                .into_value();
        }
        ledger.upsert(fixtures::result("com.app0", "1.0"), None).into_value();

        assert_eq!(ledger.len(), 10);
        assert_eq!(ledger.entries()[0].identity().package_name, "com.app0");
        assert_eq!(ledger.entries()[9].identity().package_name, "com.app1");
    }

    #[test]
    fn test_remove_and_find() {
        let mut ledger = ledger();
        let a = ledger.upsert(fixtures::result("com.a", "1.0"), None).into_value();
        let b = ledger.upsert(fixtures::result("com.b", "1.0"), None).into_value();

        assert_eq!(ledger.find(&a.id).map(|e| e.identity()), Some(a.identity()));
        assert!(ledger.remove(&a.id).into_value());
        assert!(!ledger.remove(&a.id).into_value());
        assert!(ledger.find(&a.id).is_none());
        assert!(ledger.find(&b.id).is_some());
        assert!(ledger.find("missing").is_none());
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let adapter = PersistenceAdapter::in_memory();
        let mut ledger = HistoryLedger::new(adapter.clone(), DEFAULT_HISTORY_CAPACITY);

        let a = ledger.upsert(fixtures::result("com.a", "1.0"), None);
        assert!(a.persisted());
        ledger.upsert(fixtures::result("com.b", "1.0"), None).into_value();
        assert_eq!(adapter.load_history().len(), 2);

        ledger.remove(&a.value.id).into_value();
        assert_eq!(adapter.load_history().len(), 1);

        ledger.clear().into_value();
        assert!(adapter.load_history().is_empty());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_restore_round_trip() {
        let adapter = PersistenceAdapter::in_memory();
        let mut ledger = HistoryLedger::new(adapter.clone(), DEFAULT_HISTORY_CAPACITY);
        for i in 0..6 {
            ledger
                .upsert(fixtures::result(&format!("com.app{}", i), "2.0"), None)
                .into_value();
        }

        let restored = HistoryLedger::restore(adapter, DEFAULT_HISTORY_CAPACITY);
        assert_eq!(restored.entries(), ledger.entries());
    }

    #[test]
    fn test_restore_sanitizes_stored_entries() {
        let store = Arc::new(MemoryStore::new());
        let adapter = PersistenceAdapter::new(store.clone());

        let mut broken = HistoryEntry::new(fixtures::result("com.broken", "1.0"), None, Utc::now());
        broken.result.permission_stats.total = 99;
        let newer = HistoryEntry::new(fixtures::result("com.a", "1.0"), None, Utc::now());
        let older_dup = HistoryEntry::new(fixtures::result("com.a", "1.0"), None, Utc::now());
        let mut stored = vec![newer.clone(), broken, older_dup];
        stored.extend((0..12).map(|i| {
            HistoryEntry::new(fixtures::result(&format!("com.app{}", i), "1.0"), None, Utc::now())
        }));
        adapter.save_history(&stored).unwrap();

        let ledger = HistoryLedger::restore(adapter, DEFAULT_HISTORY_CAPACITY);
        assert_eq!(ledger.len(), 10);
        assert_eq!(ledger.entries()[0].id, newer.id);
        assert_eq!(ledger.entries()[1].identity().package_name, "com.app0");

        // Corrupt payload restores as empty
        store.write(Slot::History.key(), "garbage").unwrap();
        let ledger = HistoryLedger::restore(PersistenceAdapter::new(store), DEFAULT_HISTORY_CAPACITY);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_persist_failure_keeps_memory_state() {
        let adapter = PersistenceAdapter::new(Arc::new(ReadOnlyStore::default()));
        let mut ledger = HistoryLedger::new(adapter, DEFAULT_HISTORY_CAPACITY);

        let committed = ledger.upsert(fixtures::result("com.a", "1.0"), None);
        assert!(!committed.persisted());
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.find(&committed.value.id).map(|e| e.id.clone()), Some(committed.value.id.clone()));
    }
}
