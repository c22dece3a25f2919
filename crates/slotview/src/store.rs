//! Entry store: at most one entry per slot, ordered by slot.
//!
//! Upserts follow status precedence: a kind change always replaces, otherwise the stored
//! entry only moves forward (higher status, or same status filling fields it lacks).
//! Fields already present never change at equal status.

use crate::entry::{Entry, EntryKind};
use std::collections::BTreeMap;

/// Outcome of [EntryStore::upsert].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Applied,
    Rejected,
}

impl Upsert {
    pub fn is_applied(self) -> bool {
        self == Upsert::Applied
    }
}

/// Keyed set of ledger entries.
#[derive(Debug, Clone, Default)]
pub struct EntryStore {
    entries: BTreeMap<u64, Entry>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, entry: Entry) -> Upsert {
        let Some(stored) = self.entries.get(&entry.slot) else {
            self.entries.insert(entry.slot, entry);
            return Upsert::Applied;
        };

        if stored.kind != entry.kind {
            tracing::debug!(slot = entry.slot, kind = ?entry.kind, "entry kind replaced");
            self.entries.insert(entry.slot, entry);
            return Upsert::Applied;
        }

        if entry.status < stored.status {
            tracing::debug!(
                slot = entry.slot,
                stored = ?stored.status,
                incoming = ?entry.status,
                "stale entry rejected"
            );
            return Upsert::Rejected;
        }

        // A higher status wins its fields; an equal one may only fill gaps.
        let merged = if entry.status > stored.status {
            let mut merged = entry;
            merged.absorb(stored);
            merged
        } else {
            let mut merged = stored.clone();
            merged.absorb(&entry);
            merged
        };
        if merged == *stored {
            return Upsert::Rejected;
        }
        self.entries.insert(merged.slot, merged);
        Upsert::Applied
    }

    /// Insert without the precedence check. Only meaningful on an empty store.
    pub(crate) fn insert_unchecked(&mut self, entry: Entry) {
        self.entries.insert(entry.slot, entry);
    }

    pub fn get(&self, slot: u64) -> Option<&Entry> {
        self.entries.get(&slot)
    }

    pub fn contains(&self, slot: u64) -> bool {
        self.entries.contains_key(&slot)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries by slot, descending.
    pub fn iter_desc(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values().rev()
    }

    /// Owned copy of the ordered view (slot descending).
    pub fn view(&self) -> Vec<Entry> {
        self.iter_desc().cloned().collect()
    }

    /// Number of entries that are not skips.
    pub fn produced_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.kind == EntryKind::Produced)
            .count()
    }

    pub fn lowest_slot(&self) -> Option<u64> {
        self.entries.keys().next().copied()
    }

    pub fn highest_slot(&self) -> Option<u64> {
        self.entries.keys().next_back().copied()
    }
}
