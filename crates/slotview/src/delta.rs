//! Delta applier: folds one pushed entry update into the store and raises finality
//! transitions.
//!
//! The push stream is authoritative for existence, so unknown slots are inserted, not
//! ignored.

use crate::entry::Entry;
use crate::finality::{FinalityTracker, Observation};
use crate::store::{EntryStore, Upsert};
use tokio::time::Instant;

/// Result of applying one entry update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaOutcome {
    pub slot: u64,
    pub upsert: Upsert,
    /// The slot was not in the store before this update.
    pub inserted: bool,
    pub observation: Observation,
}

/// Apply a single update. The previous entry is captured before the upsert so a
/// non-finalized → finalized transition can be detected.
pub fn apply_delta(
    store: &mut EntryStore,
    tracker: &mut FinalityTracker,
    entry: Entry,
    now: Instant,
) -> DeltaOutcome {
    let slot = entry.slot;
    let previous = store.get(slot).cloned();
    let upsert = store.upsert(entry);
    let observation = match (upsert, store.get(slot)) {
        (Upsert::Applied, Some(current)) => tracker.observe(previous.as_ref(), current, now),
        _ => Observation::default(),
    };
    DeltaOutcome {
        slot,
        upsert,
        inserted: previous.is_none(),
        observation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EntryKind, EntryStatus};
    use crate::store::tests::{block, skip};
    use tokio::time::Duration;

    fn fixtures() -> (EntryStore, FinalityTracker) {
        (EntryStore::new(), FinalityTracker::new(Duration::from_secs(2)))
    }

    #[test]
    fn unknown_slot_is_inserted_without_event() {
        let (mut store, mut tracker) = fixtures();
        let out = apply_delta(&mut store, &mut tracker, block(50, EntryStatus::Finalized), Instant::now());
        assert!(out.inserted);
        assert_eq!(out.upsert, Upsert::Applied);
        assert!(out.observation.event.is_none());
        assert_eq!(tracker.highest_finalized_slot(), Some(50));
        assert!(store.contains(50));
    }

    #[test]
    fn transition_emits_one_event() {
        let (mut store, mut tracker) = fixtures();
        let now = Instant::now();
        apply_delta(&mut store, &mut tracker, block(12, EntryStatus::Notarized), now);
        let out = apply_delta(&mut store, &mut tracker, block(12, EntryStatus::Finalized), now);
        assert_eq!(out.observation.event.map(|e| e.slot), Some(12));
        assert!(out.observation.advanced);

        let replay = apply_delta(&mut store, &mut tracker, block(12, EntryStatus::Finalized), now);
        assert_eq!(replay.upsert, Upsert::Rejected);
        assert!(replay.observation.event.is_none());
        assert_eq!(tracker.event_count(), 1);
    }

    #[test]
    fn stale_update_changes_nothing() {
        let (mut store, mut tracker) = fixtures();
        let now = Instant::now();
        apply_delta(&mut store, &mut tracker, block(30, EntryStatus::Finalized), now);
        let before = store.view();
        let out = apply_delta(&mut store, &mut tracker, block(30, EntryStatus::Proposed), now);
        assert_eq!(out.upsert, Upsert::Rejected);
        assert_eq!(store.view(), before);
    }

    #[test]
    fn late_skip_overrides_block_but_not_aggregate() {
        let (mut store, mut tracker) = fixtures();
        let now = Instant::now();
        apply_delta(&mut store, &mut tracker, block(40, EntryStatus::Finalized), now);
        let out = apply_delta(&mut store, &mut tracker, skip(40), now);
        assert_eq!(out.upsert, Upsert::Applied);
        assert_eq!(store.get(40).unwrap().kind, EntryKind::Skipped);
        assert_eq!(tracker.highest_finalized_slot(), Some(40));
    }
}
