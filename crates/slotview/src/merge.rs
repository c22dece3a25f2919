//! Snapshot merger: folds a pulled page of entries into the store.
//!
//! - first page ever: bulk insert, low-water mark = lowest slot in the page
//! - head pages: every entry goes through the precedence check; absence is
//!   never treated as deletion
//! - load-more pages: already-known slots are dropped before insertion and
//!   the low-water mark moves down to the lowest newly added slot

use crate::cursor::Cursor;
use crate::delta::apply_delta;
use crate::entry::Entry;
use crate::finality::{FinalityTracker, FinalizationEvent};
use crate::pagination::PullKind;
use crate::store::EntryStore;
use tokio::time::Instant;

/// How a page relates to what is already held locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    First,
    Head,
    LoadMore,
}

/// Counts and side effects of one merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub applied: usize,
    pub rejected: usize,
    /// Load-more entries dropped because the slot was already known.
    pub already_known: usize,
    pub events: Vec<FinalizationEvent>,
}

/// Tracks whether the first page has been seen.
#[derive(Debug, Clone, Default)]
pub struct SnapshotMerger {
    first_seen: bool,
}

impl SnapshotMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first_seen(&self) -> bool {
        self.first_seen
    }

    /// Classify a page by the request it answers. Only a head pull can be the first page.
    pub fn kind_for(&self, pull: PullKind) -> SnapshotKind {
        match (pull, self.first_seen) {
            (PullKind::Head, false) => SnapshotKind::First,
            (PullKind::Head, true) => SnapshotKind::Head,
            (PullKind::LoadMore, _) => SnapshotKind::LoadMore,
        }
    }

    pub fn merge(
        &mut self,
        store: &mut EntryStore,
        tracker: &mut FinalityTracker,
        cursor: &mut Cursor,
        page: Vec<Entry>,
        pull: PullKind,
        now: Instant,
    ) -> MergeReport {
        let kind = self.kind_for(pull);
        let report = match kind {
            SnapshotKind::First => merge_first(store, tracker, cursor, page, now),
            SnapshotKind::Head => merge_head(store, tracker, page, now),
            SnapshotKind::LoadMore => merge_load_more(store, tracker, cursor, page, now),
        };
        if kind == SnapshotKind::First {
            self.first_seen = true;
            tracing::info!(
                count = report.applied,
                low_water_mark = ?cursor.low_water_mark,
                "first snapshot loaded"
            );
        } else {
            tracing::debug!(
                ?kind,
                applied = report.applied,
                rejected = report.rejected,
                already_known = report.already_known,
                "snapshot merged"
            );
        }
        report
    }
}

fn merge_first(
    store: &mut EntryStore,
    tracker: &mut FinalityTracker,
    cursor: &mut Cursor,
    page: Vec<Entry>,
    now: Instant,
) -> MergeReport {
    if let Some(lowest) = page.iter().map(|e| e.slot).min() {
        cursor.lower_to(lowest);
    }
    // Pushed updates may have landed before the first pull completed; only an empty
    // store can skip the precedence check.
    if !store.is_empty() {
        return merge_head(store, tracker, page, now);
    }
    let mut report = MergeReport::default();
    for entry in page {
        tracker.offer(&entry);
        store.insert_unchecked(entry);
    }
    report.applied = store.len();
    report
}

fn merge_head(
    store: &mut EntryStore,
    tracker: &mut FinalityTracker,
    page: Vec<Entry>,
    now: Instant,
) -> MergeReport {
    let mut report = MergeReport::default();
    for entry in page {
        let out = apply_delta(store, tracker, entry, now);
        if out.upsert.is_applied() {
            report.applied += 1;
        } else {
            report.rejected += 1;
        }
        report.events.extend(out.observation.event);
    }
    report
}

fn merge_load_more(
    store: &mut EntryStore,
    tracker: &mut FinalityTracker,
    cursor: &mut Cursor,
    page: Vec<Entry>,
    now: Instant,
) -> MergeReport {
    let mut report = MergeReport::default();
    let (known, fresh): (Vec<Entry>, Vec<Entry>) =
        page.into_iter().partition(|e| store.contains(e.slot));
    report.already_known = known.len();
    if let Some(lowest) = fresh.iter().map(|e| e.slot).min() {
        cursor.lower_to(lowest);
    }
    for entry in fresh {
        let out = apply_delta(store, tracker, entry, now);
        if out.upsert.is_applied() {
            report.applied += 1;
        } else {
            report.rejected += 1;
        }
    }
    report
}
