//! Entry and page builders shared by the integration test binaries, plus tracing setup.
//! Each binary uses a different subset.
#![allow(dead_code)]

use slotview::{Entry, EntryKind, EntryStatus, Page, SourceError};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("slotview=debug".parse().unwrap()))
        .with_test_writer()
        .try_init();
}

/// Produced entry with deterministic hash (`h{slot}`), producer, and parent link.
pub fn block(slot: u64, status: EntryStatus) -> Entry {
    Entry {
        kind: EntryKind::Produced,
        slot,
        hash: format!("h{}", slot),
        producer_id: Some((slot % 4) as u32),
        timestamp: slot * 400,
        proposed_at: Some(slot * 400),
        finalized_at: (status == EntryStatus::Finalized).then_some(slot * 400 + 200),
        parent_slot: slot.checked_sub(1),
        parent_hash: slot.checked_sub(1).map(|p| format!("h{}", p)),
        status,
    }
}

pub fn skip(slot: u64) -> Entry {
    Entry {
        kind: EntryKind::Skipped,
        slot,
        hash: format!("skip{}", slot),
        producer_id: None,
        timestamp: slot * 400,
        proposed_at: None,
        finalized_at: None,
        parent_slot: None,
        parent_hash: None,
        status: EntryStatus::Finalized,
    }
}

/// Slots `hi` down to `lo`, all with `status`.
pub fn blocks_desc(hi: u64, lo: u64, status: EntryStatus) -> Vec<Entry> {
    (lo..=hi).rev().map(|s| block(s, status)).collect()
}

pub fn page(entries: Vec<Entry>, limit: usize) -> Result<Page, SourceError> {
    Ok(Page { entries, limit })
}
