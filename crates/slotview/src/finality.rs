//! Finality tracking: highest finalized slot, its producer, and short-lived
//! "just finalized" events.
//!
//! The aggregate only ever moves up: a candidate replaces it iff its slot is strictly
//! greater, so late or duplicate finalizations can neither lower the slot nor flip the
//! producer. Events are created on a non-finalized → finalized transition and swept once
//! they are older than the highlight window.

use crate::entry::Entry;
use serde::Serialize;
use std::collections::VecDeque;
use tokio::time::{Duration, Instant};

/// One finalization transition, kept for the highlight window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalizationEvent {
    pub slot: u64,
    #[serde(rename = "producer")]
    pub producer_id: Option<u32>,
    #[serde(skip)]
    pub observed_at: Instant,
}

/// What [FinalityTracker::observe] did for one applied entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    pub event: Option<FinalizationEvent>,
    /// True if the entry became the new highest finalized slot.
    pub advanced: bool,
}

/// Derived finality state. Recomputed from applied entries, never set directly.
#[derive(Debug, Clone)]
pub struct FinalityTracker {
    highest_finalized_slot: Option<u64>,
    current_producer: Option<u32>,
    events: VecDeque<FinalizationEvent>,
    highlight: Duration,
}

impl FinalityTracker {
    pub fn new(highlight: Duration) -> Self {
        Self {
            highest_finalized_slot: None,
            current_producer: None,
            events: VecDeque::new(),
            highlight,
        }
    }

    pub fn highest_finalized_slot(&self) -> Option<u64> {
        self.highest_finalized_slot
    }

    pub fn current_producer(&self) -> Option<u32> {
        self.current_producer
    }

    /// Pending highlight events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &FinalizationEvent> {
        self.events.iter()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Offer a produced-finalized entry as the new aggregate. Ties never replace.
    pub fn offer(&mut self, entry: &Entry) -> bool {
        if !entry.is_finalized_block() {
            return false;
        }
        let wins = self
            .highest_finalized_slot
            .map(|h| entry.slot > h)
            .unwrap_or(true);
        if wins {
            tracing::info!(
                slot = entry.slot,
                producer = ?entry.producer_id,
                "highest finalized slot advanced"
            );
            self.highest_finalized_slot = Some(entry.slot);
            self.current_producer = entry.producer_id;
        }
        wins
    }

    /// Account for an entry that was just applied to the store. `previous` is what the
    /// store held for the slot before the upsert; `current` is what it holds now.
    pub fn observe(&mut self, previous: Option<&Entry>, current: &Entry, now: Instant) -> Observation {
        let transitioned = previous.map(|p| !p.is_finalized()).unwrap_or(false)
            && current.is_finalized_block();
        let event = transitioned.then(|| {
            let ev = FinalizationEvent {
                slot: current.slot,
                producer_id: current.producer_id,
                observed_at: now,
            };
            self.events.push_back(ev.clone());
            ev
        });
        let advanced = self.offer(current);
        Observation { event, advanced }
    }

    /// Drop events older than the highlight window. Returns how many were removed.
    pub fn sweep(&mut self, now: Instant) -> usize {
        let before = self.events.len();
        let highlight = self.highlight;
        self.events
            .retain(|ev| now.saturating_duration_since(ev.observed_at) < highlight);
        before - self.events.len()
    }
}
