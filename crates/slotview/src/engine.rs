//! Engine: single owner of the entry store, node set, and derived state.
//!
//! Every handler runs to completion under `&mut self` and then publishes one immutable
//! [ExplorerView] through a `watch` channel, so readers only ever see whole batches.

use crate::config::ExplorerConfig;
use crate::cursor::Cursor;
use crate::delta::{self, DeltaOutcome};
use crate::entry::{Entry, NetworkStats, Node, PushMessage};
use crate::finality::{FinalityTracker, FinalizationEvent};
use crate::merge::{MergeReport, SnapshotMerger};
use crate::pagination::{MoreAction, Pagination, PullKind};
use crate::source::{Page, SourceError};
use crate::store::EntryStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;

/// Detail-inspection state for one selected entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inspection {
    pub hash: Option<String>,
    pub detail: Option<Entry>,
    pub loading: bool,
}

/// Read-only snapshot handed to the presentation side.
#[derive(Debug, Clone)]
pub struct ExplorerView {
    pub version: u64,
    /// All entries, slot descending.
    pub entries: Vec<Entry>,
    pub show_skipped: bool,
    pub display_count: usize,
    pub has_more_remote: bool,
    pub loading: bool,
    pub loading_more: bool,
    pub initial_load_complete: bool,
    pub low_water_mark: Option<u64>,
    pub highest_finalized_slot: Option<u64>,
    pub current_producer: Option<u32>,
    pub finalization_events: Vec<FinalizationEvent>,
    /// Produced entries not yet finalized.
    pub non_finalized_slots: BTreeSet<u64>,
    pub nodes: Vec<Node>,
    pub nodes_loading: bool,
    pub network_stats: Option<NetworkStats>,
    pub stream_connected: bool,
    pub inspection: Inspection,
}

impl ExplorerView {
    /// Entries that pass the skipped-slot filter.
    pub fn visible(&self) -> impl Iterator<Item = &Entry> {
        let show_skipped = self.show_skipped;
        self.entries
            .iter()
            .filter(move |e| show_skipped || e.is_produced())
    }

    /// The materialized window: first `display_count` visible entries.
    pub fn displayed(&self) -> Vec<&Entry> {
        self.visible().take(self.display_count).collect()
    }

    /// True if the list tail should show a "load more" sentinel.
    pub fn can_show_more(&self) -> bool {
        self.display_count < self.visible().count() || self.has_more_remote
    }

    /// True for the produced entry holding the highest finalized slot.
    pub fn is_latest(&self, slot: u64) -> bool {
        self.highest_finalized_slot == Some(slot)
            && self
                .entries
                .iter()
                .any(|e| e.slot == slot && e.is_produced())
    }

    /// Producers with a live finalization highlight.
    pub fn highlighted_producers(&self) -> BTreeSet<u32> {
        self.finalization_events
            .iter()
            .filter_map(|ev| ev.producer_id)
            .collect()
    }
}

pub struct Engine {
    store: EntryStore,
    tracker: FinalityTracker,
    merger: SnapshotMerger,
    cursor: Cursor,
    pagination: Pagination,
    nodes: Vec<Node>,
    nodes_loading: bool,
    network_stats: Option<NetworkStats>,
    stream_connected: bool,
    show_skipped: bool,
    inspection: Inspection,
    version: u64,
    view_tx: watch::Sender<Arc<ExplorerView>>,
}

impl Engine {
    pub fn new(config: &ExplorerConfig) -> Self {
        let mut engine = Self {
            store: EntryStore::new(),
            tracker: FinalityTracker::new(config.highlight()),
            merger: SnapshotMerger::new(),
            cursor: Cursor::default(),
            pagination: Pagination::from_config(config),
            nodes: Vec::new(),
            nodes_loading: true,
            network_stats: None,
            stream_connected: false,
            show_skipped: false,
            inspection: Inspection::default(),
            version: 0,
            view_tx: watch::Sender::new(Arc::new(ExplorerView::empty())),
        };
        engine.publish();
        engine
    }

    /// Receive a fresh view after every handler.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ExplorerView>> {
        self.view_tx.subscribe()
    }

    /// Latest published view.
    pub fn view(&self) -> Arc<ExplorerView> {
        self.view_tx.borrow().clone()
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn tracker(&self) -> &FinalityTracker {
        &self.tracker
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Locally known entries that pass the visibility filter.
    pub fn visible_count(&self) -> usize {
        if self.show_skipped {
            self.store.len()
        } else {
            self.store.produced_count()
        }
    }

    pub fn begin_head_pull(&mut self) {
        self.pagination.begin_head();
        self.publish();
    }

    /// Fold the outcome of a `pull` into the engine and settle it. Failures leave the
    /// store untouched.
    pub fn apply_page(
        &mut self,
        pull: PullKind,
        result: Result<Page, SourceError>,
    ) -> Option<MergeReport> {
        self.apply_page_at(pull, result, Instant::now())
    }

    pub fn apply_page_at(
        &mut self,
        pull: PullKind,
        result: Result<Page, SourceError>,
        now: Instant,
    ) -> Option<MergeReport> {
        let (report, full_page) = match result {
            Ok(page) => {
                let full = page.is_full();
                let report = self.merger.merge(
                    &mut self.store,
                    &mut self.tracker,
                    &mut self.cursor,
                    page.entries,
                    pull,
                    now,
                );
                (Some(report), Some(full))
            }
            Err(e) => {
                tracing::warn!(reason = %e, ?pull, "pull failed, keeping last known state");
                (None, None)
            }
        };
        self.pagination.settle(pull, full_page);
        self.publish();
        report
    }

    pub fn apply_delta(&mut self, entry: Entry) -> DeltaOutcome {
        self.apply_delta_at(entry, Instant::now())
    }

    pub fn apply_delta_at(&mut self, entry: Entry, now: Instant) -> DeltaOutcome {
        let out = delta::apply_delta(&mut self.store, &mut self.tracker, entry, now);
        if out.upsert.is_applied() {
            self.publish();
        }
        out
    }

    /// Route one decoded push frame.
    pub fn apply_push(&mut self, message: PushMessage) {
        match message {
            PushMessage::UpdateSlot(entry) => {
                self.apply_delta(entry);
            }
            PushMessage::NetworkStats(stats) => self.record_network_stats(stats),
            PushMessage::Other(kind) => tracing::debug!(%kind, "ignoring push message"),
        }
    }

    pub fn record_network_stats(&mut self, stats: NetworkStats) {
        self.network_stats = Some(stats);
        self.publish();
    }

    pub fn set_stream_connected(&mut self, connected: bool) {
        if self.stream_connected != connected {
            self.stream_connected = connected;
            self.publish();
        }
    }

    pub fn begin_nodes_pull(&mut self) {
        self.nodes_loading = true;
    }

    /// Replace the node set wholesale. A failed poll keeps the previous set.
    pub fn replace_nodes(&mut self, result: Result<Vec<Node>, SourceError>) {
        match result {
            Ok(nodes) => self.nodes = nodes,
            Err(e) => tracing::warn!(reason = %e, "node poll failed"),
        }
        self.nodes_loading = false;
        self.publish();
    }

    pub fn request_more(&mut self) -> MoreAction {
        let visible = self.visible_count();
        let action = self.pagination.request_more(visible, self.store.len());
        if matches!(action, MoreAction::Reveal { .. } | MoreAction::Fetch { .. }) {
            self.publish();
        }
        action
    }

    pub fn set_show_skipped(&mut self, show: bool) {
        if self.show_skipped != show {
            self.show_skipped = show;
            self.publish();
        }
    }

    /// Select an entry for inspection. Returns the hash to fetch.
    pub fn select(&mut self, hash: impl Into<String>) -> String {
        let hash = hash.into();
        self.inspection = Inspection {
            hash: Some(hash.clone()),
            detail: None,
            loading: true,
        };
        self.publish();
        hash
    }

    /// Move the selection to the inspected entry's parent, if it has one.
    pub fn select_parent(&mut self) -> Option<String> {
        let parent = self
            .inspection
            .detail
            .as_ref()
            .and_then(|d| d.parent_hash.clone())?;
        Some(self.select(parent))
    }

    pub fn clear_selection(&mut self) {
        self.inspection = Inspection::default();
        self.publish();
    }

    /// Store a fetched detail if `hash` is still the selection; stale responses are dropped.
    pub fn settle_detail(&mut self, hash: &str, result: Result<Option<Entry>, SourceError>) {
        if self.inspection.hash.as_deref() != Some(hash) {
            tracing::debug!(hash, "dropping stale detail response");
            return;
        }
        match result {
            Ok(detail) => self.inspection.detail = detail,
            Err(e) => tracing::warn!(reason = %e, hash, "detail fetch failed"),
        }
        self.inspection.loading = false;
        self.publish();
    }

    /// Drop expired finalization events.
    pub fn sweep(&mut self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&mut self, now: Instant) -> usize {
        let removed = self.tracker.sweep(now);
        if removed > 0 {
            self.publish();
        }
        removed
    }

    fn publish(&mut self) {
        self.version += 1;
        let non_finalized_slots = self
            .store
            .iter_desc()
            .filter(|e| e.is_produced() && !e.is_finalized())
            .map(|e| e.slot)
            .collect();
        let view = ExplorerView {
            version: self.version,
            entries: self.store.view(),
            show_skipped: self.show_skipped,
            display_count: self.pagination.display_count(),
            has_more_remote: self.pagination.has_more_remote(),
            loading: self.pagination.loading(),
            loading_more: self.pagination.loading_more(),
            initial_load_complete: self.pagination.initial_load_complete(),
            low_water_mark: self.cursor.low_water_mark,
            highest_finalized_slot: self.tracker.highest_finalized_slot(),
            current_producer: self.tracker.current_producer(),
            finalization_events: self.tracker.events().cloned().collect(),
            non_finalized_slots,
            nodes: self.nodes.clone(),
            nodes_loading: self.nodes_loading,
            network_stats: self.network_stats.clone(),
            stream_connected: self.stream_connected,
            inspection: self.inspection.clone(),
        };
        self.view_tx.send_replace(Arc::new(view));
    }
}

impl ExplorerView {
    fn empty() -> Self {
        Self {
            version: 0,
            entries: Vec::new(),
            show_skipped: false,
            display_count: 0,
            has_more_remote: true,
            loading: false,
            loading_more: false,
            initial_load_complete: false,
            low_water_mark: None,
            highest_finalized_slot: None,
            current_producer: None,
            finalization_events: Vec::new(),
            non_finalized_slots: BTreeSet::new(),
            nodes: Vec::new(),
            nodes_loading: true,
            network_stats: None,
            stream_connected: false,
            inspection: Inspection::default(),
        }
    }
}
