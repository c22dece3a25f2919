//! Pagination controller: how much of the local view is materialized, and when to ask
//! the pull source for older entries.
//!
//! Revealing already-fetched entries never touches the network. Only when the visible
//! list is exhausted and the last page was full does it issue a load-more pull, at most
//! one at a time.

use crate::config::ExplorerConfig;

/// Which request a pulled page answers. Settled by kind, never inferred from the offset:
/// a load-more on an empty store also fetches offset 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullKind {
    Head,
    LoadMore,
}

/// What [Pagination::request_more] decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoreAction {
    /// `display_count` grew over entries already held locally.
    Reveal { display_count: usize },
    /// Pull `limit` entries at `offset`; call [Pagination::settle_load_more] when done.
    Fetch { offset: usize, limit: usize },
    /// A head or load-more pull is in flight; trigger ignored.
    Busy,
    /// Nothing left locally or remotely.
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct Pagination {
    display_count: usize,
    increment: usize,
    page_size: usize,
    has_more_remote: bool,
    load_more_in_flight: bool,
    head_in_flight: usize,
    initial_load_complete: bool,
}

impl Pagination {
    pub fn new(initial_display: usize, increment: usize, page_size: usize) -> Self {
        Self {
            display_count: initial_display,
            increment,
            page_size: page_size.max(1),
            has_more_remote: true,
            load_more_in_flight: false,
            head_in_flight: 0,
            initial_load_complete: false,
        }
    }

    pub fn from_config(config: &ExplorerConfig) -> Self {
        Self::new(config.initial_display, config.display_increment, config.page_size)
    }

    pub fn display_count(&self) -> usize {
        self.display_count
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn has_more_remote(&self) -> bool {
        self.has_more_remote
    }

    /// A head pull is in flight.
    pub fn loading(&self) -> bool {
        self.head_in_flight > 0
    }

    pub fn loading_more(&self) -> bool {
        self.load_more_in_flight
    }

    pub fn initial_load_complete(&self) -> bool {
        self.initial_load_complete
    }

    /// Called when the rendered tail becomes visible. `visible` is the number of locally
    /// known entries that pass the visibility filter; `known` is the raw store size and
    /// becomes the fetch offset.
    pub fn request_more(&mut self, visible: usize, known: usize) -> MoreAction {
        if self.loading() || self.load_more_in_flight {
            return MoreAction::Busy;
        }
        if self.display_count < visible {
            self.display_count = (self.display_count + self.increment).min(visible);
            tracing::debug!(display_count = self.display_count, "revealed local entries");
            return MoreAction::Reveal {
                display_count: self.display_count,
            };
        }
        if !self.has_more_remote {
            return MoreAction::Exhausted;
        }
        self.load_more_in_flight = true;
        tracing::debug!(offset = known, limit = self.page_size, "load-more requested");
        MoreAction::Fetch {
            offset: known,
            limit: self.page_size,
        }
    }

    /// A load-more pull settled. `full_page` is `None` on transport failure.
    pub fn settle_load_more(&mut self, full_page: Option<bool>) {
        self.load_more_in_flight = false;
        if let Some(full) = full_page {
            self.has_more_remote = full;
        }
        self.display_count += self.increment;
    }

    /// Settle whichever pull `kind` names.
    pub fn settle(&mut self, kind: PullKind, full_page: Option<bool>) {
        match kind {
            PullKind::Head => self.settle_head(full_page),
            PullKind::LoadMore => self.settle_load_more(full_page),
        }
    }

    pub fn begin_head(&mut self) {
        self.head_in_flight += 1;
    }

    /// A head pull settled. `full_page` is `None` on transport failure.
    pub fn settle_head(&mut self, full_page: Option<bool>) {
        self.head_in_flight = self.head_in_flight.saturating_sub(1);
        self.initial_load_complete = true;
        if let Some(full) = full_page {
            self.has_more_remote = full;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pagination() -> Pagination {
        Pagination::new(50, 20, 20)
    }

    #[test]
    fn reveal_clamps_to_visible() {
        let mut p = pagination();
        assert_eq!(p.request_more(60, 120), MoreAction::Reveal { display_count: 60 });
        assert_eq!(p.display_count(), 60);
    }

    #[test]
    fn exhausted_local_triggers_single_fetch() {
        let mut p = pagination();
        assert_eq!(p.request_more(50, 100), MoreAction::Fetch { offset: 100, limit: 20 });
        assert!(p.loading_more());
        assert_eq!(p.request_more(50, 100), MoreAction::Busy);
        p.settle_load_more(Some(true));
        assert!(!p.loading_more());
        assert_eq!(p.display_count(), 70);
        assert!(p.has_more_remote());
    }

    #[test]
    fn short_page_ends_remote_data() {
        let mut p = pagination();
        p.request_more(50, 50);
        p.settle_load_more(Some(false));
        assert!(!p.has_more_remote());
        assert_eq!(p.request_more(57, 57), MoreAction::Exhausted);
    }

    #[test]
    fn failed_fetch_keeps_remote_flag() {
        let mut p = pagination();
        p.request_more(50, 50);
        p.settle_load_more(None);
        assert!(p.has_more_remote());
        assert!(matches!(p.request_more(50, 50), MoreAction::Fetch { .. }));
    }

    #[test]
    fn trigger_waits_for_head_pull() {
        let mut p = pagination();
        p.begin_head();
        assert_eq!(p.request_more(80, 80), MoreAction::Busy);
        assert_eq!(p.display_count(), 50);
        p.settle(PullKind::Head, Some(true));
        assert_eq!(p.request_more(80, 80), MoreAction::Reveal { display_count: 70 });
    }

    #[test]
    fn load_more_at_offset_zero_settles_as_load_more() {
        let mut p = pagination();
        p.begin_head();
        assert_eq!(p.request_more(0, 0), MoreAction::Busy);
        p.settle(PullKind::Head, None);
        assert_eq!(p.request_more(0, 0), MoreAction::Fetch { offset: 0, limit: 20 });
        p.settle(PullKind::LoadMore, Some(true));
        assert!(!p.loading_more());
        assert!(!p.loading());
        assert!(matches!(p.request_more(20, 20), MoreAction::Fetch { offset: 20, .. }));
    }

    #[test]
    fn head_flags() {
        let mut p = pagination();
        assert!(!p.initial_load_complete());
        p.begin_head();
        p.begin_head();
        assert!(p.loading());
        p.settle_head(None);
        assert!(p.loading());
        assert!(p.initial_load_complete());
        p.settle_head(Some(false));
        assert!(!p.loading());
        assert!(!p.has_more_remote());
    }
}
