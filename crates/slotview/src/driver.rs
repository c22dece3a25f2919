//! Driver: the one task that owns the [Engine].
//!
//! Three sources feed it: the poll timer (head pull + node poll), the push stream, and
//! presentation commands (reveal/load-more, inspection, filter). Pulls run as concurrent
//! futures; each completion is applied in a single engine call, so handlers interleave
//! only between whole batches.

use crate::config::ExplorerConfig;
use crate::engine::{Engine, ExplorerView};
use crate::entry::{Entry, Node};
use crate::pagination::{MoreAction, PullKind};
use crate::source::{LedgerSource, Page, SourceError};
use crate::stream::StreamEvent;
use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};

/// Requests from the presentation side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// The rendered list's tail became visible.
    RequestMore,
    Select(String),
    SelectParent,
    ClearSelection,
    SetShowSkipped(bool),
}

enum Pull {
    Page {
        kind: PullKind,
        result: Result<Page, SourceError>,
    },
    Nodes(Result<Vec<Node>, SourceError>),
    Detail {
        hash: String,
        result: Result<Option<Entry>, SourceError>,
    },
}

/// Cloneable handle for the presentation side.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<Arc<ExplorerView>>,
}

impl DriverHandle {
    pub async fn send(&self, command: Command) -> bool {
        self.commands.send(command).await.is_ok()
    }

    pub async fn request_more(&self) -> bool {
        self.send(Command::RequestMore).await
    }

    pub fn view(&self) -> Arc<ExplorerView> {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ExplorerView>> {
        self.view.clone()
    }
}

pub struct Driver<S> {
    engine: Engine,
    source: Arc<S>,
    config: ExplorerConfig,
    commands: mpsc::Receiver<Command>,
    nodes_in_flight: bool,
}

impl<S: LedgerSource> Driver<S> {
    pub fn new(config: ExplorerConfig, source: S) -> (Self, DriverHandle) {
        let engine = Engine::new(&config);
        let (tx, rx) = mpsc::channel(64);
        let handle = DriverHandle {
            commands: tx,
            view: engine.subscribe(),
        };
        let driver = Self {
            engine,
            source: Arc::new(source),
            config,
            commands: rx,
            nodes_in_flight: false,
        };
        (driver, handle)
    }

    /// Run until every [DriverHandle] is dropped; returns the engine for inspection.
    pub async fn run(mut self, mut stream_rx: mpsc::Receiver<StreamEvent>) -> Engine {
        let mut poll = interval(self.config.poll_interval());
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut sweep = interval(self.config.sweep_interval());
        sweep.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut pulls: FuturesUnordered<BoxFuture<'static, Pull>> = FuturesUnordered::new();
        let mut stream_open = true;

        loop {
            tokio::select! {
                _ = poll.tick() => {
                    if !self.engine.pagination().loading() {
                        pulls.push(self.head_pull());
                    }
                    if !self.nodes_in_flight {
                        pulls.push(self.nodes_pull());
                    }
                }
                Some(done) = pulls.next(), if !pulls.is_empty() => self.settle(done),
                event = stream_rx.recv(), if stream_open => match event {
                    Some(event) => self.on_stream(event),
                    None => {
                        tracing::debug!("push stream channel closed");
                        stream_open = false;
                    }
                },
                command = self.commands.recv() => match command {
                    Some(command) => {
                        if let Some(pull) = self.on_command(command) {
                            pulls.push(pull);
                        }
                    }
                    None => break,
                },
                _ = sweep.tick() => {
                    self.engine.sweep();
                }
            }
        }
        self.engine
    }

    fn head_pull(&mut self) -> BoxFuture<'static, Pull> {
        self.engine.begin_head_pull();
        self.page_pull(PullKind::Head, 0, self.engine.pagination().page_size())
    }

    fn page_pull(&self, kind: PullKind, offset: usize, limit: usize) -> BoxFuture<'static, Pull> {
        let source = Arc::clone(&self.source);
        async move {
            let result = source.fetch_page(offset, limit).await;
            Pull::Page { kind, result }
        }
        .boxed()
    }

    fn nodes_pull(&mut self) -> BoxFuture<'static, Pull> {
        self.nodes_in_flight = true;
        self.engine.begin_nodes_pull();
        let source = Arc::clone(&self.source);
        async move { Pull::Nodes(source.fetch_nodes().await) }.boxed()
    }

    fn detail_pull(&self, hash: String) -> BoxFuture<'static, Pull> {
        let source = Arc::clone(&self.source);
        async move {
            let result = source.fetch_entry_detail(&hash).await;
            Pull::Detail { hash, result }
        }
        .boxed()
    }

    fn settle(&mut self, done: Pull) {
        match done {
            Pull::Page { kind, result } => {
                self.engine.apply_page(kind, result);
            }
            Pull::Nodes(result) => {
                self.nodes_in_flight = false;
                self.engine.replace_nodes(result);
            }
            Pull::Detail { hash, result } => self.engine.settle_detail(&hash, result),
        }
    }

    fn on_stream(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Connected => self.engine.set_stream_connected(true),
            StreamEvent::Disconnected => self.engine.set_stream_connected(false),
            StreamEvent::Message(message) => self.engine.apply_push(message),
        }
    }

    fn on_command(&mut self, command: Command) -> Option<BoxFuture<'static, Pull>> {
        match command {
            Command::RequestMore => match self.engine.request_more() {
                MoreAction::Fetch { offset, limit } => {
                    Some(self.page_pull(PullKind::LoadMore, offset, limit))
                }
                _ => None,
            },
            Command::Select(hash) => {
                let hash = self.engine.select(hash);
                Some(self.detail_pull(hash))
            }
            Command::SelectParent => {
                let hash = self.engine.select_parent()?;
                Some(self.detail_pull(hash))
            }
            Command::ClearSelection => {
                self.engine.clear_selection();
                None
            }
            Command::SetShowSkipped(show) => {
                self.engine.set_show_skipped(show);
                None
            }
        }
    }
}
