//! Ledger explorer client runtime: reconciles pulled snapshots and pushed deltas into one
//! ordered, deduplicated, paginated view of slots.
//!
//! - **EntryStore**: one entry per slot, status-precedence upserts, slot-descending view.
//! - **SnapshotMerger** / **apply_delta**: the two write paths into the store; both are
//!   idempotent and commutative, so the poll loop can back-stop the push stream.
//! - **FinalityTracker**: highest finalized slot, its producer, and expiring
//!   "just finalized" events.
//! - **Pagination**: reveals local entries before asking the pull source for more.
//! - **Engine** / **Driver**: single owner of all state, fed by a poll timer
//!   ([HttpSource]), the push stream ([PushStream]), and presentation [Command]s.

pub mod config;
pub mod cursor;
pub mod delta;
pub mod driver;
pub mod engine;
pub mod entry;
pub mod finality;
pub mod merge;
pub mod pagination;
pub mod source;
pub mod store;
pub mod stream;

pub use config::{ConfigError, ExplorerConfig, ReconnectionConfig};
pub use cursor::Cursor;
pub use delta::{apply_delta, DeltaOutcome};
pub use driver::{Command, Driver, DriverHandle};
pub use engine::{Engine, ExplorerView, Inspection};
pub use entry::{
    decode_push_message, Entry, EntryKind, EntryStatus, MessageError, NetworkStats, Node,
    PushMessage,
};
pub use finality::{FinalityTracker, FinalizationEvent, Observation};
pub use merge::{MergeReport, SnapshotKind, SnapshotMerger};
pub use pagination::{MoreAction, Pagination, PullKind};
pub use source::{HttpSource, LedgerSource, Page, SourceError};
pub use store::{EntryStore, Upsert};
pub use stream::{PushStream, StreamEvent};
