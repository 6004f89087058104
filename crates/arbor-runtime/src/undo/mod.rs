#![forbid(unsafe_code)]

//! Snapshot-based undo/redo for live configuration trees.
//!
//! # Architecture
//!
//! ```text
//!  Document ──change──► ChangeRecorder ──snapshot──► HistoryStore
//!     ▲                      │ (skipped while guarded,      │
//!     │                      │  paused or empty)            │
//!     │                                                    ▼
//!     └──replace_content── Navigator ◄──undo/redo── UndoHistory
//!                             │
//!                             └── ViewStatePreserver (expand/select/refresh)
//! ```
//!
//! Every entry is a whole-document [`Snapshot`](arbor_core::Snapshot). The
//! store is linear: appending after an undo discards the redo branch.
//!
//! # Module Structure
//!
//! - [`store`]: bounded entry list and cursor
//! - [`guard`]: non-reentrant recorder guard
//! - [`recorder`]: change notifications to entries
//! - [`navigator`]: cursor movement and replay
//! - [`view_state`]: presentation state around replay
//! - [`history`]: the [`UndoHistory`] facade

pub mod entry;
pub mod guard;
pub mod history;
pub mod navigator;
pub mod recorder;
pub mod store;
pub mod view_state;

pub use entry::HistoryEntry;
pub use guard::{GuardToken, RecorderGuard};
pub use history::UndoHistory;
pub use navigator::StepOutcome;
pub use recorder::{RecordOutcome, SkipReason, label_for};
pub use store::{DEFAULT_CAPACITY, HistoryStore};
pub use view_state::{SharedViewProvider, ViewState, ViewStatePreserver, ViewStateProvider};
