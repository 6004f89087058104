#![forbid(unsafe_code)]

//! The undo history as seen by callers.
//!
//! [`UndoHistory`] wires a [`HistoryStore`] to a live document: it records a
//! snapshot after every structural change and replays snapshots on undo and
//! redo. One instance serves one document; there is no global state.
//!
//! # Example
//!
//! ```
//! use arbor_core::{Document, NodeData};
//! use arbor_runtime::undo::UndoHistory;
//! use arbor_runtime::config::HistoryConfig;
//!
//! let doc = Document::new();
//! let history = UndoHistory::new(doc.clone(), HistoryConfig::default());
//!
//! let plan = doc.append_child(doc.root(), NodeData::new("Plan", "TestPlan")).unwrap();
//! doc.rename(plan, "Load test").unwrap();
//! assert_eq!(history.labels(), vec!["Add Plan", "Change Load test"]);
//!
//! assert!(history.undo().is_applied());
//! let plan = doc.children(doc.root())[0];
//! assert_eq!(doc.node(plan).unwrap().name(), "Plan");
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use arbor_core::DocumentModel;
use tracing::debug;

use super::entry::HistoryEntry;
use super::guard::RecorderGuard;
use super::navigator::{self, StepOutcome};
use super::recorder::{self, ChangeRecorder, RecordOutcome};
use super::store::HistoryStore;
use super::view_state::{SharedViewProvider, ViewStatePreserver};
use crate::config::HistoryConfig;

/// State shared between the facade and the document listener.
pub(crate) struct HistoryCore {
    pub(crate) store: RefCell<HistoryStore>,
    pub(crate) guard: RecorderGuard,
    pub(crate) recording: Cell<bool>,
    pub(crate) document: Rc<dyn DocumentModel>,
    pub(crate) view: ViewStatePreserver,
    pub(crate) recorder: ChangeRecorder,
    pub(crate) config: HistoryConfig,
}

/// Snapshot-based undo/redo for one document.
///
/// Dropping the history unsubscribes it from the document.
pub struct UndoHistory {
    core: Rc<HistoryCore>,
}

impl fmt::Debug for UndoHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoHistory")
            .field("store", &*self.core.store.borrow())
            .field("recording", &self.core.recording.get())
            .field("guard", &self.core.guard)
            .field("recorder", &self.core.recorder)
            .field("view", &self.core.view)
            .finish()
    }
}

impl UndoHistory {
    /// Attach a new history to `document`.
    ///
    /// Recording starts immediately; the current content is not captured
    /// until the first change (or an explicit [`record`](Self::record)).
    #[must_use]
    pub fn new(document: impl DocumentModel + 'static, config: HistoryConfig) -> Self {
        Self::with_shared(Rc::new(document), config)
    }

    /// Attach to a document already behind an `Rc`.
    #[must_use]
    pub fn with_shared(document: Rc<dyn DocumentModel>, config: HistoryConfig) -> Self {
        let core = Rc::new(HistoryCore {
            store: RefCell::new(HistoryStore::new(config.capacity)),
            guard: RecorderGuard::new(),
            recording: Cell::new(true),
            document,
            view: ViewStatePreserver::default(),
            recorder: ChangeRecorder::default(),
            config,
        });
        core.recorder.attach(&core);
        debug!(capacity = core.config.capacity, "undo history attached");
        Self { core }
    }

    /// Builder form of [`set_view_provider`](Self::set_view_provider).
    #[must_use]
    pub fn with_view_provider(self, provider: SharedViewProvider) -> Self {
        self.set_view_provider(Some(provider));
        self
    }

    /// Attach (or detach, with `None`) the presentation layer whose
    /// expansion and selection survive navigation.
    pub fn set_view_provider(&self, provider: Option<SharedViewProvider>) {
        self.core.view.set_provider(provider);
    }

    // ====================================================================
    // Recording
    // ====================================================================

    /// Capture the current document under `label`.
    pub fn record(&self, label: impl Into<String>) -> RecordOutcome {
        recorder::record(&self.core, label.into(), None)
    }

    /// Stop recording changes. Not nested: one resume undoes any number of
    /// pauses.
    pub fn pause_recording(&self) {
        self.core.recording.set(false);
    }

    /// Resume recording after [`pause_recording`](Self::pause_recording).
    pub fn resume_recording(&self) {
        self.core.recording.set(true);
    }

    /// Whether changes are currently recorded.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.core.recording.get()
    }

    /// Whether the history is subscribed to its document.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.core.recorder.is_attached()
    }

    // ====================================================================
    // Navigation
    // ====================================================================

    /// Step back one entry and replay it.
    pub fn undo(&self) -> StepOutcome {
        self.navigate(-1)
    }

    /// Step forward one entry and replay it.
    pub fn redo(&self) -> StepOutcome {
        self.navigate(1)
    }

    /// Move by `offset` entries (negative = back) and replay.
    pub fn navigate(&self, offset: isize) -> StepOutcome {
        navigator::step(&self.core, offset)
    }

    /// Whether [`undo`](Self::undo) would move.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.core.store.borrow().can_undo()
    }

    /// Whether [`redo`](Self::redo) would move.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.core.store.borrow().can_redo()
    }

    /// Forget every entry. Ignored while a replay is in progress.
    pub fn clear(&self) {
        if self.core.guard.is_active() {
            debug!("history is busy; clear ignored");
            return;
        }
        self.core.store.borrow_mut().clear();
        debug!("history cleared");
    }

    // ====================================================================
    // Queries
    // ====================================================================

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.core.store.borrow().len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.core.store.borrow().is_empty()
    }

    /// Maximum number of entries kept.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.core.store.borrow().capacity()
    }

    /// Cursor position; `None` before anything was recorded.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        self.core.store.borrow().position()
    }

    /// Label of the change an undo would revert.
    #[must_use]
    pub fn undo_label(&self) -> Option<String> {
        self.core.store.borrow().undo_label().map(str::to_string)
    }

    /// Label of the change a redo would reapply.
    #[must_use]
    pub fn redo_label(&self) -> Option<String> {
        self.core.store.borrow().redo_label().map(str::to_string)
    }

    /// Entry labels, oldest first.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.core.store.borrow().labels().map(str::to_string).collect()
    }

    /// Clone of the entry under the cursor.
    #[must_use]
    pub fn current(&self) -> Option<HistoryEntry> {
        self.core.store.borrow().current().cloned()
    }

    /// Configuration the history was built with.
    #[must_use]
    pub fn config(&self) -> &HistoryConfig {
        &self.core.config
    }
}
