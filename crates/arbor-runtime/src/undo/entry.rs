#![forbid(unsafe_code)]

//! History entries.

use std::fmt;

use arbor_core::{NodePath, Snapshot};

use super::view_state::ViewState;

/// One recorded document state.
///
/// Entries are immutable once appended. The sequence number is assigned by
/// the [`HistoryStore`](super::HistoryStore) and is never reused, even
/// across [`clear`](super::HistoryStore::clear).
#[derive(Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub(crate) seq: u64,
    label: String,
    snapshot: Snapshot,
    view_state: Option<ViewState>,
    origin: Option<NodePath>,
}

impl HistoryEntry {
    /// Create an entry for `snapshot`, described by `label`.
    #[must_use]
    pub fn new(label: impl Into<String>, snapshot: Snapshot) -> Self {
        Self {
            seq: 0,
            label: label.into(),
            snapshot,
            view_state: None,
            origin: None,
        }
    }

    /// Attach the presentation state captured alongside the snapshot.
    #[must_use]
    pub fn with_view_state(mut self, view_state: Option<ViewState>) -> Self {
        self.view_state = view_state;
        self
    }

    /// Record the node whose change triggered the capture.
    #[must_use]
    pub fn with_origin(mut self, origin: Option<NodePath>) -> Self {
        self.origin = origin;
        self
    }

    /// Sequence number assigned by the store; 0 until appended.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Description of the change that preceded the capture.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Document content at capture time.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Expansion and selection captured with the snapshot.
    #[must_use]
    pub fn view_state(&self) -> Option<&ViewState> {
        self.view_state.as_ref()
    }

    /// Path of the node whose change triggered the capture.
    #[must_use]
    pub fn origin(&self) -> Option<&NodePath> {
        self.origin.as_ref()
    }
}

impl fmt::Debug for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryEntry")
            .field("seq", &self.seq)
            .field("label", &self.label)
            .field("nodes", &self.snapshot.node_count())
            .field("view_state", &self.view_state.is_some())
            .field("origin", &self.origin)
            .finish()
    }
}
