#![forbid(unsafe_code)]

//! Bounded, cursor-based history of document snapshots.
//!
//! [`HistoryStore`] keeps entries oldest-first in a `VecDeque` together with
//! a cursor naming the entry that matches the live document. The cursor
//! starts on a sentinel ("before the first entry"), modelled as `None`.
//!
//! # Architecture
//!
//! ```text
//! append(A) append(B) append(C)
//! ┌──────────────────────────────┐
//! │ entries:  [A, B, C]          │
//! │ position:        ^ 2         │
//! └──────────────────────────────┘
//!
//! navigate(-2)
//! ┌──────────────────────────────┐
//! │ entries:  [A, B, C]          │
//! │ position:  ^ 0               │
//! └──────────────────────────────┘
//!
//! append(X) truncates the forward branch
//! ┌──────────────────────────────┐
//! │ entries:  [A, X]             │
//! │ position:     ^ 1            │
//! └──────────────────────────────┘
//! ```
//!
//! # Invariants
//!
//! 1. `position` is `None` or `Some(p)` with `p < len`.
//! 2. `len <= capacity` after every operation.
//! 3. Appending discards every entry after the cursor.
//! 4. Eviction drops the oldest entry and shifts the cursor down with it, so
//!    the cursor keeps naming the same entry (or the sentinel if that entry
//!    was the one evicted).
//! 5. The first entry is the baseline: undo is only possible from position 1
//!    or later.

use std::collections::VecDeque;
use std::fmt;

use tracing::debug;

use super::entry::HistoryEntry;

/// Default number of retained entries.
pub const DEFAULT_CAPACITY: usize = 25;

/// Capacity-bounded sequence of [`HistoryEntry`] plus a cursor.
pub struct HistoryStore {
    entries: VecDeque<HistoryEntry>,
    position: Option<usize>,
    capacity: usize,
    next_seq: u64,
}

impl fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryStore")
            .field("len", &self.entries.len())
            .field("position", &self.position)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl HistoryStore {
    /// Create an empty store retaining at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY * 4)),
            position: None,
            capacity,
            next_seq: 1,
        }
    }

    // ====================================================================
    // Core Operations
    // ====================================================================

    /// Append an entry after the cursor and return its sequence number.
    ///
    /// With zero capacity the entry is evicted immediately and the cursor
    /// stays on the sentinel.
    pub fn append(&mut self, mut entry: HistoryEntry) -> u64 {
        let next = self.position.map_or(0, |p| p + 1);
        let discarded = self.entries.len().saturating_sub(next);
        self.entries.truncate(next);

        let seq = self.next_seq;
        self.next_seq += 1;
        entry.seq = seq;
        self.entries.push_back(entry);
        self.position = Some(next);

        let evicted = self.enforce_capacity();
        debug!(
            seq,
            discarded,
            evicted,
            len = self.entries.len(),
            position = ?self.position,
            "history.append"
        );
        seq
    }

    /// Move the cursor by `offset` and return the entry it lands on.
    ///
    /// Refused (returns `None`, cursor untouched) when:
    /// - `offset < 0` and undo is unavailable,
    /// - `offset > 0` and redo is unavailable,
    /// - the target lies outside the stored entries.
    ///
    /// An `offset` of zero re-yields the current entry.
    pub fn navigate(&mut self, offset: isize) -> Option<&HistoryEntry> {
        let target = self.target(offset)?;
        self.position = Some(target);
        self.entries.get(target)
    }

    /// Whether [`navigate`](Self::navigate) would accept `offset`.
    #[must_use]
    pub fn can_navigate(&self, offset: isize) -> bool {
        self.target(offset).is_some()
    }

    /// Drop every entry and reset the cursor to the sentinel.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.position = None;
    }

    fn target(&self, offset: isize) -> Option<usize> {
        if (offset < 0 && !self.can_undo()) || (offset > 0 && !self.can_redo()) {
            return None;
        }
        let current = match self.position {
            Some(p) => isize::try_from(p).ok()?,
            None => -1,
        };
        let target = usize::try_from(current.checked_add(offset)?).ok()?;
        (target < self.entries.len()).then_some(target)
    }

    fn enforce_capacity(&mut self) -> usize {
        let mut evicted = 0;
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            self.position = self.position.and_then(|p| p.checked_sub(1));
            evicted += 1;
        }
        evicted
    }

    // ====================================================================
    // Queries
    // ====================================================================

    /// Whether an earlier state is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.position.is_some_and(|p| p > 0)
    }

    /// Whether a later state is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        match self.position {
            Some(p) => p + 1 < self.entries.len(),
            None => !self.entries.is_empty(),
        }
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries kept.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cursor position; `None` is the sentinel before the first entry.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Entry under the cursor.
    #[must_use]
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.position?)
    }

    /// Entry at `index`, oldest first.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Entry labels, oldest first.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(HistoryEntry::label)
    }

    /// Label of the change an undo would revert.
    #[must_use]
    pub fn undo_label(&self) -> Option<&str> {
        if self.can_undo() {
            self.current().map(HistoryEntry::label)
        } else {
            None
        }
    }

    /// Label of the change a redo would reapply.
    #[must_use]
    pub fn redo_label(&self) -> Option<&str> {
        if !self.can_redo() {
            return None;
        }
        let next = self.position.map_or(0, |p| p + 1);
        self.entries.get(next).map(HistoryEntry::label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::{Document, NodeData, Snapshot};

    fn entry(label: &str) -> HistoryEntry {
        HistoryEntry::new(label, Snapshot::default())
    }

    fn store_with(capacity: usize, labels: &[&str]) -> HistoryStore {
        let mut store = HistoryStore::new(capacity);
        for label in labels {
            store.append(entry(label));
        }
        store
    }

    fn labels(store: &HistoryStore) -> Vec<&str> {
        store.labels().collect()
    }

    #[test]
    fn new_store_is_at_sentinel() {
        let store = HistoryStore::default();
        assert!(store.is_empty());
        assert_eq!(store.position(), None);
        assert_eq!(store.capacity(), DEFAULT_CAPACITY);
        assert!(!store.can_undo());
        assert!(!store.can_redo());
        assert!(store.current().is_none());
    }

    #[test]
    fn first_entry_is_the_baseline() {
        let mut store = store_with(5, &["A"]);
        assert_eq!(store.position(), Some(0));
        assert!(!store.can_undo());
        assert!(store.navigate(-1).is_none());
        assert_eq!(store.position(), Some(0));
    }

    #[test]
    fn undo_and_redo_move_cursor() {
        let mut store = store_with(5, &["A", "B", "C"]);
        assert_eq!(store.navigate(-1).map(HistoryEntry::label), Some("B"));
        assert_eq!(store.navigate(-1).map(HistoryEntry::label), Some("A"));
        assert!(store.navigate(-1).is_none());
        assert!(store.can_redo());
        assert_eq!(store.navigate(1).map(HistoryEntry::label), Some("B"));
        assert_eq!(store.navigate(1).map(HistoryEntry::label), Some("C"));
        assert!(store.navigate(1).is_none());
    }

    #[test]
    fn append_after_undo_truncates_forward_branch() {
        let mut store = store_with(5, &["A", "B", "C"]);
        store.navigate(-2);
        store.append(entry("X"));
        assert_eq!(labels(&store), vec!["A", "X"]);
        assert_eq!(store.position(), Some(1));
        assert!(!store.can_redo());
        assert!(store.navigate(1).is_none());
    }

    #[test]
    fn eviction_keeps_cursor_on_same_entry() {
        let mut store = store_with(3, &["A", "B", "C", "D"]);
        assert_eq!(labels(&store), vec!["B", "C", "D"]);
        assert_eq!(store.position(), Some(2));
        assert_eq!(store.current().map(HistoryEntry::label), Some("D"));

        assert_eq!(store.navigate(-1).map(HistoryEntry::label), Some("C"));
        assert_eq!(store.navigate(-1).map(HistoryEntry::label), Some("B"));
        assert!(store.navigate(-1).is_none());
    }

    #[test]
    fn capacity_zero_stays_empty() {
        let mut store = HistoryStore::new(0);
        assert_eq!(store.append(entry("A")), 1);
        assert!(store.is_empty());
        assert_eq!(store.position(), None);
        assert!(!store.can_undo());
        assert!(!store.can_redo());
    }

    #[test]
    fn capacity_one_keeps_latest() {
        let store = store_with(1, &["A", "B"]);
        assert_eq!(labels(&store), vec!["B"]);
        assert_eq!(store.position(), Some(0));
        assert!(!store.can_undo());
    }

    #[test]
    fn multi_step_offsets_are_bounded() {
        let mut store = store_with(10, &["A", "B", "C", "D"]);
        assert!(store.navigate(-4).is_none());
        assert_eq!(store.position(), Some(3));
        assert_eq!(store.navigate(-3).map(HistoryEntry::label), Some("A"));
        assert!(store.navigate(4).is_none());
        assert_eq!(store.navigate(2).map(HistoryEntry::label), Some("C"));
        assert!(store.can_navigate(1));
        assert!(!store.can_navigate(2));
    }

    #[test]
    fn zero_offset_reloads_current() {
        let mut store = store_with(5, &["A", "B"]);
        assert_eq!(store.navigate(0).map(HistoryEntry::label), Some("B"));
        assert_eq!(store.position(), Some(1));
        assert!(HistoryStore::new(5).navigate(0).is_none());
    }

    #[test]
    fn sequence_numbers_survive_clear() {
        let mut store = HistoryStore::new(5);
        assert_eq!(store.append(entry("A")), 1);
        assert_eq!(store.append(entry("B")), 2);
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.position(), None);
        assert_eq!(store.append(entry("C")), 3);
        assert_eq!(store.current().map(HistoryEntry::seq), Some(3));
    }

    #[test]
    fn labels_for_undo_and_redo() {
        let mut store = store_with(5, &["Add Plan", "Add Group", "Remove Group"]);
        assert_eq!(store.undo_label(), Some("Remove Group"));
        assert_eq!(store.redo_label(), None);
        store.navigate(-2);
        assert_eq!(store.undo_label(), None);
        assert_eq!(store.redo_label(), Some("Add Group"));
    }

    #[test]
    fn entries_hold_independent_snapshots() {
        let doc = Document::new();
        let plan = doc
            .append_child(doc.root(), NodeData::new("Plan", "TestPlan"))
            .unwrap();
        let mut store = HistoryStore::new(5);
        store.append(HistoryEntry::new("Add Plan", doc.snapshot().unwrap()));
        doc.rename(plan, "Changed").unwrap();

        let kept = store.current().unwrap().snapshot();
        assert_eq!(kept.node(0).unwrap().data().name(), "Plan");
    }
}
