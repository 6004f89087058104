#![forbid(unsafe_code)]

//! End-to-end tests for [`UndoHistory`] driving a live [`Document`].
//!
//! Validates:
//! - Recording from change notifications, with derived labels
//! - Undo/redo replay restoring exact content
//! - Forward-branch truncation and capacity eviction
//! - Guard, pause and empty-document eligibility rules
//! - View-state capture and restore around navigation
//! - Replay and capture failures reported without panics

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

use arbor_core::{
    Document, DocumentError, DocumentModel, NodeData, NodeId, NodePath, Snapshot, SnapshotError,
    Subscription, TreeEvent,
};
use arbor_runtime::config::HistoryConfig;
use arbor_runtime::undo::{
    RecordOutcome, SkipReason, StepOutcome, UndoHistory, ViewState, ViewStateProvider,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn history_with_capacity(capacity: usize) -> (Document, UndoHistory) {
    init_tracing();
    let doc = Document::new();
    let history = UndoHistory::new(doc.clone(), HistoryConfig::with_capacity(capacity));
    (doc, history)
}

fn add(doc: &Document, name: &str) -> NodeId {
    doc.append_child(doc.root(), NodeData::new(name, "Sampler"))
        .unwrap()
}

fn top_names(doc: &Document) -> Vec<String> {
    doc.children(doc.root())
        .into_iter()
        .filter_map(|id| doc.with_node(id, |n| n.name().to_string()))
        .collect()
}

// ============================================================================
// Recording
// ============================================================================

#[test]
fn mutations_are_recorded_with_labels() {
    let (doc, history) = history_with_capacity(25);
    let plan = add(&doc, "Plan");
    let group = doc
        .append_child(plan, NodeData::new("Users", "ThreadGroup"))
        .unwrap();
    doc.set_property(group, "threads", "10").unwrap();
    doc.remove(group).unwrap();
    doc.replace_content(&doc.snapshot().unwrap()).unwrap();

    assert_eq!(
        history.labels(),
        vec![
            "Add Plan",
            "Add Users",
            "Change Users",
            "Remove Users",
            "Complex Change"
        ]
    );
    assert_eq!(history.position(), Some(4));
    assert_eq!(history.current().unwrap().origin(), Some(&NodePath::root()));
}

#[test]
fn entries_record_origin_path() {
    let (doc, history) = history_with_capacity(25);
    let plan = add(&doc, "Plan");
    doc.append_child(plan, NodeData::new("Users", "ThreadGroup"))
        .unwrap();
    let entry = history.current().unwrap();
    assert_eq!(entry.origin(), Some(&NodePath::from_indices(vec![0, 0])));
    assert_eq!(entry.snapshot().node_count(), 2);
}

#[test]
fn can_undo_only_after_second_entry() {
    let (doc, history) = history_with_capacity(25);
    assert!(!history.can_undo());
    add(&doc, "A");
    assert!(!history.can_undo(), "first entry is the baseline");
    add(&doc, "B");
    add(&doc, "C");
    assert!(history.can_undo());

    history.undo();
    assert!(history.can_redo());
    history.undo();
    assert!(history.can_redo());
    assert!(!history.can_undo());
}

#[test]
fn explicit_record_captures_current_state() {
    let (doc, history) = history_with_capacity(25);
    history.pause_recording();
    add(&doc, "A");
    add(&doc, "B");
    history.resume_recording();

    let outcome = history.record("Loaded plan");
    assert_eq!(
        outcome,
        RecordOutcome::Recorded {
            seq: 1,
            position: Some(0)
        }
    );
    assert_eq!(history.current().unwrap().snapshot().node_count(), 2);
    assert!(history.current().unwrap().origin().is_none());
}

#[test]
fn empty_document_is_not_recorded() {
    let (doc, history) = history_with_capacity(25);
    assert_eq!(
        history.record("nothing"),
        RecordOutcome::Skipped(SkipReason::EmptyDocument)
    );
    let a = add(&doc, "A");
    doc.remove(a).unwrap();
    assert_eq!(history.labels(), vec!["Add A"]);
}

#[test]
fn pause_and_resume_do_not_nest() {
    let (doc, history) = history_with_capacity(25);
    add(&doc, "A");
    history.pause_recording();
    history.pause_recording();
    add(&doc, "B");
    doc.rename(doc.children(doc.root())[0], "A2").unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(
        history.record("manual"),
        RecordOutcome::Skipped(SkipReason::Paused)
    );

    history.resume_recording();
    assert!(history.is_recording());
    assert_eq!(history.len(), 1);
    add(&doc, "C");
    assert_eq!(history.len(), 2);
}

// ============================================================================
// Navigation
// ============================================================================

#[test]
fn undo_then_redo_restores_content() {
    let (doc, history) = history_with_capacity(25);
    let plan = add(&doc, "Plan");
    doc.set_property(plan, "threads", "5").unwrap();
    let after = doc.snapshot().unwrap();

    let undone = history.undo();
    assert_eq!(
        undone,
        StepOutcome::Applied {
            label: "Add Plan".into(),
            position: 0
        }
    );
    let plan = doc.children(doc.root())[0];
    assert_eq!(
        doc.with_node(plan, |n| n.property("threads").map(str::to_string)),
        Some(None)
    );

    assert!(history.redo().is_applied());
    assert_eq!(doc.snapshot().unwrap(), after);
    assert_eq!(history.len(), 2, "replay must not record");
}

#[test]
fn replay_keeps_recorder_attached() {
    let (doc, history) = history_with_capacity(25);
    add(&doc, "A");
    add(&doc, "B");
    assert!(history.is_attached());
    history.undo();
    assert!(history.is_attached());
    add(&doc, "C");
    assert_eq!(history.labels(), vec!["Add A", "Add C"]);
}

#[test]
fn capacity_three_evicts_oldest() {
    let (doc, history) = history_with_capacity(3);
    for name in ["A", "B", "C", "D"] {
        add(&doc, name);
    }
    assert_eq!(history.labels(), vec!["Add B", "Add C", "Add D"]);
    assert_eq!(history.position(), Some(2));

    assert_eq!(history.undo().label(), Some("Add C"));
    assert_eq!(top_names(&doc), vec!["A", "B", "C"]);
    assert_eq!(history.undo().label(), Some("Add B"));
    assert_eq!(top_names(&doc), vec!["A", "B"]);
    assert_eq!(history.undo(), StepOutcome::Refused);
    assert_eq!(top_names(&doc), vec!["A", "B"]);
}

#[test]
fn append_after_undo_discards_forward_branch() {
    let (doc, history) = history_with_capacity(25);
    add(&doc, "A");
    add(&doc, "B");
    add(&doc, "C");
    history.undo();
    history.undo();
    assert_eq!(history.position(), Some(0));

    add(&doc, "X");
    assert_eq!(history.labels(), vec!["Add A", "Add X"]);
    assert_eq!(history.redo(), StepOutcome::Refused);
    assert_eq!(top_names(&doc), vec!["A", "X"]);
}

#[test]
fn overflowing_capacity_keeps_exactly_capacity() {
    let (doc, history) = history_with_capacity(5);
    for i in 0..6 {
        add(&doc, &format!("n{i}"));
    }
    assert_eq!(history.len(), 5);
    assert_eq!(history.labels()[0], "Add n1");
}

#[test]
fn multi_step_navigation() {
    let (doc, history) = history_with_capacity(25);
    for name in ["A", "B", "C", "D"] {
        add(&doc, name);
    }
    assert_eq!(history.navigate(-4), StepOutcome::Refused);
    assert_eq!(history.navigate(-3).label(), Some("Add A"));
    assert_eq!(top_names(&doc), vec!["A"]);
    assert_eq!(history.navigate(2).label(), Some("Add C"));
    assert_eq!(top_names(&doc), vec!["A", "B", "C"]);
    assert_eq!(history.undo_label().as_deref(), Some("Add C"));
    assert_eq!(history.redo_label().as_deref(), Some("Add D"));
}

#[test]
fn zero_offset_reloads_current_entry() {
    let (doc, history) = history_with_capacity(25);
    add(&doc, "A");
    let a = doc.children(doc.root())[0];
    history.pause_recording();
    doc.rename(a, "edited").unwrap();
    history.resume_recording();

    assert!(history.navigate(0).is_applied());
    assert_eq!(top_names(&doc), vec!["A"]);
    assert_eq!(history.len(), 1);
}

#[test]
fn clear_resets_history() {
    let (doc, history) = history_with_capacity(25);
    add(&doc, "A");
    add(&doc, "B");
    history.clear();
    assert!(history.is_empty());
    assert_eq!(history.position(), None);
    assert!(!history.can_undo());
    assert!(!history.can_redo());
    assert_eq!(top_names(&doc), vec!["A", "B"]);

    add(&doc, "C");
    assert_eq!(history.len(), 1);
    assert_eq!(history.current().unwrap().seq(), 3);
}

#[test]
fn zero_capacity_records_nothing() {
    let (doc, history) = history_with_capacity(0);
    add(&doc, "A");
    assert!(history.is_empty());
    assert_eq!(history.position(), None);
    assert_eq!(history.undo(), StepOutcome::Refused);
    assert_eq!(history.redo(), StepOutcome::Refused);
}

#[test]
fn notifications_during_replay_are_guarded() {
    let (doc, history) = history_with_capacity(25);
    let history = Rc::new(history);
    add(&doc, "A");
    add(&doc, "B");

    let nested = Rc::new(RefCell::new(Vec::new()));
    let _sub = {
        let weak = Rc::downgrade(&history);
        let nested = Rc::clone(&nested);
        doc.subscribe(move |_| {
            if let Some(history) = weak.upgrade() {
                nested.borrow_mut().push(history.record("nested"));
            }
        })
    };

    assert!(history.undo().is_applied());
    assert_eq!(
        *nested.borrow(),
        vec![RecordOutcome::Skipped(SkipReason::Guarded)]
    );
    assert_eq!(history.len(), 2);
    assert_eq!(history.position(), Some(0));
}

#[test]
fn dropping_history_unsubscribes() {
    let (doc, history) = history_with_capacity(25);
    add(&doc, "A");
    drop(history);
    add(&doc, "B");
    assert_eq!(doc.subscriber_count(), 0);
}

// ============================================================================
// View state
// ============================================================================

#[derive(Default)]
struct RecordingView {
    expanded: BTreeSet<NodePath>,
    selected: Option<NodePath>,
    refreshes: usize,
}

impl ViewStateProvider for RecordingView {
    fn expanded_nodes(&self) -> Vec<NodePath> {
        self.expanded.iter().cloned().collect()
    }
    fn collapse_all(&mut self) {
        self.expanded.clear();
    }
    fn set_expanded(&mut self, path: &NodePath, expanded: bool) {
        if expanded {
            self.expanded.insert(path.clone());
        } else {
            self.expanded.remove(path);
        }
    }
    fn selected(&self) -> Option<NodePath> {
        self.selected.clone()
    }
    fn set_selected(&mut self, path: Option<NodePath>) {
        self.selected = path;
    }
    fn refresh(&mut self) {
        self.refreshes += 1;
    }
}

fn p(indices: &[usize]) -> NodePath {
    NodePath::from_indices(indices.to_vec())
}

#[test]
fn entry_view_state_is_restored_on_undo() {
    let (doc, history) = history_with_capacity(25);
    let view = Rc::new(RefCell::new(RecordingView::default()));
    let history = history.with_view_provider(view.clone());

    view.borrow_mut().set_expanded(&p(&[0]), true);
    view.borrow_mut().set_selected(Some(p(&[0])));
    let plan = add(&doc, "Plan");

    view.borrow_mut().set_expanded(&p(&[0, 0]), true);
    view.borrow_mut().set_selected(Some(p(&[0, 0])));
    doc.append_child(plan, NodeData::new("Users", "ThreadGroup"))
        .unwrap();

    assert!(history.undo().is_applied());
    let view = view.borrow();
    assert_eq!(view.expanded, BTreeSet::from([p(&[0])]));
    assert_eq!(view.selected, Some(p(&[0])));
    assert_eq!(view.refreshes, 1);
}

#[test]
fn current_view_is_kept_when_entries_have_none() {
    init_tracing();
    let doc = Document::new();
    let config = HistoryConfig {
        capture_view_state: false,
        ..HistoryConfig::default()
    };
    let view = Rc::new(RefCell::new(RecordingView::default()));
    let history = UndoHistory::new(doc.clone(), config).with_view_provider(view.clone());

    add(&doc, "A");
    add(&doc, "B");
    assert!(history.current().unwrap().view_state().is_none());

    view.borrow_mut().set_expanded(&p(&[1]), true);
    view.borrow_mut().set_selected(Some(p(&[1])));
    history.undo();

    assert_eq!(view.borrow().expanded, BTreeSet::from([p(&[1])]));
    assert_eq!(view.borrow().selected, Some(p(&[1])));
}

#[test]
fn no_expansion_expands_root_only() {
    let (doc, history) = history_with_capacity(25);
    let view = Rc::new(RefCell::new(RecordingView::default()));
    history.set_view_provider(Some(view.clone()));

    add(&doc, "A");
    add(&doc, "B");
    view.borrow_mut().set_expanded(&p(&[0]), true);
    history.undo();

    assert_eq!(view.borrow().expanded, BTreeSet::from([NodePath::root()]));
    let captured = history.current().unwrap().view_state().cloned();
    assert_eq!(captured, Some(ViewState::default()));
}

#[test]
fn refused_navigation_does_not_refresh() {
    let (doc, history) = history_with_capacity(25);
    let view = Rc::new(RefCell::new(RecordingView::default()));
    history.set_view_provider(Some(view.clone()));
    add(&doc, "A");

    assert_eq!(history.undo(), StepOutcome::Refused);
    assert_eq!(history.redo(), StepOutcome::Refused);
    assert_eq!(view.borrow().refreshes, 0);
}

// ============================================================================
// Failures
// ============================================================================

/// Document wrapper that can be told to fail capture or replacement.
#[derive(Clone)]
struct Faulty {
    inner: Document,
    fail_snapshot: Rc<Cell<bool>>,
    fail_replace: Rc<Cell<bool>>,
}

impl DocumentModel for Faulty {
    fn subscribe(&self, listener: Box<dyn Fn(&TreeEvent)>) -> Subscription {
        self.inner.subscribe(listener)
    }

    fn has_content(&self) -> bool {
        self.inner.has_content()
    }

    fn snapshot(&self) -> Result<Snapshot, SnapshotError> {
        if self.fail_snapshot.get() {
            return Err(SnapshotError::DanglingNode(self.inner.root()));
        }
        self.inner.snapshot()
    }

    fn replace_content(&self, snapshot: &Snapshot) -> Result<(), DocumentError> {
        if self.fail_replace.get() {
            return Err(DocumentError::RootImmutable("replaced"));
        }
        self.inner.replace_content(snapshot)
    }
}

fn faulty() -> (Faulty, UndoHistory) {
    init_tracing();
    let doc = Faulty {
        inner: Document::new(),
        fail_snapshot: Rc::new(Cell::new(false)),
        fail_replace: Rc::new(Cell::new(false)),
    };
    let history = UndoHistory::new(doc.clone(), HistoryConfig::default());
    (doc, history)
}

#[test]
fn replay_failure_is_reported_and_cursor_moves() {
    let (doc, history) = faulty();
    let view = Rc::new(RefCell::new(RecordingView::default()));
    history.set_view_provider(Some(view.clone()));
    add(&doc.inner, "A");
    add(&doc.inner, "B");

    doc.fail_replace.set(true);
    let outcome = history.undo();
    assert_eq!(
        outcome,
        StepOutcome::ReplayFailed {
            error: DocumentError::RootImmutable("replaced")
        }
    );
    assert_eq!(history.position(), Some(0));
    assert_eq!(top_names(&doc.inner), vec!["A", "B"]);
    assert_eq!(view.borrow().refreshes, 0);
    assert!(history.is_attached());

    doc.fail_replace.set(false);
    assert!(history.redo().is_applied());
    assert_eq!(view.borrow().refreshes, 1);
}

#[test]
fn capture_failure_leaves_history_unchanged() {
    let (doc, history) = faulty();
    add(&doc.inner, "A");
    doc.fail_snapshot.set(true);
    add(&doc.inner, "B");

    assert_eq!(history.len(), 1);
    assert!(matches!(
        history.record("manual"),
        RecordOutcome::Failed {
            error: SnapshotError::DanglingNode(_)
        }
    ));
    assert_eq!(top_names(&doc.inner), vec!["A", "B"]);
}
