#![forbid(unsafe_code)]

//! Turns document change notifications into history entries.
//!
//! The recorder holds the document subscription. The navigator detaches it
//! (drops the subscription) before replaying a snapshot and re-attaches it
//! afterwards; together with the [`RecorderGuard`](super::RecorderGuard)
//! this keeps replays out of the history.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use arbor_core::{NodePath, SnapshotError, Subscription, TreeEvent, TreeEventKind};
use tracing::{debug, debug_span, error};

use super::entry::HistoryEntry;
use super::history::HistoryCore;

/// Why a record request did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The history is replaying or already capturing.
    Guarded,
    /// Recording was paused.
    Paused,
    /// The document has no content.
    EmptyDocument,
}

impl SkipReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guarded => "guarded",
            Self::Paused => "paused",
            Self::EmptyDocument => "empty_document",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a record request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// A new entry was appended.
    Recorded {
        seq: u64,
        /// Cursor after the append (`None` with a zero-capacity history).
        position: Option<usize>,
    },
    Skipped(SkipReason),
    /// The document could not be captured; history is unchanged.
    Failed { error: SnapshotError },
}

impl RecordOutcome {
    /// Whether an entry was appended.
    #[must_use]
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded { .. })
    }
}

/// History label for a change notification.
#[must_use]
pub fn label_for(event: &TreeEvent) -> String {
    match event.kind {
        TreeEventKind::Inserted => format!("Add {}", event.name),
        TreeEventKind::Removed => format!("Remove {}", event.name),
        TreeEventKind::Changed => format!("Change {}", event.name),
        TreeEventKind::StructureReplaced => "Complex Change".to_string(),
    }
}

/// Owner of the document subscription.
#[derive(Default)]
pub(crate) struct ChangeRecorder {
    subscription: RefCell<Option<Subscription>>,
}

impl fmt::Debug for ChangeRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeRecorder")
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl ChangeRecorder {
    pub(crate) fn is_attached(&self) -> bool {
        self.subscription.borrow().is_some()
    }

    /// Subscribe to `core`'s document. No-op if already attached.
    pub(crate) fn attach(&self, core: &Rc<HistoryCore>) {
        if self.is_attached() {
            return;
        }
        let weak: Weak<HistoryCore> = Rc::downgrade(core);
        let subscription = core.document.subscribe(Box::new(move |event: &TreeEvent| {
            if let Some(core) = weak.upgrade() {
                on_event(&core, event);
            }
        }));
        *self.subscription.borrow_mut() = Some(subscription);
    }

    /// Drop the subscription. Returns whether one was held.
    pub(crate) fn detach(&self) -> bool {
        self.subscription.borrow_mut().take().is_some()
    }
}

fn on_event(core: &HistoryCore, event: &TreeEvent) {
    let outcome = record(core, label_for(event), Some(event.path.clone()));
    debug!(event = %event, outcome = ?outcome, "recorder.on_event");
}

/// Capture the document and append it.
pub(crate) fn record(core: &HistoryCore, label: String, origin: Option<NodePath>) -> RecordOutcome {
    let span = debug_span!(
        "undo.record",
        label = %label,
        outcome = tracing::field::Empty,
    );
    let _enter = span.enter();

    let skip = |reason: SkipReason| {
        debug!(reason = reason.as_str(), "record skipped");
        span.record("outcome", reason.as_str());
        RecordOutcome::Skipped(reason)
    };

    if !core.recording.get() {
        return skip(SkipReason::Paused);
    }
    let Some(_token) = core.guard.try_acquire() else {
        return skip(SkipReason::Guarded);
    };
    if !core.document.has_content() {
        return skip(SkipReason::EmptyDocument);
    }

    let snapshot = match core.document.snapshot() {
        Ok(snapshot) => snapshot,
        Err(error) => {
            error!(%error, "snapshot failed; history unchanged");
            span.record("outcome", "failed");
            return RecordOutcome::Failed { error };
        }
    };
    let view_state = if core.config.capture_view_state {
        core.view.capture()
    } else {
        None
    };
    let entry = HistoryEntry::new(label, snapshot)
        .with_view_state(view_state)
        .with_origin(origin);

    let mut store = core.store.borrow_mut();
    let seq = store.append(entry);
    span.record("outcome", "recorded");
    RecordOutcome::Recorded {
        seq,
        position: store.position(),
    }
}
