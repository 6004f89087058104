#![forbid(unsafe_code)]

//! Cursor movement and snapshot replay.
//!
//! One navigation runs these steps in order:
//!
//! 1. Check the move is possible (a refusal leaves everything untouched).
//! 2. Capture the current view state.
//! 3. Detach the recorder and raise the guard.
//! 4. Move the cursor, copy the entry's snapshot out of the store and
//!    replace the document content with it.
//! 5. Lower the guard and re-attach the recorder.
//! 6. Restore the view state and refresh the presentation once.
//!
//! Content replacement is transactional: a rejected snapshot leaves the
//! document as it was. The cursor has already moved by then, so the failure
//! is logged and reported but not rolled back.

use std::fmt;
use std::rc::Rc;

use arbor_core::DocumentError;
use tracing::{debug, error, info_span, warn};

use super::history::HistoryCore;

/// Result of an undo, redo or navigate request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The document now holds the entry at `position`.
    Applied { label: String, position: usize },
    /// The move was out of bounds or the history was busy; nothing changed.
    Refused,
    /// The cursor moved but the document rejected the snapshot.
    ReplayFailed { error: DocumentError },
}

impl StepOutcome {
    /// Whether the document was replaced.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// Label of the replayed entry, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Applied { label, .. } => Some(label),
            _ => None,
        }
    }

    const fn as_str(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "applied",
            Self::Refused => "refused",
            Self::ReplayFailed { .. } => "replay_failed",
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied { label, position } => write!(f, "applied {label:?} at {position}"),
            Self::Refused => f.write_str("refused"),
            Self::ReplayFailed { error } => write!(f, "replay failed: {error}"),
        }
    }
}

/// Move the cursor by `offset` and replay the entry it lands on.
pub(crate) fn step(core: &Rc<HistoryCore>, offset: isize) -> StepOutcome {
    let span = info_span!(
        "undo.navigate",
        offset,
        position = tracing::field::Empty,
        outcome = tracing::field::Empty,
    );
    let _enter = span.enter();

    let outcome = replay(core, offset);
    span.record("outcome", outcome.as_str());
    if let StepOutcome::Applied { position, .. } = &outcome {
        span.record("position", *position);
    }
    outcome
}

fn replay(core: &Rc<HistoryCore>, offset: isize) -> StepOutcome {
    if core.guard.is_active() {
        debug!("history is busy; navigation refused");
        return StepOutcome::Refused;
    }
    if !core.store.borrow().can_navigate(offset) {
        let store = core.store.borrow();
        warn!(
            position = ?store.position(),
            len = store.len(),
            "cannot move history cursor by {offset}"
        );
        return StepOutcome::Refused;
    }

    let before = core.view.capture();
    let was_attached = core.recorder.detach();

    let replayed = {
        let Some(_token) = core.guard.try_acquire() else {
            if was_attached {
                core.recorder.attach(core);
            }
            return StepOutcome::Refused;
        };
        let moved = {
            let mut store = core.store.borrow_mut();
            store.navigate(offset).map(|entry| {
                (
                    entry.label().to_string(),
                    entry.snapshot().clone(),
                    entry.view_state().cloned(),
                )
            })
        };
        let position = core.store.borrow().position();
        match (moved, position) {
            (Some((label, snapshot, view_state)), Some(position)) => core
                .document
                .replace_content(&snapshot)
                .map(|()| (label, position, view_state)),
            _ => {
                if was_attached {
                    core.recorder.attach(core);
                }
                return StepOutcome::Refused;
            }
        }
    };

    if was_attached {
        core.recorder.attach(core);
    }

    match replayed {
        Ok((label, position, view_state)) => {
            core.view.restore(view_state.as_ref().or(before.as_ref()));
            core.view.refresh();
            debug!(label = %label, position, "history replayed");
            StepOutcome::Applied { label, position }
        }
        Err(error) => {
            error!(%error, "replay failed; document left unchanged");
            StepOutcome::ReplayFailed { error }
        }
    }
}
