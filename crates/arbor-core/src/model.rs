//! The document contract consumed by the history runtime.

use crate::error::{DocumentError, SnapshotError};
use crate::event::{Subscription, TreeEvent};
use crate::snapshot::Snapshot;

/// A live, observable document whose content can be captured and replaced.
///
/// [`Document`](crate::Document) is the in-tree implementation. The history
/// runtime only talks to this trait, so hosts can plug in their own model.
pub trait DocumentModel {
    /// Register a listener for structural changes. Dropping the returned
    /// guard unsubscribes it.
    fn subscribe(&self, listener: Box<dyn Fn(&TreeEvent)>) -> Subscription;

    /// Whether anything sits under the root.
    fn has_content(&self) -> bool;

    /// Capture an isolated copy of the content.
    fn snapshot(&self) -> Result<Snapshot, SnapshotError>;

    /// Replace the content with a copy of `snapshot`.
    fn replace_content(&self, snapshot: &Snapshot) -> Result<(), DocumentError>;
}
