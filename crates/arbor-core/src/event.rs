//! Structural change notifications.

use std::fmt;
use std::rc::{Rc, Weak};

use crate::path::NodePath;

/// What happened to the node named by a [`TreeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeEventKind {
    /// A node (and its subtree) was inserted.
    Inserted,
    /// A node (and its subtree) was removed.
    Removed,
    /// A node's payload changed (name, property, enabled flag).
    Changed,
    /// The content under the node was replaced wholesale.
    StructureReplaced,
}

impl TreeEventKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Removed => "removed",
            Self::Changed => "changed",
            Self::StructureReplaced => "structure_replaced",
        }
    }
}

impl fmt::Display for TreeEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structural change delivered to document listeners.
///
/// `path` is where the node sits after an insertion or change, and where it
/// sat before a removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEvent {
    pub kind: TreeEventKind,
    pub path: NodePath,
    /// Name of the affected node.
    pub name: String,
}

impl TreeEvent {
    #[must_use]
    pub fn new(kind: TreeEventKind, path: NodePath, name: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            name: name.into(),
        }
    }
}

impl fmt::Display for TreeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} at {}", self.kind, self.name, self.path)
    }
}

pub(crate) type ListenerRc = Rc<dyn Fn(&TreeEvent)>;
pub(crate) type ListenerWeak = Weak<dyn Fn(&TreeEvent)>;

/// RAII guard for a document listener.
///
/// Dropping the guard makes the callback unreachable; the document prunes
/// the dead entry on its next notification.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl Subscription {
    /// Wrap whatever keeps a listener alive.
    ///
    /// Document models outside this crate use this to hand out their own
    /// guards.
    #[must_use]
    pub fn new(guard: impl std::any::Any) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
