use thiserror::Error;

use crate::node::NodeId;

/// Errors raised while capturing or validating a [`Snapshot`](crate::Snapshot).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("node {0} is referenced by its parent but its slot is vacant")]
    DanglingNode(NodeId),
    #[error("node {0} was reached twice while cloning")]
    Cycle(NodeId),
    #[error("snapshot index {index} out of range ({len} nodes)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("snapshot node {0} has more than one parent")]
    SharedNode(usize),
    #[error("snapshot node {0} is unreachable from the roots")]
    Unreachable(usize),
}

/// Errors raised by [`Document`](crate::Document) mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("the document root cannot be {0}")]
    RootImmutable(&'static str),
    #[error("child index {index} out of bounds (length {len})")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("snapshot rejected: {0}")]
    InvalidSnapshot(#[from] SnapshotError),
}
