#![forbid(unsafe_code)]

//! Isolated deep copies of document content.
//!
//! A [`Snapshot`] is a compact pre-order arena holding an owned copy of every
//! node under the document root. Nothing in it points back into the live
//! document, and no two snapshots share nodes: each capture allocates its
//! own `Vec`s and clones every payload.
//!
//! # Layout
//!
//! ```text
//! live document                  snapshot.nodes (pre-order)
//! root                           [0] Plan        children [1, 3]
//! └── Plan                       [1] Group       children [2]
//!     ├── Group                  [2] Request     children []
//!     │   └── Request            [3] Listener    children []
//!     └── Listener               roots = [0]
//! ```
//!
//! # Normalization
//!
//! Live-only decorations (the `dirty` edit marker) are stripped during
//! capture, so capturing the same logical content twice yields equal
//! snapshots.
//!
//! # Traversal
//!
//! Capture, validation and grafting all walk the tree with an explicit stack.
//! Depth is bounded only by the document; the call stack does not grow with
//! it.

use crate::arena::Arena;
use crate::error::SnapshotError;
use crate::node::{NodeData, NodeId};
use crate::path::NodePath;

/// One node of a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SnapshotNode {
    data: NodeData,
    children: Vec<usize>,
}

impl SnapshotNode {
    /// Build a node from a payload and child indices.
    #[must_use]
    pub fn new(data: NodeData, children: Vec<usize>) -> Self {
        Self { data, children }
    }

    #[must_use]
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    #[must_use]
    pub fn children(&self) -> &[usize] {
        &self.children
    }
}

/// An isolated copy of the document's content forest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    nodes: Vec<SnapshotNode>,
    roots: Vec<usize>,
}

impl Snapshot {
    /// Assemble a snapshot from raw parts.
    ///
    /// The result is not checked; call [`validate`](Self::validate) before
    /// trusting parts that came from outside this crate.
    #[must_use]
    pub fn from_parts(nodes: Vec<SnapshotNode>, roots: Vec<usize>) -> Self {
        Self { nodes, roots }
    }

    /// Capture the children of `parent` (not `parent` itself).
    pub(crate) fn capture(arena: &Arena, parent: NodeId) -> Result<Self, SnapshotError> {
        let top = arena.get(parent).ok_or(SnapshotError::DanglingNode(parent))?;
        let mut nodes: Vec<SnapshotNode> = Vec::with_capacity(arena.live().saturating_sub(1));
        let mut roots = Vec::with_capacity(top.children.len());
        let mut visited = vec![false; arena.slot_count()];
        let mut stack: Vec<(NodeId, Option<usize>)> =
            top.children.iter().rev().map(|&id| (id, None)).collect();

        while let Some((id, parent_index)) = stack.pop() {
            let slot = arena.get(id).ok_or(SnapshotError::DanglingNode(id))?;
            if std::mem::replace(&mut visited[id.index], true) {
                return Err(SnapshotError::Cycle(id));
            }
            let index = nodes.len();
            nodes.push(SnapshotNode {
                data: slot.data.normalized(),
                children: Vec::with_capacity(slot.children.len()),
            });
            match parent_index {
                Some(p) => nodes[p].children.push(index),
                None => roots.push(index),
            }
            stack.extend(slot.children.iter().rev().map(|&child| (child, Some(index))));
        }

        Ok(Self { nodes, roots })
    }

    /// Check that the parts describe a forest: every index in range, every
    /// node referenced exactly once, every node reachable from a root.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let len = self.nodes.len();
        let mut referenced = vec![false; len];
        let references = self
            .roots
            .iter()
            .chain(self.nodes.iter().flat_map(|n| n.children.iter()));
        for &index in references {
            let seen = referenced
                .get_mut(index)
                .ok_or(SnapshotError::IndexOutOfRange { index, len })?;
            if std::mem::replace(seen, true) {
                return Err(SnapshotError::SharedNode(index));
            }
        }
        if let Some(orphan) = referenced.iter().position(|seen| !seen) {
            return Err(SnapshotError::Unreachable(orphan));
        }

        // Single parentage holds, so a cycle can only hide in a component no
        // root reaches, and the walk below terminates.
        let mut reachable = vec![false; len];
        let mut stack: Vec<usize> = self.roots.clone();
        while let Some(index) = stack.pop() {
            reachable[index] = true;
            stack.extend(self.nodes[index].children.iter().copied());
        }
        match reachable.iter().position(|r| !r) {
            Some(orphan) => Err(SnapshotError::Unreachable(orphan)),
            None => Ok(()),
        }
    }

    /// Copy every node under `parent` in `arena`, preserving order.
    ///
    /// The snapshot must be valid.
    pub(crate) fn graft_into(&self, arena: &mut Arena, parent: NodeId) {
        let base = arena
            .get(parent)
            .map(|slot| slot.children.len())
            .unwrap_or_default();
        let mut stack: Vec<(usize, NodeId, usize)> = self
            .roots
            .iter()
            .enumerate()
            .rev()
            .map(|(position, &index)| (index, parent, base + position))
            .collect();

        while let Some((index, attach_to, position)) = stack.pop() {
            let node = &self.nodes[index];
            let id = arena.attach(attach_to, position, node.data.clone());
            stack.extend(
                node.children
                    .iter()
                    .enumerate()
                    .rev()
                    .map(|(position, &child)| (child, id, position)),
            );
        }
    }

    /// Number of captured nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the snapshot captured no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Indices of the top-level nodes.
    #[must_use]
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    #[must_use]
    pub fn node(&self, index: usize) -> Option<&SnapshotNode> {
        self.nodes.get(index)
    }

    #[must_use]
    pub fn nodes(&self) -> &[SnapshotNode] {
        &self.nodes
    }

    /// Maximum nesting depth (top-level nodes have depth 1).
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(usize, usize)> = self.roots.iter().map(|&r| (r, 1)).collect();
        while let Some((index, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let Some(node) = self.nodes.get(index) {
                stack.extend(node.children.iter().map(|&c| (c, depth + 1)));
            }
        }
        deepest
    }

    /// Resolve a path (relative to the document root) to a snapshot index.
    #[must_use]
    pub fn resolve(&self, path: &NodePath) -> Option<usize> {
        let (first, rest) = path.indices().split_first()?;
        let mut current = *self.roots.get(*first)?;
        for &step in rest {
            current = *self.nodes.get(current)?.children.get(step)?;
        }
        Some(current)
    }

    fn name_at(&self, index: usize) -> Option<&str> {
        self.nodes.get(index).map(|node| node.data.name())
    }

    /// Find the first node reached by following `names` from the top level.
    #[must_use]
    pub fn find_by_names(&self, names: &[&str]) -> Option<usize> {
        let (first, rest) = names.split_first()?;
        let mut current = self
            .roots
            .iter()
            .copied()
            .find(|&r| self.name_at(r) == Some(*first))?;
        for name in rest {
            current = self
                .nodes
                .get(current)?
                .children
                .iter()
                .copied()
                .find(|&c| self.name_at(c) == Some(*name))?;
        }
        Some(current)
    }
}
