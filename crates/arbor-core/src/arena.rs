//! Slot arena backing the live document.
//!
//! Nodes live in a `Vec<Option<Slot>>`; removed slots are recycled through a
//! free list. Parent/child links are indices, so the tree never holds shared
//! mutable references. Every slot carries a generation that is bumped when
//! the slot is freed, so an id issued before the free no longer resolves.

use crate::error::DocumentError;
use crate::node::{NodeData, NodeId};
use crate::path::NodePath;

#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub(crate) data: NodeData,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub(crate) struct Arena {
    slots: Vec<Option<Slot>>,
    generations: Vec<u32>,
    free: Vec<usize>,
    root: NodeId,
    live: usize,
    /// Generation given to slots allocated for the first time.
    epoch: u32,
}

impl Arena {
    /// Fresh arena holding only the root node.
    pub(crate) fn with_root(root: NodeData) -> Self {
        Self::with_epoch(root, 0)
    }

    fn with_epoch(root: NodeData, epoch: u32) -> Self {
        Self {
            slots: vec![Some(Slot {
                data: root,
                parent: None,
                children: Vec::new(),
            })],
            generations: vec![0],
            free: Vec::new(),
            root: NodeId::new(0, 0),
            live: 1,
            epoch,
        }
    }

    /// Empty arena that replaces this one.
    ///
    /// The root keeps its id; every other id issued by `self` is stale in
    /// the successor.
    pub(crate) fn successor(&self, root: NodeData) -> Self {
        let newest = self
            .generations
            .iter()
            .copied()
            .chain(std::iter::once(self.epoch))
            .max()
            .unwrap_or(0);
        Self::with_epoch(root, newest.wrapping_add(1))
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    /// Number of slots ever allocated (live or vacant).
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of live nodes, root included.
    pub(crate) fn live(&self) -> usize {
        self.live
    }

    fn is_current(&self, id: NodeId) -> bool {
        self.generations.get(id.index) == Some(&id.generation)
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Slot> {
        if !self.is_current(id) {
            return None;
        }
        self.slots.get(id.index).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        if !self.is_current(id) {
            return None;
        }
        self.slots.get_mut(id.index).and_then(Option::as_mut)
    }

    pub(crate) fn slot(&self, id: NodeId) -> Result<&Slot, DocumentError> {
        self.get(id).ok_or(DocumentError::UnknownNode(id))
    }

    pub(crate) fn slot_mut(&mut self, id: NodeId) -> Result<&mut Slot, DocumentError> {
        self.get_mut(id).ok_or(DocumentError::UnknownNode(id))
    }

    /// Allocate a detached node and link it under `parent` at `index`.
    ///
    /// `parent` must already be live and `index` in bounds; callers check.
    pub(crate) fn attach(&mut self, parent: NodeId, index: usize, data: NodeData) -> NodeId {
        let slot = Slot {
            data,
            parent: Some(parent),
            children: Vec::new(),
        };
        let id = match self.free.pop() {
            Some(free) => {
                self.slots[free] = Some(slot);
                NodeId::new(free, self.generations[free])
            }
            None => {
                self.slots.push(Some(slot));
                self.generations.push(self.epoch);
                NodeId::new(self.slots.len() - 1, self.epoch)
            }
        };
        self.live += 1;
        if let Some(parent_slot) = self.get_mut(parent) {
            parent_slot.children.insert(index, id);
        }
        id
    }

    /// Unlink `id` from its parent and free its whole subtree.
    ///
    /// Returns the payload of `id` itself.
    pub(crate) fn detach(&mut self, id: NodeId) -> Option<NodeData> {
        let parent = self.get(id)?.parent;
        if let Some(parent) = parent.and_then(|p| self.get_mut(p)) {
            parent.children.retain(|&child| child != id);
        }
        let mut removed = None;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if !self.is_current(next) {
                continue;
            }
            let Some(slot) = self.slots.get_mut(next.index).and_then(Option::take) else {
                continue;
            };
            self.generations[next.index] = self.generations[next.index].wrapping_add(1);
            self.free.push(next.index);
            self.live -= 1;
            stack.extend(slot.children.iter().copied());
            if next == id {
                removed = Some(slot.data);
            }
        }
        removed
    }

    /// Position of `id` among its siblings.
    pub(crate) fn sibling_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.get(id)?.parent?;
        self.get(parent)?.children.iter().position(|&c| c == id)
    }

    /// Child-index path from the root to `id`.
    pub(crate) fn path_of(&self, id: NodeId) -> Option<NodePath> {
        let mut indices = Vec::new();
        let mut current = id;
        while current != self.root {
            indices.push(self.sibling_index(current)?);
            current = self.get(current)?.parent?;
        }
        indices.reverse();
        Some(NodePath::from_indices(indices))
    }

    /// Resolve a path to a live node.
    pub(crate) fn resolve(&self, path: &NodePath) -> Option<NodeId> {
        let mut current = self.root;
        for &index in path.indices() {
            current = *self.get(current)?.children.get(index)?;
        }
        Some(current)
    }
}
