#![forbid(unsafe_code)]

//! The live, observable configuration tree.
//!
//! # Design
//!
//! [`Document`] is a shared handle (`Rc<RefCell<..>>`) around a slot arena
//! with an implicit root node. The document's *content* is the forest under
//! the root. Every mutation that changes something bumps the version and
//! notifies live listeners in registration order.
//!
//! Listeners run after the internal borrow is released, so a callback may
//! read the document (the history recorder snapshots it from inside its
//! callback) or even mutate it; nested notifications are delivered
//! synchronously.
//!
//! # Invariants
//!
//! 1. `version` increments by exactly 1 per notifying mutation.
//! 2. A mutation that leaves the payload unchanged does not notify.
//! 3. Dead listeners (dropped [`Subscription`] guards) are pruned lazily.
//! 4. [`replace_content`](Document::replace_content) either swaps in the
//!    whole snapshot or leaves the document untouched.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::arena::Arena;
use crate::error::{DocumentError, SnapshotError};
use crate::event::{ListenerRc, ListenerWeak, Subscription, TreeEvent, TreeEventKind};
use crate::model::DocumentModel;
use crate::node::{NodeData, NodeId};
use crate::path::NodePath;
use crate::snapshot::Snapshot;

struct DocumentInner {
    arena: Arena,
    version: u64,
    listeners: Vec<ListenerWeak>,
}

/// Shared handle to a live configuration tree.
///
/// Cloning the handle shares the same tree and listeners.
pub struct Document {
    inner: Rc<RefCell<DocumentInner>>,
}

impl Clone for Document {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Document")
            .field("nodes", &inner.arena.live().saturating_sub(1))
            .field("version", &inner.version)
            .field("listener_count", &inner.listeners.len())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with a default root.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(NodeData::new("root", "Root"))
    }

    /// Create an empty document whose root carries `root`.
    #[must_use]
    pub fn with_root(root: NodeData) -> Self {
        Self {
            inner: Rc::new(RefCell::new(DocumentInner {
                arena: Arena::with_root(root),
                version: 0,
                listeners: Vec::new(),
            })),
        }
    }

    // ====================================================================
    // Queries
    // ====================================================================

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.inner.borrow().arena.root()
    }

    /// Whether anything sits under the root.
    #[must_use]
    pub fn has_content(&self) -> bool {
        let inner = self.inner.borrow();
        inner
            .arena
            .get(inner.arena.root())
            .is_some_and(|root| !root.children.is_empty())
    }

    /// Number of content nodes (the root is not counted).
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().arena.live().saturating_sub(1)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.has_content()
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of registered listeners, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Clone of a node's payload.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<NodeData> {
        self.with_node(id, NodeData::clone)
    }

    /// Borrow a node's payload without cloning it.
    pub fn with_node<R>(&self, id: NodeId, f: impl FnOnce(&NodeData) -> R) -> Option<R> {
        self.inner.borrow().arena.get(id).map(|slot| f(&slot.data))
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.inner
            .borrow()
            .arena
            .get(id)
            .map(|slot| slot.children.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.inner.borrow().arena.get(id)?.parent
    }

    #[must_use]
    pub fn path_of(&self, id: NodeId) -> Option<NodePath> {
        self.inner.borrow().arena.path_of(id)
    }

    #[must_use]
    pub fn resolve(&self, path: &NodePath) -> Option<NodeId> {
        self.inner.borrow().arena.resolve(path)
    }

    /// Capture an isolated copy of the content.
    ///
    /// ```
    /// use arbor_core::{Document, NodeData};
    ///
    /// let doc = Document::new();
    /// let plan = doc.append_child(doc.root(), NodeData::new("Plan", "TestPlan")).unwrap();
    /// let snapshot = doc.snapshot().unwrap();
    ///
    /// doc.rename(plan, "Renamed").unwrap();
    /// assert_eq!(snapshot.node(0).unwrap().data().name(), "Plan");
    /// ```
    pub fn snapshot(&self) -> Result<Snapshot, SnapshotError> {
        let inner = self.inner.borrow();
        Snapshot::capture(&inner.arena, inner.arena.root())
    }

    // ====================================================================
    // Mutations
    // ====================================================================

    /// Append a node as the last child of `parent`.
    pub fn append_child(&self, parent: NodeId, data: NodeData) -> Result<NodeId, DocumentError> {
        let index = self
            .inner
            .borrow()
            .arena
            .slot(parent)
            .map(|slot| slot.children.len())?;
        self.insert_child(parent, index, data)
    }

    /// Insert a node as the `index`-th child of `parent`.
    pub fn insert_child(
        &self,
        parent: NodeId,
        index: usize,
        mut data: NodeData,
    ) -> Result<NodeId, DocumentError> {
        self.mutate(|arena| {
            let len = arena.slot(parent)?.children.len();
            if index > len {
                return Err(DocumentError::IndexOutOfBounds { index, len });
            }
            data.set_dirty(true);
            let name = data.name().to_string();
            let id = arena.attach(parent, index, data);
            let path = arena.path_of(id).unwrap_or_default();
            Ok((id, Some(TreeEvent::new(TreeEventKind::Inserted, path, name))))
        })
    }

    /// Remove a node and its subtree, returning the node's payload.
    pub fn remove(&self, id: NodeId) -> Result<NodeData, DocumentError> {
        self.mutate(|arena| {
            if id == arena.root() {
                return Err(DocumentError::RootImmutable("removed"));
            }
            let path = arena.path_of(id).ok_or(DocumentError::UnknownNode(id))?;
            let data = arena.detach(id).ok_or(DocumentError::UnknownNode(id))?;
            let event = TreeEvent::new(TreeEventKind::Removed, path, data.name());
            Ok((data, Some(event)))
        })
    }

    pub fn rename(&self, id: NodeId, name: impl Into<String>) -> Result<(), DocumentError> {
        let name = name.into();
        self.change(id, |data| {
            if data.name() == name {
                return false;
            }
            data.set_name(name);
            true
        })
    }

    /// Set a property, returning the previous value.
    pub fn set_property(
        &self,
        id: NodeId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Option<String>, DocumentError> {
        let (key, value) = (key.into(), value.into());
        let mut previous = None;
        self.change(id, |data| {
            if data.property(&key) == Some(value.as_str()) {
                previous = Some(value);
                return false;
            }
            previous = data.insert_property(key, value);
            true
        })?;
        Ok(previous)
    }

    /// Remove a property, returning its value.
    pub fn remove_property(&self, id: NodeId, key: &str) -> Result<Option<String>, DocumentError> {
        let mut previous = None;
        self.change(id, |data| {
            previous = data.take_property(key);
            previous.is_some()
        })?;
        Ok(previous)
    }

    pub fn set_enabled(&self, id: NodeId, enabled: bool) -> Result<(), DocumentError> {
        self.change(id, |data| {
            if data.is_enabled() == enabled {
                return false;
            }
            data.set_enabled(enabled);
            true
        })
    }

    /// Drop every edit marker (after a save, for instance). Does not notify.
    pub fn clear_edit_markers(&self) {
        let mut inner = self.inner.borrow_mut();
        let root = inner.arena.root();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(slot) = inner.arena.get_mut(id) {
                slot.data.set_dirty(false);
                stack.extend(slot.children.iter().copied());
            }
        }
    }

    /// Remove all content.
    pub fn clear(&self) {
        let result = self.mutate(|arena| {
            let root = arena.root();
            let children = arena.slot(root)?.children.clone();
            if children.is_empty() {
                return Ok(((), None));
            }
            for child in children {
                arena.detach(child);
            }
            let name = arena.slot(root)?.data.name().to_string();
            let event = TreeEvent::new(TreeEventKind::StructureReplaced, NodePath::root(), name);
            Ok(((), Some(event)))
        });
        debug_assert!(result.is_ok(), "root is always live");
    }

    /// Replace all content with a copy of `snapshot`.
    ///
    /// The snapshot is validated and the new tree built before anything is
    /// swapped in; on error the document is unchanged and nobody is
    /// notified.
    pub fn replace_content(&self, snapshot: &Snapshot) -> Result<(), DocumentError> {
        snapshot.validate()?;
        self.mutate(|arena| {
            let root_data = arena.slot(arena.root())?.data.clone();
            let name = root_data.name().to_string();
            let mut next = arena.successor(root_data);
            let root = next.root();
            snapshot.graft_into(&mut next, root);
            *arena = next;
            let event = TreeEvent::new(TreeEventKind::StructureReplaced, NodePath::root(), name);
            Ok(((), Some(event)))
        })
    }

    // ====================================================================
    // Notification
    // ====================================================================

    /// Subscribe to structural changes.
    ///
    /// Returns a guard; dropping it unsubscribes the callback.
    pub fn subscribe(&self, callback: impl Fn(&TreeEvent) + 'static) -> Subscription {
        let strong: ListenerRc = Rc::new(callback);
        self.inner
            .borrow_mut()
            .listeners
            .push(Rc::downgrade(&strong));
        Subscription::new(strong)
    }

    fn change(
        &self,
        id: NodeId,
        apply: impl FnOnce(&mut NodeData) -> bool,
    ) -> Result<(), DocumentError> {
        self.mutate(|arena| {
            let path = arena.path_of(id).ok_or(DocumentError::UnknownNode(id))?;
            let data = &mut arena.slot_mut(id)?.data;
            if !apply(data) {
                return Ok(((), None));
            }
            data.set_dirty(true);
            let event = TreeEvent::new(TreeEventKind::Changed, path, data.name());
            Ok(((), Some(event)))
        })
    }

    /// Run a mutation, then notify listeners outside the borrow.
    fn mutate<R>(
        &self,
        f: impl FnOnce(&mut Arena) -> Result<(R, Option<TreeEvent>), DocumentError>,
    ) -> Result<R, DocumentError> {
        let (result, event) = {
            let mut inner = self.inner.borrow_mut();
            let (result, event) = f(&mut inner.arena)?;
            if event.is_some() {
                inner.version += 1;
            }
            (result, event)
        };
        if let Some(event) = event {
            self.notify(&event);
        }
        Ok(result)
    }

    fn notify(&self, event: &TreeEvent) {
        let callbacks: Vec<ListenerRc> = {
            let mut inner = self.inner.borrow_mut();
            inner.listeners.retain(|w| w.strong_count() > 0);
            inner.listeners.iter().filter_map(|w| w.upgrade()).collect()
        };
        trace!(
            kind = event.kind.as_str(),
            path = %event.path,
            listeners = callbacks.len(),
            "document.notify"
        );
        for callback in &callbacks {
            callback(event);
        }
    }
}

impl DocumentModel for Document {
    fn subscribe(&self, listener: Box<dyn Fn(&TreeEvent)>) -> Subscription {
        Document::subscribe(self, listener)
    }

    fn has_content(&self) -> bool {
        Document::has_content(self)
    }

    fn snapshot(&self) -> Result<Snapshot, SnapshotError> {
        Document::snapshot(self)
    }

    fn replace_content(&self, snapshot: &Snapshot) -> Result<(), DocumentError> {
        Document::replace_content(self, snapshot)
    }
}
