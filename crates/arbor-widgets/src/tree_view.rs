#![forbid(unsafe_code)]

//! Headless tree view over a [`Document`].
//!
//! [`TreeView`] keeps the presentation state of a document tree (which
//! nodes are expanded, which one is selected) and flattens the document
//! into [`TreeRow`]s on [`refresh`](TreeView::refresh). State is keyed by
//! [`NodePath`], so it stays valid across snapshot replays.
//!
//! The view implements [`ViewStateProvider`]; hand it to an
//! [`UndoHistory`](arbor_runtime::undo::UndoHistory) and expansion and
//! selection survive undo and redo.

use std::collections::BTreeSet;

use arbor_core::{Document, NodeId, NodePath};
use arbor_runtime::undo::ViewStateProvider;

/// One visible line of the flattened tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub path: NodePath,
    /// Indentation level of the row as drawn.
    pub depth: usize,
    pub name: String,
    pub kind: String,
    pub enabled: bool,
    /// Edited since the last capture.
    pub dirty: bool,
    pub has_children: bool,
    pub expanded: bool,
}

/// Persistable state for [`TreeView`].
///
/// Stores the expanded node paths and the selection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct TreePersistState {
    pub expanded_paths: BTreeSet<NodePath>,
    #[cfg_attr(feature = "state-persistence", serde(default))]
    pub selected: Option<NodePath>,
}

/// Expansion, selection and the flattened rows of one document.
#[derive(Debug, Clone)]
pub struct TreeView {
    document: Document,
    expanded: BTreeSet<NodePath>,
    selected: Option<NodePath>,
    rows: Vec<TreeRow>,
    show_root: bool,
    refresh_count: u64,
    persistence_id: Option<String>,
}

impl TreeView {
    /// Create a view with only the root expanded.
    ///
    /// Rows are empty until the first [`refresh`](Self::refresh).
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self {
            document,
            expanded: BTreeSet::from([NodePath::root()]),
            selected: None,
            rows: Vec::new(),
            show_root: false,
            refresh_count: 0,
            persistence_id: None,
        }
    }

    /// Draw the root as its own row.
    #[must_use]
    pub fn with_show_root(mut self, show: bool) -> Self {
        self.show_root = show;
        self
    }

    #[must_use]
    pub fn with_persistence_id(mut self, id: impl Into<String>) -> Self {
        self.persistence_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn persistence_id(&self) -> Option<&str> {
        self.persistence_id.as_deref()
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    // ====================================================================
    // Expansion
    // ====================================================================

    #[must_use]
    pub fn is_expanded(&self, path: &NodePath) -> bool {
        self.expanded.contains(path)
    }

    pub fn expand(&mut self, path: NodePath) {
        self.expanded.insert(path);
    }

    pub fn collapse(&mut self, path: &NodePath) {
        self.expanded.remove(path);
    }

    /// Flip the expansion of `path`. Returns the new state.
    pub fn toggle(&mut self, path: &NodePath) -> bool {
        if self.expanded.remove(path) {
            false
        } else {
            self.expanded.insert(path.clone());
            true
        }
    }

    /// Expand every node that has children.
    pub fn expand_all(&mut self) {
        let mut stack = vec![(self.document.root(), NodePath::root())];
        while let Some((id, path)) = stack.pop() {
            let children = self.document.children(id);
            if children.is_empty() {
                continue;
            }
            for (index, child) in children.into_iter().enumerate() {
                stack.push((child, path.child(index)));
            }
            self.expanded.insert(path);
        }
    }

    /// Expanded paths in tree order.
    pub fn expanded(&self) -> impl Iterator<Item = &NodePath> {
        self.expanded.iter()
    }

    // ====================================================================
    // Selection
    // ====================================================================

    #[must_use]
    pub fn selected(&self) -> Option<&NodePath> {
        self.selected.as_ref()
    }

    pub fn select(&mut self, path: Option<NodePath>) {
        self.selected = path;
    }

    /// Live id of the selected node, if the selection still resolves.
    #[must_use]
    pub fn selected_node(&self) -> Option<NodeId> {
        self.selected
            .as_ref()
            .and_then(|path| self.document.resolve(path))
    }

    /// Index of the selected row among the current rows.
    #[must_use]
    pub fn selected_row(&self) -> Option<usize> {
        let selected = self.selected.as_ref()?;
        self.rows.iter().position(|row| &row.path == selected)
    }

    /// Move the selection one row down. Selects the first row when nothing
    /// is selected. Returns whether the selection changed.
    pub fn select_next(&mut self) -> bool {
        let target = match self.selected_row() {
            Some(index) => index + 1,
            None => 0,
        };
        self.select_row(target)
    }

    /// Move the selection one row up. Returns whether the selection changed.
    pub fn select_prev(&mut self) -> bool {
        match self.selected_row() {
            Some(index) if index > 0 => self.select_row(index - 1),
            _ => false,
        }
    }

    fn select_row(&mut self, index: usize) -> bool {
        let Some(row) = self.rows.get(index) else {
            return false;
        };
        self.selected = Some(row.path.clone());
        true
    }

    // ====================================================================
    // Rows
    // ====================================================================

    /// Rows as of the last refresh.
    #[must_use]
    pub fn rows(&self) -> &[TreeRow] {
        &self.rows
    }

    /// How many times the view was refreshed.
    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.refresh_count
    }

    /// Re-read the document, drop state for paths that no longer resolve,
    /// and rebuild the rows.
    pub fn refresh(&mut self) {
        let document = &self.document;
        self.expanded
            .retain(|path| path.is_root() || document.resolve(path).is_some());
        if self
            .selected
            .as_ref()
            .is_some_and(|path| document.resolve(path).is_none())
        {
            self.selected = None;
        }
        self.rows = self.visible_rows();
        self.refresh_count += 1;

        #[cfg(feature = "tracing")]
        tracing::trace!(
            rows = self.rows.len(),
            expanded = self.expanded.len(),
            refresh = self.refresh_count,
            "tree view refreshed"
        );
    }

    /// Flatten the document as currently expanded. Does not touch the
    /// cached rows.
    #[must_use]
    pub fn visible_rows(&self) -> Vec<TreeRow> {
        let root = self.document.root();
        let root_path = NodePath::root();
        let mut out = Vec::new();
        // Pending (id, path, depth), popped in pre-order.
        let mut stack: Vec<(NodeId, NodePath, usize)> = Vec::new();

        if self.show_root {
            stack.push((root, root_path, 0));
        } else if self.expanded.contains(&root_path) {
            push_children(&self.document, root, &root_path, 0, &mut stack);
        }

        while let Some((id, path, depth)) = stack.pop() {
            let children = self.document.children(id);
            let expanded = self.expanded.contains(&path);
            let Some(row) = self.document.with_node(id, |data| TreeRow {
                path: path.clone(),
                depth,
                name: data.name().to_string(),
                kind: data.kind().to_string(),
                enabled: data.is_enabled(),
                dirty: data.is_dirty(),
                has_children: !children.is_empty(),
                expanded,
            }) else {
                continue;
            };
            out.push(row);
            if expanded {
                push_children(&self.document, id, &path, depth + 1, &mut stack);
            }
        }
        out
    }

    // ====================================================================
    // Persistence
    // ====================================================================

    #[must_use]
    pub fn persist_state(&self) -> TreePersistState {
        TreePersistState {
            expanded_paths: self.expanded.clone(),
            selected: self.selected.clone(),
        }
    }

    /// Replace expansion and selection. Call [`refresh`](Self::refresh) to
    /// rebuild the rows.
    pub fn restore_state(&mut self, state: TreePersistState) {
        self.expanded = state.expanded_paths;
        self.selected = state.selected;
    }
}

fn push_children(
    document: &Document,
    id: NodeId,
    path: &NodePath,
    depth: usize,
    stack: &mut Vec<(NodeId, NodePath, usize)>,
) {
    let children = document.children(id);
    for (index, child) in children.into_iter().enumerate().rev() {
        stack.push((child, path.child(index), depth));
    }
}

impl ViewStateProvider for TreeView {
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
        TreeView::refresh(self);
    }
}
