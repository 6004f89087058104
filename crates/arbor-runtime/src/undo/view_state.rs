#![forbid(unsafe_code)]

//! Presentation-state capture and restore around navigation.
//!
//! Replaying a snapshot rebuilds the document, which invalidates whatever a
//! tree view had expanded or selected. [`ViewStatePreserver`] captures that
//! state as [`NodePath`]s before the replay and re-applies it afterwards.
//! Paths stay meaningful because a replay reproduces the captured shape.
//!
//! Without a provider (headless use) every operation is a no-op.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use arbor_core::NodePath;
use tracing::{trace, warn};

/// Expanded nodes plus selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub expanded: BTreeSet<NodePath>,
    pub selected: Option<NodePath>,
}

impl ViewState {
    /// Build a view state from expanded paths and a selection.
    #[must_use]
    pub fn new(expanded: impl IntoIterator<Item = NodePath>, selected: Option<NodePath>) -> Self {
        Self {
            expanded: expanded.into_iter().collect(),
            selected,
        }
    }

    /// Whether any expansion was captured.
    #[must_use]
    pub fn has_expansion(&self) -> bool {
        !self.expanded.is_empty()
    }
}

/// What the history needs from a presentation layer.
pub trait ViewStateProvider {
    /// Currently expanded nodes.
    fn expanded_nodes(&self) -> Vec<NodePath>;

    fn collapse_all(&mut self);

    fn set_expanded(&mut self, path: &NodePath, expanded: bool);

    fn selected(&self) -> Option<NodePath>;

    fn set_selected(&mut self, path: Option<NodePath>);

    /// Redraw after the document was replaced.
    fn refresh(&mut self);
}

/// Shared handle to a provider, as held by the history.
pub type SharedViewProvider = Rc<RefCell<dyn ViewStateProvider>>;

/// Captures and restores [`ViewState`] through an optional provider.
#[derive(Default)]
pub struct ViewStatePreserver {
    provider: RefCell<Option<SharedViewProvider>>,
}

impl fmt::Debug for ViewStatePreserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewStatePreserver")
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl ViewStatePreserver {
    /// Create a preserver, optionally attached to `provider`.
    #[must_use]
    pub fn new(provider: Option<SharedViewProvider>) -> Self {
        Self {
            provider: RefCell::new(provider),
        }
    }

    /// Attach or detach the presentation layer.
    pub fn set_provider(&self, provider: Option<SharedViewProvider>) {
        *self.provider.borrow_mut() = provider;
    }

    /// Whether a provider is attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.provider.borrow().is_some()
    }

    /// Snapshot the provider's expanded set and selection.
    #[must_use]
    pub fn capture(&self) -> Option<ViewState> {
        let provider = self.provider()?;
        let Ok(view) = provider.try_borrow() else {
            warn!("view provider is busy; view state not captured");
            return None;
        };
        let state = ViewState::new(view.expanded_nodes(), view.selected());
        trace!(
            expanded = state.expanded.len(),
            selected = ?state.selected,
            "view_state.capture"
        );
        Some(state)
    }

    /// Re-apply `state`.
    ///
    /// When `state` is missing or carries no expansion, only the root is
    /// expanded.
    pub fn restore(&self, state: Option<&ViewState>) {
        let Some(provider) = self.provider() else {
            return;
        };
        let Ok(mut view) = provider.try_borrow_mut() else {
            warn!("view provider is busy; view state not restored");
            return;
        };
        view.collapse_all();
        match state {
            Some(state) if state.has_expansion() => {
                for path in &state.expanded {
                    view.set_expanded(path, true);
                }
                view.set_selected(state.selected.clone());
            }
            Some(state) => {
                view.set_expanded(&NodePath::root(), true);
                view.set_selected(state.selected.clone());
            }
            None => view.set_expanded(&NodePath::root(), true),
        }
    }

    /// Ask the provider to redraw.
    pub fn refresh(&self) {
        let Some(provider) = self.provider() else {
            return;
        };
        match provider.try_borrow_mut() {
            Ok(mut view) => view.refresh(),
            Err(_) => warn!("view provider is busy; refresh skipped"),
        }
    }

    fn provider(&self) -> Option<SharedViewProvider> {
        self.provider.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeView {
        expanded: BTreeSet<NodePath>,
        selected: Option<NodePath>,
        refreshes: usize,
    }

    impl ViewStateProvider for FakeView {
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
    fn headless_is_inert() {
        let preserver = ViewStatePreserver::default();
        assert!(!preserver.is_attached());
        assert!(preserver.capture().is_none());
        preserver.restore(None);
        preserver.refresh();
    }

    #[test]
    fn capture_then_restore_round_trips() {
        let view = Rc::new(RefCell::new(FakeView::default()));
        view.borrow_mut().set_expanded(&p(&[0]), true);
        view.borrow_mut().set_expanded(&p(&[0, 1]), true);
        view.borrow_mut().set_selected(Some(p(&[0, 1, 2])));

        let preserver = ViewStatePreserver::new(Some(view.clone()));
        let state = preserver.capture().unwrap();

        view.borrow_mut().collapse_all();
        view.borrow_mut().set_selected(None);
        preserver.restore(Some(&state));

        let view = view.borrow();
        assert_eq!(view.expanded, state.expanded);
        assert_eq!(view.selected, Some(p(&[0, 1, 2])));
    }

    #[test]
    fn missing_expansion_expands_root_only() {
        let view = Rc::new(RefCell::new(FakeView::default()));
        view.borrow_mut().set_expanded(&p(&[3]), true);
        let preserver = ViewStatePreserver::new(Some(view.clone()));

        preserver.restore(Some(&ViewState::new([], Some(p(&[0])))));
        assert_eq!(view.borrow().expanded, BTreeSet::from([NodePath::root()]));
        assert_eq!(view.borrow().selected, Some(p(&[0])));

        preserver.restore(None);
        assert_eq!(view.borrow().expanded, BTreeSet::from([NodePath::root()]));
    }

    #[test]
    fn refresh_reaches_provider() {
        let view = Rc::new(RefCell::new(FakeView::default()));
        let preserver = ViewStatePreserver::default();
        preserver.set_provider(Some(view.clone()));
        preserver.refresh();
        preserver.refresh();
        assert_eq!(view.borrow().refreshes, 2);

        preserver.set_provider(None);
        preserver.refresh();
        assert_eq!(view.borrow().refreshes, 2);
    }

    #[test]
    fn busy_provider_is_skipped() {
        let view = Rc::new(RefCell::new(FakeView::default()));
        let preserver = ViewStatePreserver::new(Some(view.clone()));
        let _held = view.borrow_mut();
        preserver.refresh();
        assert!(preserver.capture().is_none());
    }
}
