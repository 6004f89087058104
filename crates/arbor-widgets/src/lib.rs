#![forbid(unsafe_code)]

//! Presentation state for Arbor documents.
//!
//! [`TreeView`] flattens a [`Document`](arbor_core::Document) into rows and
//! tracks expansion and selection by [`NodePath`](arbor_core::NodePath).
//! Attach it to an [`UndoHistory`](arbor_runtime::undo::UndoHistory) as the
//! view provider and that state survives undo and redo.
//!
//! # Feature Flags
//!
//! - `state-persistence`: serde support for [`TreePersistState`]
//! - `tracing`: trace events on refresh

pub mod tree_view;

pub use tree_view::{TreePersistState, TreeRow, TreeView};
