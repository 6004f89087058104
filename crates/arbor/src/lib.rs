#![forbid(unsafe_code)]

//! Arbor public facade crate.
//!
//! Re-exports the document model, the undo history and the tree view, and
//! offers a prelude for everyday use.
//!
//! # Example
//!
//! ```
//! use arbor::prelude::*;
//!
//! fn main() -> arbor::Result<()> {
//!     let doc = Document::new();
//!     let history = UndoHistory::new(doc.clone(), HistoryConfig::default());
//!
//!     let plan = doc.append_child(doc.root(), NodeData::new("Plan", "TestPlan"))?;
//!     doc.set_property(plan, "threads", "10")?;
//!     assert_eq!(history.undo_label().as_deref(), Some("Change Plan"));
//!
//!     assert!(history.undo().is_applied());
//!     let plan = doc.resolve(&NodePath::from_indices([0])).unwrap();
//!     assert_eq!(doc.node(plan).unwrap().property("threads"), None);
//!     Ok(())
//! }
//! ```

// --- Core re-exports -------------------------------------------------------

pub use arbor_core::{
    Document, DocumentError, DocumentModel, NodeData, NodeId, NodePath, Snapshot, SnapshotError,
    SnapshotNode, Subscription, TreeEvent, TreeEventKind,
};

// --- Runtime re-exports ----------------------------------------------------

pub use arbor_runtime::config::{ArborConfig, ConfigError, HistoryConfig};
pub use arbor_runtime::reconnect::{
    BackoffStrategy, ReconnectPolicy, ReconnectReport, RemoteConnector, reconnect,
};
pub use arbor_runtime::undo::{
    HistoryEntry, RecordOutcome, SharedViewProvider, SkipReason, StepOutcome, UndoHistory,
    ViewState, ViewStateProvider,
};

#[cfg(feature = "log-init")]
pub use arbor_runtime::logging::init_logging;

// --- Widget re-exports -----------------------------------------------------

#[cfg(feature = "widgets")]
pub use arbor_widgets::{TreePersistState, TreeRow, TreeView};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for Arbor callers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Standard result type for Arbor APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ArborConfig, Document, Error, HistoryConfig, NodeData, NodePath, Result, Snapshot,
        StepOutcome, UndoHistory,
    };

    #[cfg(feature = "widgets")]
    pub use crate::TreeView;

    pub use crate::{core, runtime};

    #[cfg(feature = "widgets")]
    pub use crate::widgets;
}

pub use arbor_core as core;
pub use arbor_runtime as runtime;
#[cfg(feature = "widgets")]
pub use arbor_widgets as widgets;
