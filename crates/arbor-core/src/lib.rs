#![forbid(unsafe_code)]

//! Arbor Core
//!
//! The live configuration-tree document and its snapshots.
//!
//! # Key Components
//!
//! - [`Document`] - Shared, observable tree of configuration nodes
//! - [`NodeData`] - Node payload (name, kind, properties, enabled flag)
//! - [`Snapshot`] - Isolated deep copy of a document's content
//! - [`TreeEvent`] - Structural change delivered to listeners
//! - [`NodePath`] - Child-index address that survives content replacement
//! - [`DocumentModel`] - Contract the history runtime drives
//!
//! # Role in Arbor
//! `arbor-core` owns the data. `arbor-runtime` records snapshots of it into
//! an undo history and replays them back, and `arbor-widgets` presents it.

mod arena;
pub mod document;
pub mod error;
pub mod event;
pub mod model;
pub mod node;
pub mod path;
pub mod snapshot;

pub use document::Document;
pub use error::{DocumentError, SnapshotError};
pub use event::{Subscription, TreeEvent, TreeEventKind};
pub use model::DocumentModel;
pub use node::{NodeData, NodeId};
pub use path::NodePath;
pub use snapshot::{Snapshot, SnapshotNode};
