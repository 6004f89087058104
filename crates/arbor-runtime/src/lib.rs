#![forbid(unsafe_code)]

//! Arbor Runtime
//!
//! Undo/redo history and the services around it.
//!
//! # Key Components
//!
//! - [`UndoHistory`] - Records document snapshots and replays them
//! - [`HistoryStore`] - Bounded, cursor-based entry list
//! - [`ViewStateProvider`] - Contract for tree views that keep expansion
//!   and selection across undo
//! - [`ArborConfig`] - History and reconnect settings (TOML/JSON with the
//!   `config` feature)
//! - [`reconnect()`](reconnect::reconnect) - Bounded retry for remote workers
//!
//! # Role in Arbor
//! `arbor-runtime` sits between the document (`arbor-core`) and whatever
//! presents it (`arbor-widgets`). It never renders anything itself.

pub mod config;
#[cfg(feature = "log-init")]
pub mod logging;
pub mod reconnect;
pub mod undo;

pub use config::{ArborConfig, ConfigError, HistoryConfig};
pub use reconnect::{BackoffStrategy, ReconnectPolicy, ReconnectReport, RemoteConnector};
pub use undo::{
    HistoryEntry, HistoryStore, RecordOutcome, SkipReason, StepOutcome, UndoHistory, ViewState,
    ViewStateProvider,
};
