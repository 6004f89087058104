#![forbid(unsafe_code)]

//! Runtime configuration for Arbor.
//!
//! [`ArborConfig`] groups the undo-history and reconnect settings. With the
//! `config` feature it loads from TOML or JSON; every field has a default,
//! so partial files are fine.
//!
//! # Loading
//!
//! ```toml
//! # arbor.toml
//! [history]
//! capacity = 50
//!
//! [reconnect]
//! max_retries = 5
//! continue_on_fail = true
//!
//! [reconnect.backoff]
//! kind = "fixed"
//! delay_ms = 15000
//! ```
//!
//! ```rust,ignore
//! let config = ArborConfig::from_toml_file("arbor.toml")?;
//! let config = ArborConfig::from_json_str(json)?;
//! ```

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::reconnect::{BackoffStrategy, ReconnectPolicy};
use crate::undo::DEFAULT_CAPACITY;

/// Upper bound accepted by [`ArborConfig::validate`] for the history size.
pub const MAX_HISTORY_CAPACITY: usize = 10_000;

// ---------------------------------------------------------------------------
// Top-level ArborConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ArborConfig {
    pub history: HistoryConfig,
    pub reconnect: ReconnectPolicy,
}

impl ArborConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Serialize to a pretty TOML string.
    #[cfg(feature = "config")]
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every parameter. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.history.capacity > MAX_HISTORY_CAPACITY {
            errors.push(format!(
                "history.capacity must be <= {MAX_HISTORY_CAPACITY}, got {}",
                self.history.capacity
            ));
        }

        match self.reconnect.backoff {
            BackoffStrategy::Fixed { .. } => {}
            BackoffStrategy::Exponential { base_ms, max_ms }
            | BackoffStrategy::Linear { base_ms, max_ms } => {
                if base_ms > max_ms {
                    errors.push(format!(
                        "reconnect.backoff base_ms ({base_ms}) must be <= max_ms ({max_ms})"
                    ));
                }
            }
        }

        if !self.reconnect.continue_on_fail && self.reconnect.max_retries > 0 {
            errors.push(
                "reconnect.max_retries has no effect while continue_on_fail is false".into(),
            );
        }

        errors
    }

    /// Load, then reject the result if [`validate`](Self::validate) finds
    /// problems.
    #[cfg(feature = "config")]
    pub fn from_toml_str_validated(s: &str) -> Result<Self, ConfigError> {
        let config = Self::from_toml_str(s)?;
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ---------------------------------------------------------------------------
// HistoryConfig
// ---------------------------------------------------------------------------

/// Undo history settings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct HistoryConfig {
    /// Maximum retained entries; the oldest is evicted beyond this.
    pub capacity: usize,
    /// Store the tree view's expansion and selection with each entry.
    pub capture_view_state: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            capture_view_state: true,
        }
    }
}

impl HistoryConfig {
    /// Default settings with a different capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "config")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[cfg(feature = "config")]
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[cfg(feature = "config")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}
