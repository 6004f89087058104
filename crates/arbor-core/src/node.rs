//! Node identity and payload.

use std::collections::BTreeMap;
use std::fmt;

/// Generational arena index of a live node.
///
/// Ids are only meaningful for the document that issued them. Removing a
/// node or replacing the content retires its id: a retired id never names
/// another node, lookups through it fail with
/// [`DocumentError::UnknownNode`](crate::DocumentError::UnknownNode).
/// Use a [`NodePath`](crate::NodePath) to address a node across replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

impl NodeId {
    pub(crate) const fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }

    /// Generation of the slot when the id was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generation == 0 {
            write!(f, "#{}", self.index)
        } else {
            write!(f, "#{}v{}", self.index, self.generation)
        }
    }
}

/// Payload of a configuration node.
///
/// `dirty` is an edit marker owned by the live document: it is set by
/// mutations and cleared when content is captured into a snapshot, so two
/// snapshots of the same logical content compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeData {
    name: String,
    kind: String,
    properties: BTreeMap<String, String>,
    enabled: bool,
    #[cfg_attr(feature = "serde", serde(skip))]
    dirty: bool,
}

impl NodeData {
    /// Create an enabled node with no properties.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            properties: BTreeMap::new(),
            enabled: true,
            dirty: false,
        }
    }

    /// Add a property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set the enabled flag.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the node carries an unsaved-edit marker.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn insert_property(&mut self, key: String, value: String) -> Option<String> {
        self.properties.insert(key, value)
    }

    pub(crate) fn take_property(&mut self, key: &str) -> Option<String> {
        self.properties.remove(key)
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Copy with live-only decorations stripped.
    pub(crate) fn normalized(&self) -> Self {
        let mut copy = self.clone();
        copy.dirty = false;
        copy
    }
}
