//! Node identifiers and the file references they hold.

use compact_str::CompactString;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Opaque handle of a scene node (usually its name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub CompactString);

impl NodeId {
    /// Create a new node ID.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(CompactString::new(id))
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(CompactString::from(id))
    }
}

/// Map from node to a path string, kept in scene order.
///
/// Paths stay strings because scene values may mix `/` and `\` separators
/// and reference files that do not exist.
pub type PathMap = IndexMap<NodeId, String>;

/// A file path referenced by a scene node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    /// The node holding the reference.
    pub id: NodeId,
    /// The referenced path, exactly as stored on the node.
    pub path: String,
}

impl FileReference {
    /// Create a new file reference.
    pub fn new(id: impl Into<NodeId>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }
}

/// Collect references into a [`PathMap`], later entries replacing earlier ones.
pub fn collect_references(references: impl IntoIterator<Item = FileReference>) -> PathMap {
    references.into_iter().map(|r| (r.id, r.path)).collect()
}
