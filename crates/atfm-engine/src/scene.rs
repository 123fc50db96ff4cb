//! The host scene, as seen by the engine.

use std::path::{Path, PathBuf};

use atfm_core::NodeId;
use thiserror::Error;

/// Errors raised by a scene.
#[derive(Debug, Error)]
pub enum SceneError {
    /// The node does not exist.
    #[error("Unknown node: {id}")]
    UnknownNode { id: NodeId },

    /// The node exists but has no such attribute.
    #[error("Node {id} has no attribute {attribute}")]
    UnknownAttribute { id: NodeId, attribute: String },

    /// I/O error while reading or writing the scene.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The scene could not be serialized for saving.
    #[error("Cannot serialize scene for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The scene file could not be parsed.
    #[error("Invalid scene file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SceneError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Read access to scene nodes.
pub trait SceneQuery {
    /// All nodes of `node_type`, in scene order.
    fn list_nodes(&self, node_type: &str) -> Vec<NodeId>;

    /// The string value of `attribute` on `id`.
    fn get_attribute(&self, id: &NodeId, attribute: &str) -> Option<String>;

    /// The type of `id`.
    fn node_type(&self, id: &NodeId) -> Option<String>;
}

/// Write access to scene nodes.
pub trait SceneUpdate {
    /// Set the string value of `attribute` on `id`.
    fn set_attribute(&mut self, id: &NodeId, attribute: &str, value: &str)
    -> Result<(), SceneError>;
}

/// Project information of the scene.
pub trait SceneContext {
    /// Root folder of the active project.
    fn project_root(&self) -> &Path;

    /// Project-relative folder for a workspace rule (`"sourceImages"` -> `"sourceimages"`).
    fn workspace_folder(&self, rule: &str) -> Option<String>;
}

/// A complete scene.
pub trait Scene: SceneQuery + SceneUpdate + SceneContext {}

impl<T: SceneQuery + SceneUpdate + SceneContext> Scene for T {}
