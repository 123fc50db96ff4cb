//! A scene stored as a JSON manifest.
//!
//! ```json
//! {
//!   "project_root": "/proj",
//!   "workspace": { "sourceImages": "sourceimages" },
//!   "nodes": [
//!     { "id": "file1", "type": "file", "attributes": { "fileTextureName": "/tex/wall.png" } }
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use atfm_core::NodeId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::scene::{SceneContext, SceneError, SceneQuery, SceneUpdate};

/// One node of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestNode {
    /// Unique node name.
    pub id: NodeId,
    /// Node type, as registered in the type registry.
    #[serde(rename = "type")]
    pub node_type: String,
    /// String attributes.
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Manifest {
    project_root: PathBuf,
    #[serde(default)]
    workspace: IndexMap<String, String>,
    #[serde(default)]
    nodes: Vec<ManifestNode>,
}

/// Scene backed by a JSON file; every attribute change rewrites the file.
///
/// Only attributes a node already carries can be set.
#[derive(Debug, Clone)]
pub struct ManifestScene {
    path: Option<PathBuf>,
    manifest: Manifest,
}

impl ManifestScene {
    /// Create an in-memory scene.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            path: None,
            manifest: Manifest {
                project_root: project_root.into(),
                ..Default::default()
            },
        }
    }

    /// Load a scene from a manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| SceneError::io(path, e))?;
        let manifest: Manifest =
            serde_json::from_str(&contents).map_err(|source| SceneError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!(
            path = %path.display(),
            nodes = manifest.nodes.len(),
            "loaded scene manifest"
        );

        Ok(Self {
            path: Some(path.to_path_buf()),
            manifest,
        })
    }

    /// Persist the scene (no-op for in-memory scenes).
    pub fn save(&self) -> Result<(), SceneError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.manifest).map_err(|source| {
            SceneError::Serialize {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(path, json).map_err(|e| SceneError::io(path, e))
    }

    /// Map a workspace rule to a project-relative folder.
    pub fn with_workspace_rule(mut self, rule: impl Into<String>, folder: impl Into<String>) -> Self {
        self.manifest.workspace.insert(rule.into(), folder.into());
        self
    }

    /// Add a node with a single attribute.
    pub fn with_node(
        mut self,
        id: impl Into<NodeId>,
        node_type: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let mut attributes = IndexMap::new();
        attributes.insert(attribute.into(), value.into());
        self.manifest.nodes.push(ManifestNode {
            id: id.into(),
            node_type: node_type.into(),
            attributes,
        });
        self
    }

    /// All nodes.
    pub fn nodes(&self) -> &[ManifestNode] {
        &self.manifest.nodes
    }

    /// The file this scene is persisted to.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn node(&self, id: &NodeId) -> Option<&ManifestNode> {
        self.manifest.nodes.iter().find(|n| &n.id == id)
    }
}

impl SceneQuery for ManifestScene {
    fn list_nodes(&self, node_type: &str) -> Vec<NodeId> {
        self.manifest
            .nodes
            .iter()
            .filter(|n| n.node_type == node_type)
            .map(|n| n.id.clone())
            .collect()
    }

    fn get_attribute(&self, id: &NodeId, attribute: &str) -> Option<String> {
        self.node(id)?.attributes.get(attribute).cloned()
    }

    fn node_type(&self, id: &NodeId) -> Option<String> {
        self.node(id).map(|n| n.node_type.clone())
    }
}

impl SceneUpdate for ManifestScene {
    fn set_attribute(
        &mut self,
        id: &NodeId,
        attribute: &str,
        value: &str,
    ) -> Result<(), SceneError> {
        let node = self
            .manifest
            .nodes
            .iter_mut()
            .find(|n| &n.id == id)
            .ok_or_else(|| SceneError::UnknownNode { id: id.clone() })?;

        let slot = node
            .attributes
            .get_mut(attribute)
            .ok_or_else(|| SceneError::UnknownAttribute {
                id: id.clone(),
                attribute: attribute.to_string(),
            })?;
        *slot = value.to_string();
        tracing::debug!(node = %id, attribute, value, "attribute set");
        self.save()
    }
}

impl SceneContext for ManifestScene {
    fn project_root(&self) -> &Path {
        &self.manifest.project_root
    }

    fn workspace_folder(&self, rule: &str) -> Option<String> {
        self.manifest.workspace.get(rule).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"{
        "project_root": "/proj",
        "workspace": { "sourceImages": "sourceimages" },
        "nodes": [
            { "id": "file1", "type": "file", "attributes": { "fileTextureName": "/tex/a.png" } },
            { "id": "abc1", "type": "AlembicNode", "attributes": { "abc_File": "/cache/a.abc" } },
            { "id": "file2", "type": "file" }
        ]
    }"#;

    #[test]
    fn test_load_and_query() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("scene.json");
        fs::write(&path, MANIFEST).unwrap();

        let scene = ManifestScene::load(&path).unwrap();
        assert_eq!(scene.project_root(), Path::new("/proj"));
        assert_eq!(scene.workspace_folder("sourceImages").as_deref(), Some("sourceimages"));
        assert_eq!(
            scene.list_nodes("file"),
            vec![NodeId::new("file1"), NodeId::new("file2")]
        );
        assert_eq!(
            scene.get_attribute(&NodeId::new("file1"), "fileTextureName").as_deref(),
            Some("/tex/a.png")
        );
        assert_eq!(scene.get_attribute(&NodeId::new("file2"), "fileTextureName"), None);
        assert_eq!(scene.node_type(&NodeId::new("abc1")).as_deref(), Some("AlembicNode"));
    }

    #[test]
    fn test_set_attribute_rewrites_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("scene.json");
        fs::write(&path, MANIFEST).unwrap();

        let mut scene = ManifestScene::load(&path).unwrap();
        scene
            .set_attribute(&NodeId::new("file1"), "fileTextureName", "/proj/sourceimages/a.png")
            .unwrap();

        let reloaded = ManifestScene::load(&path).unwrap();
        assert_eq!(
            reloaded.get_attribute(&NodeId::new("file1"), "fileTextureName").as_deref(),
            Some("/proj/sourceimages/a.png")
        );

        let err = scene.set_attribute(&NodeId::new("nope"), "x", "y").unwrap_err();
        assert!(matches!(err, SceneError::UnknownNode { .. }));

        let err = scene
            .set_attribute(&NodeId::new("file2"), "fileTextureName", "/x.png")
            .unwrap_err();
        assert!(matches!(err, SceneError::UnknownAttribute { .. }));
    }

    #[test]
    fn test_save_errors_name_the_scene_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("scene.json");
        fs::write(&path, MANIFEST).unwrap();
        let scene = ManifestScene::load(&path).unwrap();

        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        let err = scene.save().unwrap_err();
        assert!(matches!(err, SceneError::Io { .. }));

        let source = serde_json::from_str::<u8>("x").unwrap_err();
        let err = SceneError::Serialize { path, source };
        assert!(err.to_string().starts_with("Cannot serialize scene"));
    }

    #[test]
    fn test_load_invalid() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("scene.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ManifestScene::load(&path),
            Err(SceneError::Parse { .. })
        ));
        assert!(matches!(
            ManifestScene::load(temp.path().join("missing.json")),
            Err(SceneError::Io { .. })
        ));
    }
}
