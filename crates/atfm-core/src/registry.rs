//! Persisted registry of scene node types that reference files.
//!
//! Each entry names the node attribute holding the file path and the project
//! folder where files of that type belong. The registry is stored as a JSON
//! object keyed by node type and rewritten after every mutation.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::RegistryError;

/// File name the registry is stored under.
pub const REGISTRY_FILE_NAME: &str = "atfm_types.json";

const TEXTURES_DIR: &str = "/publish/textures";
const ALEMBIC_DIR: &str = "/publish/caches/alembic";

/// Built-in node types: `(type, attribute, default directory)`.
const DEFAULT_TYPES: [(&str, &str, &str); 7] = [
    ("file", "fileTextureName", TEXTURES_DIR),
    ("mentalrayTexture", "fileTextureName", TEXTURES_DIR),
    ("mentalrayIblShape", "texture", TEXTURES_DIR),
    ("aiImage", "filename", TEXTURES_DIR),
    ("rmanImageFile", "File", TEXTURES_DIR),
    ("imagePlane", "imagePlane", TEXTURES_DIR),
    ("AlembicNode", "abc_File", ALEMBIC_DIR),
];

/// Registry entry for one node type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTypeEntry {
    /// Attribute holding the file path.
    pub attribute: String,
    /// Project-relative folder where files of this type belong.
    pub default_directory: String,
}

impl NodeTypeEntry {
    /// Create a new entry.
    pub fn new(attribute: impl Into<String>, default_directory: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            default_directory: default_directory.into(),
        }
    }
}

/// Node type registry.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    path: Option<PathBuf>,
    types: IndexMap<String, NodeTypeEntry>,
}

impl TypeRegistry {
    /// Create an empty, in-memory registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an in-memory registry holding the built-in types.
    pub fn with_defaults() -> Self {
        let types = DEFAULT_TYPES
            .iter()
            .map(|(name, attr, dir)| (name.to_string(), NodeTypeEntry::new(*attr, *dir)))
            .collect();
        Self { path: None, types }
    }

    /// Load a registry from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| RegistryError::io(path, e))?;
        let types: IndexMap<String, NodeTypeEntry> =
            serde_json::from_str(&contents).map_err(|source| RegistryError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!(path = %path.display(), types = types.len(), "loaded type registry");

        Ok(Self {
            path: Some(path.to_path_buf()),
            types,
        })
    }

    /// Load a registry, falling back to an empty one on any error.
    ///
    /// The error is logged once; the returned registry stays bound to `path`
    /// so later mutations recreate the file.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(registry) => registry,
            Err(e) => {
                tracing::error!("unable to configure node types: {e}");
                Self {
                    path: Some(path.to_path_buf()),
                    types: IndexMap::new(),
                }
            }
        }
    }

    /// Find the first directory in `search_dirs` containing a registry file.
    pub fn discover<I, P>(search_dirs: I) -> Option<PathBuf>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        search_dirs
            .into_iter()
            .map(|dir| dir.as_ref().join(REGISTRY_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Write the built-in registry to `path` and return it bound to that file.
    pub fn create_default(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let mut registry = Self::with_defaults();
        registry.path = Some(path.into());
        registry.save()?;
        Ok(registry)
    }

    /// Persist the registry (no-op for in-memory registries).
    pub fn save(&self) -> Result<(), RegistryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| RegistryError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(&self.types).map_err(|source| {
            RegistryError::Serialize {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(path, json).map_err(|e| RegistryError::io(path, e))
    }

    /// Register a node type and persist.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        attribute: impl Into<String>,
        default_directory: impl Into<String>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        let entry = NodeTypeEntry::new(attribute, default_directory);

        if name.trim().is_empty() {
            return Err(RegistryError::InvalidEntry {
                message: "node type name is empty".into(),
            });
        }
        if entry.attribute.trim().is_empty() {
            return Err(RegistryError::InvalidEntry {
                message: format!("attribute for {name} is empty"),
            });
        }
        if self.types.contains_key(&name) {
            return Err(RegistryError::DuplicateType { name });
        }

        tracing::info!(node_type = %name, attribute = %entry.attribute, "adding node type");
        self.types.insert(name, entry);
        self.save()
    }

    /// Unregister a node type and persist.
    pub fn remove(&mut self, name: &str) -> Result<NodeTypeEntry, RegistryError> {
        let entry = self
            .types
            .shift_remove(name)
            .ok_or_else(|| RegistryError::UnknownType {
                name: name.to_string(),
            })?;

        tracing::info!(node_type = %name, "removing node type");
        self.save()?;
        Ok(entry)
    }

    /// Get the entry for a node type.
    pub fn get(&self, name: &str) -> Option<&NodeTypeEntry> {
        self.types.get(name)
    }

    /// Iterate over `(type, entry)` in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeTypeEntry)> {
        self.types.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Registered type names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Distinct default directories, in registry order.
    pub fn default_directories(&self) -> Vec<&str> {
        self.types
            .values()
            .map(|entry| entry.default_directory.as_str())
            .unique()
            .collect()
    }

    /// First type whose default directory is `dir`.
    pub fn type_for_directory(&self, dir: &str) -> Option<&str> {
        self.types
            .iter()
            .find(|(_, entry)| entry.default_directory == dir)
            .map(|(name, _)| name.as_str())
    }

    /// The file this registry is persisted to.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
