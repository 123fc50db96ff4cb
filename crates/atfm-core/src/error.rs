//! Error types for the type registry.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or mutating the type registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Registry file not found.
    #[error("Registry file not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The registry file could not be parsed.
    #[error("Invalid registry file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The registry could not be serialized for saving.
    #[error("Cannot serialize registry for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A node type is already registered.
    #[error("Node type already registered: {name}")]
    DuplicateType { name: String },

    /// A node type is not registered.
    #[error("Unknown node type: {name}")]
    UnknownType { name: String },

    /// A required field was empty.
    #[error("Invalid node type entry: {message}")]
    InvalidEntry { message: String },
}

impl RegistryError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}
