//! Error types for the reconciliation engine.

use std::path::PathBuf;

use atfm_core::RegistryError;
use thiserror::Error;

use crate::SceneError;

/// Errors that can occur while reconciling a scene.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The type registry could not be read or written.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The scene could not be read or written.
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// The project does not define a folder for a workspace rule.
    #[error("Project defines no folder for workspace rule {rule}")]
    MissingWorkspaceRule { rule: String },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
