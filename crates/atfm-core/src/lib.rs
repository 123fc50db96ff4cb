//! Core types and configuration for atfm.
//!
//! This crate provides the data structures shared by the scanning, transfer
//! and engine crates: node identifiers and file references, classification
//! results, path-string helpers, engine configuration and the persisted
//! node-type registry.

mod classification;
mod config;
mod error;
mod node;
pub mod path;
mod registry;

pub use classification::{ClassificationResult, FileStatus};
pub use config::{EngineConfig, EngineConfigBuilder, LocationMatch};
pub use error::RegistryError;
pub use node::{collect_references, FileReference, NodeId, PathMap};
pub use registry::{NodeTypeEntry, TypeRegistry, REGISTRY_FILE_NAME};
