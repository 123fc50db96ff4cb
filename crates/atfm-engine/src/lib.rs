//! Scene reconciliation for atfm.
//!
//! A [`ReconciliationEngine`] sits between a host scene and the project on
//! disk. It collects the file references of every registered node type,
//! classifies them as existing, missing or already in place, and brings
//! files into the project's source-images folder, writing the new paths
//! back to the scene.
//!
//! The host is reached through the [`Scene`] traits and the user through
//! [`UserPrompt`]. [`ManifestScene`] is a scene stored as a JSON file.
//!
//! # Example
//!
//! ```rust,no_run
//! use atfm_core::EngineConfig;
//! use atfm_engine::{ManifestScene, ReconciliationEngine, TypeFilter};
//!
//! let scene = ManifestScene::load("scene.json")?;
//! let engine = ReconciliationEngine::from_config(scene, EngineConfig::default());
//! let snapshot = engine.refresh(&TypeFilter::All)?;
//! println!("{} missing", snapshot.classification.missing.len());
//! # Ok::<(), atfm_engine::EngineError>(())
//! ```

mod engine;
mod error;
mod manifest;
mod prompt;
mod scene;

pub use engine::{ReconciliationEngine, SearchReport, Snapshot, TypeFilter};
pub use error::{EngineError, EngineResult};
pub use manifest::{ManifestNode, ManifestScene};
pub use prompt::{ConflictDialog, FixedPrompt, ScriptedPrompt, UserPrompt};
pub use scene::{Scene, SceneContext, SceneError, SceneQuery, SceneUpdate};
