//! Engine configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How a reference is tested for lying inside a designated folder.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LocationMatch {
    /// The folder name must occur anywhere in the path string, then the
    /// parent directory must be a substring of the folder path or one of the
    /// folder's directories.
    ///
    /// Reproduces the historical behavior, including false positives on
    /// parents like `<root>/sou` and on files at the filesystem root.
    Substring,
    /// The parent directory must be the folder or lie below it on a
    /// path-segment boundary.
    #[default]
    Segment,
}

/// Configuration for a reconciliation engine.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct EngineConfig {
    /// Workspace rule naming the source-images folder.
    #[builder(default = "default_source_images_key()")]
    #[serde(default = "default_source_images_key")]
    pub source_images_key: String,

    /// Recreate the subfolders below the source folder at the destination.
    #[builder(default = "false")]
    #[serde(default)]
    pub preserve_subfolders: bool,

    /// Write the new path back to the node after a transfer.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub update_references: bool,

    /// How in-place files are detected.
    #[builder(default)]
    #[serde(default)]
    pub location_match: LocationMatch,

    /// Where the type registry is persisted (None = in memory only).
    #[builder(default)]
    #[serde(default)]
    pub registry_path: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_source_images_key() -> String {
    "sourceImages".to_string()
}

impl EngineConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref key) = self.source_images_key {
            if key.trim().is_empty() {
                return Err("Source images workspace rule cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Create a new engine config builder.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            source_images_key: default_source_images_key(),
            preserve_subfolders: false,
            update_references: true,
            location_match: LocationMatch::default(),
            registry_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::builder()
            .preserve_subfolders(true)
            .location_match(LocationMatch::Substring)
            .registry_path(Some(PathBuf::from("/etc/atfm_types.json")))
            .build()
            .unwrap();

        assert!(config.preserve_subfolders);
        assert!(config.update_references);
        assert_eq!(config.source_images_key, "sourceImages");
        assert_eq!(config.location_match, LocationMatch::Substring);
    }

    #[test]
    fn test_config_rejects_empty_key() {
        let result = EngineConfig::builder().source_images_key("  ").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_location_match_parse() {
        assert_eq!("segment".parse::<LocationMatch>().unwrap(), LocationMatch::Segment);
        assert_eq!(LocationMatch::Substring.to_string(), "substring");
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert!(config.update_references);
        assert_eq!(config.location_match, LocationMatch::Segment);
    }
}
