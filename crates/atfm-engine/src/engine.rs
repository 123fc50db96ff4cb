//! Reconciliation of scene references with the project folders.

use std::fs;
use std::path::PathBuf;

use atfm_core::{
    ClassificationResult, EngineConfig, NodeId, NodeTypeEntry, PathMap, TypeRegistry,
};
use atfm_ops::{
    ConflictPrompt, OperationError, ReferenceUpdater, TransferExecutor, TransferMode,
    TransferOptions, TransferReport,
};
use atfm_scan::{classify, classify_locations, search_for_files, source_root, SearchOutcome};
use itertools::Itertools;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::{EngineError, EngineResult};
use crate::prompt::{ConflictDialog, UserPrompt};
use crate::scene::{Scene, SceneContext, SceneQuery, SceneUpdate};

const SEARCH_CONFIRM: &str = "Yes!";
const SEARCH_DECLINE: &str = "Nevermind";
const FOLLOW_UP_COPY: &str = "Copy";
const FOLLOW_UP_MOVE: &str = "Move";
const FOLLOW_UP_DECLINE: &str = "No Thanks";

/// Which registered node types take part in a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeFilter {
    /// Every registered type.
    #[default]
    All,
    /// Types whose default directory names the source-images folder.
    TexturesOnly,
    /// The named types.
    Only(Vec<String>),
}

/// Classified view of the scene at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// The filter the snapshot was taken with.
    pub filter: TypeFilter,
    /// Every reference, as stored on its node.
    pub references: PathMap,
    /// Existence and location of each reference.
    pub classification: ClassificationResult,
    /// Absolute source-images folder.
    pub source_root: String,
}

impl Snapshot {
    /// Number of references whose sequence is only partly on disk.
    pub fn ambiguous(&self) -> usize {
        self.classification.ambiguous().count()
    }
}

/// Outcome of [`ReconciliationEngine::search_missing`].
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// False when the user declined to search.
    pub confirmed: bool,
    /// What the search found; `None` when nothing was searched.
    pub outcome: Option<SearchOutcome>,
    /// Nodes pointed at a found file.
    pub updated: Vec<NodeId>,
    /// Found files that could not be written to their node.
    pub errors: Vec<OperationError>,
    /// The follow-up transfer, when one was chosen.
    pub transfer: Option<TransferReport>,
    /// The scene after the search.
    pub snapshot: Snapshot,
}

/// Writes transferred paths back to scene nodes.
struct SceneUpdater<'a, S> {
    scene: &'a mut S,
    registry: &'a TypeRegistry,
}

impl<S: Scene> ReferenceUpdater for SceneUpdater<'_, S> {
    fn update(&mut self, id: &NodeId, path: &str) -> Result<(), String> {
        let attribute = attribute_for(&*self.scene, self.registry, id)
            .ok_or_else(|| format!("no registered attribute for {id}"))?;
        self.scene
            .set_attribute(id, &attribute, path)
            .map_err(|e| e.to_string())
    }
}

fn attribute_for<S: SceneQuery + ?Sized>(
    scene: &S,
    registry: &TypeRegistry,
    id: &NodeId,
) -> Option<String> {
    let node_type = scene.node_type(id)?;
    registry.get(&node_type).map(|entry| entry.attribute.clone())
}

/// Scans a scene for file references and brings their files into the project.
pub struct ReconciliationEngine<S> {
    scene: S,
    registry: TypeRegistry,
    config: EngineConfig,
}

impl<S: Scene> ReconciliationEngine<S> {
    /// Create an engine over `scene`.
    pub fn new(scene: S, registry: TypeRegistry, config: EngineConfig) -> Self {
        Self {
            scene,
            registry,
            config,
        }
    }

    /// Create an engine whose registry comes from `config.registry_path`.
    ///
    /// A configured but unreadable registry leaves the engine with no types;
    /// without a path the built-in types are used.
    pub fn from_config(scene: S, config: EngineConfig) -> Self {
        let registry = match &config.registry_path {
            Some(path) => TypeRegistry::load_or_empty(path),
            None => TypeRegistry::with_defaults(),
        };
        Self::new(scene, registry, config)
    }

    /// The scene.
    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// The type registry.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Consume the engine, returning the scene.
    pub fn into_scene(self) -> S {
        self.scene
    }

    /// Project-relative source-images folder, without slashes.
    pub fn source_images_folder(&self) -> EngineResult<String> {
        let rule = &self.config.source_images_key;
        self.scene
            .workspace_folder(rule)
            .map(|folder| folder.trim_matches(['/', '\\']).to_string())
            .filter(|folder| !folder.is_empty())
            .ok_or_else(|| EngineError::MissingWorkspaceRule { rule: rule.clone() })
    }

    /// Registered types passing `filter`, in registry order.
    pub fn selected_types(
        &self,
        filter: &TypeFilter,
    ) -> EngineResult<Vec<(&str, &NodeTypeEntry)>> {
        let types: Vec<(&str, &NodeTypeEntry)> = match filter {
            TypeFilter::All => self.registry.iter().collect(),
            TypeFilter::TexturesOnly => {
                let folder = self.source_images_folder()?;
                self.registry
                    .iter()
                    .filter(|(_, entry)| entry.default_directory.contains(folder.as_str()))
                    .collect()
            }
            TypeFilter::Only(names) => self
                .registry
                .iter()
                .filter(|(name, _)| names.iter().any(|n| n == name))
                .collect(),
        };
        Ok(types)
    }

    /// Collect the file reference of every node of the selected types.
    pub fn scan_references(&self, filter: &TypeFilter) -> EngineResult<PathMap> {
        let mut references = PathMap::new();
        for (node_type, entry) in self.selected_types(filter)? {
            for id in self.scene.list_nodes(node_type) {
                if let Some(path) = self.scene.get_attribute(&id, &entry.attribute) {
                    references.insert(id, path);
                }
            }
        }

        tracing::debug!(references = references.len(), "scanned scene references");
        Ok(references)
    }

    /// Rebuild the classified view of the scene.
    pub fn refresh(&self, filter: &TypeFilter) -> EngineResult<Snapshot> {
        let references = self.scan_references(filter)?;
        let folder = self.source_images_folder()?;
        let project_root = self.scene.project_root();

        let selected = self.selected_types(filter)?;
        let directories = selected
            .iter()
            .map(|(_, entry)| entry.default_directory.as_str())
            .unique();

        let mut classification = classify(&references);
        classification.in_place = classify_locations(
            &references,
            project_root,
            directories,
            self.config.location_match,
        );

        let snapshot = Snapshot {
            filter: filter.clone(),
            references,
            classification,
            source_root: source_root(project_root, &folder),
        };

        tracing::info!(
            existing = snapshot.classification.existing.len(),
            missing = snapshot.classification.missing.len(),
            in_place = snapshot.classification.in_place.len(),
            ambiguous = snapshot.ambiguous(),
            "refreshed scene"
        );
        Ok(snapshot)
    }

    /// The references a transfer works on.
    ///
    /// With no ids, every reference with at least one file on disk is selected.
    /// Unknown ids are ignored.
    pub fn select(&self, snapshot: &Snapshot, ids: &[NodeId]) -> PathMap {
        if ids.is_empty() {
            return snapshot
                .references
                .iter()
                .filter(|(id, _)| snapshot.classification.existing.contains_key(*id))
                .map(|(id, path)| (id.clone(), path.clone()))
                .collect();
        }

        let mut selection = PathMap::new();
        for id in ids {
            match snapshot.references.get(id) {
                Some(path) => {
                    selection.insert(id.clone(), path.clone());
                }
                None => tracing::warn!(node = %id, "not a scanned reference, ignoring"),
            }
        }
        selection
    }

    /// Copy or move the selected references into the source-images folder.
    ///
    /// Returns the transfer report and a fresh snapshot.
    pub fn transfer(
        &mut self,
        snapshot: &Snapshot,
        ids: &[NodeId],
        mode: TransferMode,
        prompt: &mut dyn ConflictPrompt,
    ) -> EngineResult<(TransferReport, Snapshot)> {
        let folder = self.source_images_folder()?;
        let options = TransferOptions {
            destination_root: self.scene.project_root().join(&folder),
            source_folder_token: folder,
            preserve_subfolders: self.config.preserve_subfolders,
            update_references: self.config.update_references,
            mode,
        };

        let selection = self.select(snapshot, ids);
        let executor = TransferExecutor::new(options);
        let mut updater = SceneUpdater {
            scene: &mut self.scene,
            registry: &self.registry,
        };
        let report = executor.execute(
            &selection,
            &snapshot.classification.in_place,
            prompt,
            &mut updater,
        );

        let snapshot = self.refresh(&snapshot.filter)?;
        Ok((report, snapshot))
    }

    /// Look for missing files on `drives` and point their nodes at them.
    ///
    /// The user confirms first. Found files may then be copied or moved
    /// into the project. A cancelled search changes nothing. A node that
    /// cannot be updated is reported in `errors` and the others proceed.
    pub fn search_missing(
        &mut self,
        snapshot: &Snapshot,
        ids: &[NodeId],
        drives: &[PathBuf],
        prompt: &mut dyn UserPrompt,
        cancel: &CancellationToken,
    ) -> EngineResult<SearchReport> {
        let missing: PathMap = snapshot
            .references
            .iter()
            .filter(|(id, _)| snapshot.classification.missing.contains_key(*id))
            .filter(|(id, _)| ids.is_empty() || ids.contains(*id))
            .map(|(id, path)| (id.clone(), path.clone()))
            .collect();

        let mut report = SearchReport {
            confirmed: false,
            outcome: None,
            updated: Vec::new(),
            errors: Vec::new(),
            transfer: None,
            snapshot: snapshot.clone(),
        };

        if missing.is_empty() {
            tracing::info!("no missing files");
            return Ok(report);
        }

        let answer = prompt.choose(
            "A file search can take a very long time! Are you sure you want to do this?",
            &[SEARCH_CONFIRM, SEARCH_DECLINE],
            SEARCH_DECLINE,
        );
        if answer.as_deref() != Some(SEARCH_CONFIRM) {
            tracing::debug!("search declined");
            return Ok(report);
        }
        report.confirmed = true;

        let outcome = search_for_files(&missing, drives, cancel);
        tracing::info!("{}", outcome.summary());

        if !outcome.cancelled {
            for (id, path) in &outcome.found {
                let Some(attribute) = attribute_for(&self.scene, &self.registry, id) else {
                    tracing::warn!(node = %id, "no registered attribute, not updating");
                    report.errors.push(OperationError::new(
                        path,
                        format!("No registered attribute for {id}"),
                    ));
                    continue;
                };
                match self.scene.set_attribute(id, &attribute, path) {
                    Ok(()) => report.updated.push(id.clone()),
                    Err(e) => {
                        tracing::warn!(node = %id, error = %e, "failed to update node");
                        report
                            .errors
                            .push(OperationError::new(path, format!("Failed to update {id}: {e}")));
                    }
                }
            }
        }

        report.snapshot = self.refresh(&snapshot.filter)?;
        report.outcome = Some(outcome);

        if report.updated.is_empty() {
            return Ok(report);
        }

        let follow_up = prompt.choose(
            "All found files have been updated in the scene. \
             Would you like to copy or move the files to the correct folder?",
            &[FOLLOW_UP_COPY, FOLLOW_UP_MOVE, FOLLOW_UP_DECLINE],
            FOLLOW_UP_COPY,
        );
        let mode = match follow_up.as_deref() {
            Some(FOLLOW_UP_COPY) => TransferMode::Copy,
            Some(FOLLOW_UP_MOVE) => TransferMode::Move,
            _ => return Ok(report),
        };

        let found = report.updated.clone();
        let current = report.snapshot.clone();
        let mut dialog = ConflictDialog::new(prompt);
        let (transfer, snapshot) = self.transfer(&current, &found, mode, &mut dialog)?;
        report.transfer = Some(transfer);
        report.snapshot = snapshot;
        Ok(report)
    }

    /// Register a node type and persist the registry.
    pub fn add_type(
        &mut self,
        name: &str,
        attribute: &str,
        default_directory: &str,
    ) -> EngineResult<()> {
        self.registry.add(name, attribute, default_directory)?;
        Ok(())
    }

    /// Unregister a node type and persist the registry.
    pub fn remove_type(&mut self, name: &str) -> EngineResult<NodeTypeEntry> {
        Ok(self.registry.remove(name)?)
    }

    /// Immediate subfolders of the project, as `/name`, sorted.
    pub fn project_folders(&self) -> EngineResult<Vec<String>> {
        let root = self.scene.project_root();
        let entries = fs::read_dir(root).map_err(|source| EngineError::Io {
            path: root.to_path_buf(),
            source,
        })?;

        let mut folders: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.path().is_dir())
            .map(|entry| format!("/{}", entry.file_name().to_string_lossy()))
            .collect();
        folders.sort();
        Ok(folders)
    }
}
