//! Execution of planned transfers.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use atfm_core::{NodeId, PathMap};
use tempfile::NamedTempFile;

use crate::conflict::{Conflict, ConflictPrompt, Decision};
use crate::plan::{plan_transfer, TransferOptions, TransferPlan};
use crate::{OperationError, TransferMode, TransferReport};

/// Receives the new path of each transferred reference.
pub trait ReferenceUpdater {
    /// Point the node `id` at `path`.
    fn update(&mut self, id: &NodeId, path: &str) -> Result<(), String>;
}

/// Discards reference updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUpdater;

impl ReferenceUpdater for NoopUpdater {
    fn update(&mut self, _id: &NodeId, _path: &str) -> Result<(), String> {
        Ok(())
    }
}

/// Outcome of transferring one member.
enum MemberOutcome {
    Transferred(u64),
    Skipped,
    KeptDestination,
}

/// Copies or moves the files behind a selection of references.
#[derive(Debug, Clone)]
pub struct TransferExecutor {
    options: TransferOptions,
}

impl TransferExecutor {
    /// Create an executor.
    pub fn new(options: TransferOptions) -> Self {
        Self { options }
    }

    /// The options every transfer uses.
    pub fn options(&self) -> &TransferOptions {
        &self.options
    }

    /// Transfer every reference in `selection`.
    ///
    /// References whose path is already a value of `in_place` are left alone.
    /// A failing member stops its reference, which then keeps its old path;
    /// the remaining references are still transferred.
    pub fn execute(
        &self,
        selection: &PathMap,
        in_place: &PathMap,
        prompt: &mut dyn ConflictPrompt,
        updater: &mut dyn ReferenceUpdater,
    ) -> TransferReport {
        let mut report = TransferReport::new(self.options.mode);
        let in_place: HashSet<&str> = in_place.values().map(String::as_str).collect();

        for (id, path) in selection {
            if path.is_empty() {
                continue;
            }
            if in_place.contains(path.as_str()) {
                tracing::debug!(%id, %path, "already in destination, skipping");
                report.skipped_in_place += 1;
                continue;
            }

            let plan = plan_transfer(id, path, &self.options);
            if let Err(error) = self.transfer_plan(&plan, prompt, &mut report) {
                tracing::warn!(%id, "transfer failed: {error}");
                report.fail(error);
                continue;
            }

            if self.options.update_references {
                let updated = plan.updated_reference();
                match updater.update(id, &updated) {
                    Ok(()) => {
                        tracing::debug!(%id, path = %updated, "reference updated");
                        report.updated_references.push((id.clone(), updated));
                    }
                    Err(e) => {
                        tracing::warn!(%id, "failed to update reference: {e}");
                        report.fail(OperationError::new(
                            path.as_str(),
                            format!("Failed to update reference: {e}"),
                        ));
                    }
                }
            }
        }

        tracing::info!("{}", report.summary());
        report
    }

    fn transfer_plan(
        &self,
        plan: &TransferPlan,
        prompt: &mut dyn ConflictPrompt,
        report: &mut TransferReport,
    ) -> Result<(), OperationError> {
        self.create_destination(plan)?;

        for (source, destination) in plan.pairs() {
            let outcome = transfer_member(&source, &destination, plan.mode, prompt)
                .map_err(|e| OperationError::new(&source, e))?;
            match outcome {
                MemberOutcome::Transferred(bytes) => {
                    tracing::info!(
                        source = %source.display(),
                        destination = %destination.display(),
                        "{}",
                        plan.mode.past_tense()
                    );
                    report.transferred += 1;
                    report.bytes_processed += bytes;
                }
                MemberOutcome::Skipped => report.skipped += 1,
                MemberOutcome::KeptDestination => report.kept_destination += 1,
            }
        }

        Ok(())
    }

    fn create_destination(&self, plan: &TransferPlan) -> Result<(), OperationError> {
        let root = &self.options.destination_root;
        if !root.is_dir() {
            fs::create_dir_all(root).map_err(|e| {
                OperationError::new(root, format!("Failed to create destination: {e}"))
            })?;
        }

        for dir in plan.subfolders(root) {
            if dir.is_dir() {
                continue;
            }
            tracing::debug!(dir = %dir.display(), "creating subfolder");
            fs::create_dir(&dir).map_err(|e| {
                OperationError::new(&dir, format!("Failed to create directory: {e}"))
            })?;
        }

        Ok(())
    }
}

fn transfer_member(
    source: &Path,
    destination: &Path,
    mode: TransferMode,
    prompt: &mut dyn ConflictPrompt,
) -> Result<MemberOutcome, String> {
    if destination.exists() {
        if same_file(source, destination) {
            tracing::debug!(path = %source.display(), "source and destination are the same file");
            return Ok(MemberOutcome::Skipped);
        }

        let conflict = Conflict::detect(source, destination)
            .map_err(|e| format!("Failed to compare with destination: {e}"))?;
        let choice = prompt.resolve(&conflict);
        match conflict.decide(choice) {
            Decision::Transfer => {
                tracing::debug!(path = %destination.display(), "overwriting");
            }
            Decision::KeepDestination => {
                tracing::debug!(path = %destination.display(), "keeping destination");
                return Ok(MemberOutcome::KeptDestination);
            }
            Decision::Skip => {
                tracing::debug!(path = %destination.display(), "skipping");
                return Ok(MemberOutcome::Skipped);
            }
        }
    }

    let bytes = match mode {
        TransferMode::Copy => copy_file(source, destination),
        TransferMode::Move => move_file(source, destination),
    }
    .map_err(|e| format!("Failed to {mode}: {e}"))?;

    Ok(MemberOutcome::Transferred(bytes))
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Copy a file and carry over its modification time.
///
/// The copy is staged next to the destination and renamed over it once
/// complete, so an existing destination survives a failed copy.
fn copy_file(source: &Path, destination: &Path) -> io::Result<u64> {
    let dir = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let staged = NamedTempFile::new_in(dir)?;

    let bytes = fs::copy(source, staged.path())?;
    let modified = fs::metadata(source)?.modified()?;
    staged.as_file().set_modified(modified)?;

    staged.persist(destination).map_err(|e| e.error)?;
    Ok(bytes)
}

fn move_file(source: &Path, destination: &Path) -> io::Result<u64> {
    let bytes = fs::metadata(source)?.len();
    if fs::rename(source, destination).is_ok() {
        return Ok(bytes);
    }

    // Cross-device move
    copy_file(source, destination)?;
    fs::remove_file(source)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_keeps_mtime() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.png");
        fs::write(&source, b"hello").unwrap();
        let old = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000);
        fs::File::options()
            .write(true)
            .open(&source)
            .unwrap()
            .set_modified(old)
            .unwrap();

        let destination = temp.path().join("b.png");
        let bytes = copy_file(&source, &destination).unwrap();

        assert_eq!(bytes, 5);
        assert!(source.exists());
        assert_eq!(fs::metadata(&destination).unwrap().modified().unwrap(), old);
    }

    #[test]
    fn test_failed_copy_keeps_destination() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("folder.png");
        fs::create_dir(&source).unwrap();
        let destination = temp.path().join("b.png");
        fs::write(&destination, b"keep").unwrap();

        assert!(copy_file(&source, &destination).is_err());
        assert_eq!(fs::read(&destination).unwrap(), b"keep");
        let leftovers = fs::read_dir(temp.path()).unwrap().count();
        assert_eq!(leftovers, 2);
    }

    #[test]
    fn test_move_removes_source() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.png");
        fs::write(&source, b"hello").unwrap();
        let destination = temp.path().join("b.png");

        assert_eq!(move_file(&source, &destination).unwrap(), 5);
        assert!(!source.exists());
        assert_eq!(fs::read(&destination).unwrap(), b"hello");
    }

    #[test]
    fn test_same_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.png");
        fs::write(&file, b"x").unwrap();
        let dotted = temp.path().join(".").join("a.png");

        assert!(same_file(&file, &dotted));
        assert!(!same_file(&file, &temp.path().join("b.png")));
    }
}
