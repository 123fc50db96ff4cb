//! Whole-drive search for missing files.
//!
//! Every missing reference walks each root in turn until its file name (or a
//! member of its tile sequence) turns up. This can take a very long time on
//! large drives; callers should confirm with the user before starting and
//! keep the [`CancellationToken`] at hand.

use std::path::{Path, PathBuf};

use jwalk::{Parallelism, WalkDir};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use atfm_core::path::{file_name, join, normalize_separators};
use atfm_core::{NodeId, PathMap};

use crate::tag::{detect_tag, SequenceTag};

/// Default channel buffer size for search events.
pub const SEARCH_CHANNEL_SIZE: usize = 100;

/// Emit a progress event every this many directories.
const PROGRESS_INTERVAL: u64 = 256;

/// Progress information for an ongoing search.
#[derive(Debug, Clone)]
pub struct SearchProgress {
    /// The node currently being searched for.
    pub current: NodeId,
    /// The root currently being walked.
    pub root: PathBuf,
    /// Directories visited so far, across all nodes.
    pub directories_visited: u64,
}

/// Result of a finished (or cancelled) search.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Replacement paths, by node.
    pub found: PathMap,
    /// Nodes that were searched for and not found.
    pub not_found: Vec<NodeId>,
    /// True when the search stopped early.
    pub cancelled: bool,
    /// Directories visited in total.
    pub directories_visited: u64,
}

impl SearchOutcome {
    /// Get a human-readable summary of the search.
    pub fn summary(&self) -> String {
        let base = format!(
            "Found {} of {} files ({} directories searched)",
            self.found.len(),
            self.found.len() + self.not_found.len(),
            self.directories_visited
        );
        if self.cancelled {
            format!("{base}, cancelled")
        } else {
            base
        }
    }
}

/// Event sent through the channel during a background search.
#[derive(Debug)]
pub enum SearchEvent {
    /// Progress update.
    Progress(SearchProgress),
    /// A replacement was found for a node.
    Found { id: NodeId, path: String },
    /// The search finished or was cancelled.
    Complete(SearchOutcome),
}

/// Search `drives` for every missing reference, on the calling thread.
pub fn search_for_files(
    missing: &PathMap,
    drives: &[PathBuf],
    cancel: &CancellationToken,
) -> SearchOutcome {
    search_impl(missing, drives, cancel, |_| {})
}

/// Start a search on a blocking task.
///
/// Returns a receiver for progress updates and results. Dropping the
/// receiver does not stop the walk; cancel the token for that.
pub fn start_search(
    missing: PathMap,
    drives: Vec<PathBuf>,
    cancel: CancellationToken,
) -> mpsc::Receiver<SearchEvent> {
    let (tx, rx) = mpsc::channel(SEARCH_CHANNEL_SIZE);

    tokio::task::spawn_blocking(move || {
        let outcome = search_impl(&missing, &drives, &cancel, |event| {
            let _ = tx.blocking_send(event);
        });
        let _ = tx.blocking_send(SearchEvent::Complete(outcome));
    });

    rx
}

/// Internal implementation shared by the blocking and background searches.
fn search_impl<F>(
    missing: &PathMap,
    drives: &[PathBuf],
    cancel: &CancellationToken,
    mut emit: F,
) -> SearchOutcome
where
    F: FnMut(SearchEvent),
{
    let mut outcome = SearchOutcome::default();

    for (id, path) in missing {
        if cancel.is_cancelled() {
            outcome.cancelled = true;
            break;
        }

        let normalized = normalize_separators(path);
        let name = file_name(&normalized);
        if name.is_empty() {
            outcome.not_found.push(id.clone());
            continue;
        }
        let tag = detect_tag(name);

        tracing::info!(node = %id, file = name, "searching");

        let mut found = None;
        for drive in drives {
            tracing::debug!(drive = %drive.display(), "searching drive");
            let mut on_dir = || {
                outcome.directories_visited += 1;
                if outcome.directories_visited % PROGRESS_INTERVAL == 0 {
                    emit(SearchEvent::Progress(SearchProgress {
                        current: id.clone(),
                        root: drive.clone(),
                        directories_visited: outcome.directories_visited,
                    }));
                }
            };
            let walk = walk_drive(drive, name, tag.as_ref(), cancel, &mut on_dir);

            match walk {
                Walk::Found(hit) => {
                    found = Some(hit);
                    break;
                }
                Walk::Exhausted => {}
                Walk::Cancelled => {
                    outcome.cancelled = true;
                    break;
                }
            }
        }

        if outcome.cancelled {
            break;
        }

        match found {
            Some(hit) => {
                tracing::info!(node = %id, path = %hit, "found");
                emit(SearchEvent::Found {
                    id: id.clone(),
                    path: hit.clone(),
                });
                outcome.found.insert(id.clone(), hit);
            }
            None => {
                tracing::info!(node = %id, file = name, "not found");
                outcome.not_found.push(id.clone());
            }
        }
    }

    outcome
}

/// How a single drive walk ended.
enum Walk {
    Found(String),
    Exhausted,
    Cancelled,
}

/// Walk one drive looking for `name`, or any member of `tag`'s sequence.
///
/// A hit records the directory joined with `name` itself, so tagged
/// references keep their token.
fn walk_drive(
    drive: &Path,
    name: &str,
    tag: Option<&SequenceTag>,
    cancel: &CancellationToken,
    on_dir: &mut dyn FnMut(),
) -> Walk {
    let walker = WalkDir::new(drive)
        .parallelism(Parallelism::Serial)
        .skip_hidden(false)
        .follow_links(false);

    for entry in walker {
        if cancel.is_cancelled() {
            return Walk::Cancelled;
        }

        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::trace!("skipping unreadable entry: {err}");
                continue;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            on_dir();
            continue;
        }
        if !file_type.is_file() {
            continue;
        }

        let entry_name = entry.file_name().to_string_lossy();
        let matched = match tag {
            Some(tag) => tag.matches_name(&entry_name),
            None => entry_name == name,
        };

        if matched {
            let path = entry.path();
            let dir = path.parent().unwrap_or(drive);
            let dir = normalize_separators(&dir.to_string_lossy());
            return Walk::Found(join(&dir, name));
        }
    }

    Walk::Exhausted
}
