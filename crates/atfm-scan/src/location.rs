//! Detection of references already inside a designated project folder.

use std::collections::HashSet;
use std::path::Path;

use jwalk::{Parallelism, WalkDir};

use atfm_core::path::{is_within, join, normalize_separators, split_parent, trim_trailing};
use atfm_core::{LocationMatch, PathMap};

/// Join a project root and a project-relative folder.
pub fn source_root(root: &Path, source_subpath: &str) -> String {
    let root = normalize_separators(&root.to_string_lossy());
    let sub = source_subpath.trim_matches(['/', '\\']);
    let root = trim_trailing(&root);
    if sub.is_empty() {
        root.to_string()
    } else {
        join(root, sub)
    }
}

/// Find the references whose file sits in `root/source_subpath` or below it.
pub fn classify_location(
    paths: &PathMap,
    root: &Path,
    source_subpath: &str,
    mode: LocationMatch,
) -> PathMap {
    let source_root = source_root(root, source_subpath);
    let folder_name = source_subpath.trim_matches(['/', '\\']);

    let subdirectories = match mode {
        LocationMatch::Substring => list_directories(&source_root),
        LocationMatch::Segment => HashSet::new(),
    };

    let mut in_place = PathMap::new();
    for (id, path) in paths {
        let normalized = normalize_separators(path);
        let Some((parent, _)) = split_parent(&normalized) else {
            continue;
        };

        let located = match mode {
            // An empty parent is contained in any folder path.
            LocationMatch::Substring => {
                path.contains(folder_name)
                    && (source_root.contains(parent) || subdirectories.contains(parent))
            }
            LocationMatch::Segment => is_within(parent, &source_root),
        };

        if located {
            in_place.insert(id.clone(), path.clone());
        }
    }

    tracing::debug!(
        source_root = %source_root,
        %mode,
        in_place = in_place.len(),
        "classified locations"
    );
    in_place
}

/// Union of [`classify_location`] over several project folders.
pub fn classify_locations<'a, I>(
    paths: &PathMap,
    root: &Path,
    source_subpaths: I,
    mode: LocationMatch,
) -> PathMap
where
    I: IntoIterator<Item = &'a str>,
{
    let mut in_place = PathMap::new();
    for subpath in source_subpaths {
        in_place.extend(classify_location(paths, root, subpath, mode));
    }
    in_place
}

/// Every directory at or below `root`, separator-normalized.
fn list_directories(root: &str) -> HashSet<String> {
    WalkDir::new(root)
        .parallelism(Parallelism::Serial)
        .skip_hidden(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| normalize_separators(&entry.path().to_string_lossy()))
        .collect()
}
