//! Expansion of a tagged path into the tile files present on disk.

use std::fs;
use std::path::Path;

use atfm_core::path::{file_name, join, normalize_separators, split_parent};

use crate::tag::{detect_tag, SequenceTag};

/// List the files next to `path` that belong to the same sequence as `tag`.
///
/// A sibling belongs when its own tag has the same prefix and suffix. The
/// result is in directory-listing order and is empty when the directory does
/// not exist.
pub fn expand_sequence(path: &str, tag: &SequenceTag) -> Vec<String> {
    let normalized = normalize_separators(path);
    let Some((dir, _)) = split_parent(&normalized) else {
        return Vec::new();
    };
    // "/file.png" splits into an empty directory
    let dir = if dir.is_empty() { "/" } else { dir };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir, "cannot list sequence directory: {e}");
            return Vec::new();
        }
    };

    let mut members = Vec::new();
    for entry in entries.flatten() {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let candidate = join(dir, &name);
        if !Path::new(&candidate).is_file() {
            continue;
        }
        if tag.matches_name(&name) {
            members.push(candidate);
        }
    }

    members
}

/// The files a reference stands for.
///
/// Untagged paths, and tagged paths whose expansion is empty, stand for
/// themselves.
pub fn sequence_members(path: &str) -> Vec<String> {
    let Some(tag) = detect_tag(file_name(path)) else {
        return vec![path.to_string()];
    };

    let members = expand_sequence(path, &tag);
    if members.is_empty() {
        vec![path.to_string()]
    } else {
        members
    }
}
