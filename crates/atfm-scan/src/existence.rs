//! Partition of references into existing and missing files.

use std::path::Path;

use atfm_core::{ClassificationResult, FileStatus, PathMap};

use crate::sequence::sequence_members;

/// Classify every non-empty reference as existing or missing.
///
/// Tagged references are expanded first, so each node may resolve to several
/// member files. The `existing`/`missing` maps keep the last member written
/// for each node; `statuses` records every member.
pub fn classify(paths: &PathMap) -> ClassificationResult {
    classify_with(paths, sequence_members)
}

/// Classify with a custom member resolver.
pub(crate) fn classify_with<F>(paths: &PathMap, mut members_of: F) -> ClassificationResult
where
    F: FnMut(&str) -> Vec<String>,
{
    let mut result = ClassificationResult::new();

    for (id, path) in paths {
        if path.is_empty() {
            continue;
        }

        let mut present = Vec::new();
        let mut missing = Vec::new();

        for member in members_of(path) {
            let exists = Path::new(&member).exists();
            result.record_member(id, member.clone(), exists);
            if exists {
                present.push(member);
            } else {
                missing.push(member);
            }
        }

        let status = FileStatus::from_members(present, missing);
        if status.is_ambiguous() {
            tracing::warn!(node = %id, %status, "sequence is partially present");
        } else {
            tracing::debug!(node = %id, %status, path = %path, "classified");
        }
        result.statuses.insert(id.clone(), status);
    }

    result
}
