//! Classification results for a set of file references.

use serde::{Deserialize, Serialize};

use crate::{NodeId, PathMap};

/// Unambiguous on-disk status of one node's reference.
///
/// A tiled sequence resolves to several member files; `PartiallyPresent`
/// records the case where only some of them exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    /// Every member file exists.
    Present { members: Vec<String> },
    /// No member file exists.
    Absent { members: Vec<String> },
    /// Some members exist and some do not.
    PartiallyPresent {
        present: Vec<String>,
        missing: Vec<String>,
    },
}

impl FileStatus {
    /// Build a status from the members found and not found on disk.
    pub fn from_members(present: Vec<String>, missing: Vec<String>) -> Self {
        match (present.is_empty(), missing.is_empty()) {
            (false, true) => Self::Present { members: present },
            (true, _) => Self::Absent { members: missing },
            (false, false) => Self::PartiallyPresent { present, missing },
        }
    }

    /// Check if at least one member exists.
    pub fn any_present(&self) -> bool {
        !matches!(self, Self::Absent { .. })
    }

    /// Check if the status is neither clearly present nor clearly absent.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::PartiallyPresent { .. })
    }

    /// Members that exist on disk.
    pub fn present_members(&self) -> &[String] {
        match self {
            Self::Present { members } => members,
            Self::Absent { .. } => &[],
            Self::PartiallyPresent { present, .. } => present,
        }
    }

    /// Members that are missing from disk.
    pub fn missing_members(&self) -> &[String] {
        match self {
            Self::Present { .. } => &[],
            Self::Absent { members } => members,
            Self::PartiallyPresent { missing, .. } => missing,
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Present { .. } => write!(f, "present"),
            Self::Absent { .. } => write!(f, "missing"),
            Self::PartiallyPresent { present, missing } => write!(
                f,
                "partial ({} of {} present)",
                present.len(),
                present.len() + missing.len()
            ),
        }
    }
}

/// Existing/missing/in-place partition of a set of references.
///
/// `existing` and `missing` are keyed per node with the last member path
/// written winning, so a partially present sequence appears in both maps.
/// `statuses` carries the full per-member picture. `in_place` annotates
/// references already inside their designated folder and may overlap
/// either map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Nodes with at least one existing member.
    pub existing: PathMap,
    /// Nodes with at least one missing member.
    pub missing: PathMap,
    /// Nodes whose file already sits under its designated folder.
    pub in_place: PathMap,
    /// Per-node member status.
    pub statuses: indexmap::IndexMap<NodeId, FileStatus>,
}

impl ClassificationResult {
    /// Create an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one member path for a node.
    pub fn record_member(&mut self, id: &NodeId, member: String, exists: bool) {
        if exists {
            self.existing.insert(id.clone(), member);
        } else {
            self.missing.insert(id.clone(), member);
        }
    }

    /// Get the status of a node, if it was classified.
    pub fn status(&self, id: &NodeId) -> Option<&FileStatus> {
        self.statuses.get(id)
    }

    /// Check if a node's path is already in place.
    pub fn is_in_place(&self, id: &NodeId) -> bool {
        self.in_place.contains_key(id)
    }

    /// Nodes whose status is ambiguous.
    pub fn ambiguous(&self) -> impl Iterator<Item = (&NodeId, &FileStatus)> {
        self.statuses.iter().filter(|(_, s)| s.is_ambiguous())
    }

    /// Number of classified nodes.
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    /// Check if nothing was classified.
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_members() {
        let present = FileStatus::from_members(vec!["a".into()], vec![]);
        assert!(matches!(present, FileStatus::Present { .. }));

        let absent = FileStatus::from_members(vec![], vec!["a".into()]);
        assert!(!absent.any_present());

        let partial = FileStatus::from_members(vec!["a".into()], vec!["b".into()]);
        assert!(partial.is_ambiguous());
        assert_eq!(partial.present_members(), ["a".to_string()]);
        assert_eq!(partial.missing_members(), ["b".to_string()]);
        assert_eq!(partial.to_string(), "partial (1 of 2 present)");
    }

    #[test]
    fn test_record_member_last_write_wins() {
        let mut result = ClassificationResult::new();
        let id = NodeId::new("n1");
        result.record_member(&id, "a".into(), true);
        result.record_member(&id, "b".into(), false);
        result.record_member(&id, "c".into(), true);

        assert_eq!(result.existing.get(&id).map(String::as_str), Some("c"));
        assert_eq!(result.missing.get(&id).map(String::as_str), Some("b"));
    }
}
