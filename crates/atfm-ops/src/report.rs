//! Outcome of a transfer batch.

use atfm_core::NodeId;
use serde::Serialize;

use crate::{OperationError, TransferMode};

/// Result of a completed transfer.
#[derive(Debug, Clone, Serialize)]
pub struct TransferReport {
    /// Copy or move.
    pub mode: TransferMode,
    /// Files written to their destination.
    pub transferred: usize,
    /// Files left alone because a conflict resolved to skip.
    pub skipped: usize,
    /// Files left alone because the destination won a conflict.
    pub kept_destination: usize,
    /// References already inside the destination.
    pub skipped_in_place: usize,
    /// Files that failed.
    pub failed: usize,
    /// Bytes written.
    pub bytes_processed: u64,
    /// Errors that occurred.
    pub errors: Vec<OperationError>,
    /// New path of every updated reference.
    pub updated_references: Vec<(NodeId, String)>,
}

impl TransferReport {
    /// Create an empty report.
    pub fn new(mode: TransferMode) -> Self {
        Self {
            mode,
            transferred: 0,
            skipped: 0,
            kept_destination: 0,
            skipped_in_place: 0,
            failed: 0,
            bytes_processed: 0,
            errors: Vec::new(),
            updated_references: Vec::new(),
        }
    }

    /// Record a failure.
    pub fn fail(&mut self, error: OperationError) {
        self.failed += 1;
        self.errors.push(error);
    }

    /// Check if the transfer was fully successful.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Get a human-readable summary of the transfer.
    pub fn summary(&self) -> String {
        let mut summary = format!("{} {} files", self.mode.past_tense(), self.transferred);
        let untouched = self.skipped + self.kept_destination;
        if untouched > 0 {
            summary.push_str(&format!(", {untouched} skipped"));
        }
        if self.skipped_in_place > 0 {
            summary.push_str(&format!(", {} already in place", self.skipped_in_place));
        }
        if self.failed > 0 {
            summary.push_str(&format!(", {} failed", self.failed));
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let mut report = TransferReport::new(TransferMode::Copy);
        report.transferred = 3;
        assert_eq!(report.summary(), "Copied 3 files");
        assert!(report.is_success());

        report.skipped = 1;
        report.skipped_in_place = 2;
        report.fail(OperationError::new("/a.png", "denied"));
        assert_eq!(
            report.summary(),
            "Copied 3 files, 1 skipped, 2 already in place, 1 failed"
        );
        assert!(!report.is_success());
    }
}
