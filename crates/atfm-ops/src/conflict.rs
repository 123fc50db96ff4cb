//! Conflict detection and resolution for transfers.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Size and modification time of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStats {
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: SystemTime,
}

impl FileStats {
    /// Read the stats of a file.
    pub fn read(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        Ok(Self {
            size: metadata.len(),
            modified: metadata.modified()?,
        })
    }
}

/// The kind of conflict encountered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictKind {
    /// Destination has the same size and modification time.
    Identical,
    /// Destination differs in size or modification time.
    Differing,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identical => write!(f, "File already exists and appears to be the same"),
            Self::Differing => write!(f, "A different file with the same name already exists"),
        }
    }
}

/// How to resolve a conflict.
///
/// The string forms are the labels offered to the user, and parse back.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Default,
    Display,
    EnumString,
)]
pub enum ConflictResolution {
    /// Replace the destination with the source.
    #[strum(to_string = "Overwrite", serialize = "overwrite")]
    Overwrite,
    /// Keep whichever file was modified last.
    #[strum(to_string = "Use Latest", serialize = "use-latest")]
    UseLatest,
    /// Keep whichever file is larger.
    #[strum(to_string = "Use Largest", serialize = "use-largest")]
    UseLargest,
    /// Leave the destination untouched.
    #[default]
    #[strum(to_string = "Skip", serialize = "skip")]
    Skip,
}

/// What the executor does with a conflicting member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Transfer the source over the destination.
    Transfer,
    /// The destination wins; nothing is written.
    KeepDestination,
    /// Skip this member.
    Skip,
}

/// A conflict detected during a transfer.
#[derive(Debug, Clone)]
pub struct Conflict {
    /// The source path being transferred.
    pub source: PathBuf,
    /// The destination path where the conflict exists.
    pub destination: PathBuf,
    /// The kind of conflict.
    pub kind: ConflictKind,
    /// Stats of the source file.
    pub source_stats: FileStats,
    /// Stats of the existing destination file.
    pub destination_stats: FileStats,
}

impl Conflict {
    /// Compare a source with an existing destination.
    pub fn new(
        source: PathBuf,
        destination: PathBuf,
        source_stats: FileStats,
        destination_stats: FileStats,
    ) -> Self {
        let kind = if source_stats == destination_stats {
            ConflictKind::Identical
        } else {
            ConflictKind::Differing
        };
        Self {
            source,
            destination,
            kind,
            source_stats,
            destination_stats,
        }
    }

    /// Read both files' stats and build the conflict.
    pub fn detect(source: &Path, destination: &Path) -> io::Result<Self> {
        Ok(Self::new(
            source.to_path_buf(),
            destination.to_path_buf(),
            FileStats::read(source)?,
            FileStats::read(destination)?,
        ))
    }

    /// The choices offered for this conflict.
    pub fn choices(&self) -> &'static [ConflictResolution] {
        match self.kind {
            ConflictKind::Identical => &[ConflictResolution::Overwrite, ConflictResolution::Skip],
            ConflictKind::Differing => &[
                ConflictResolution::Overwrite,
                ConflictResolution::UseLatest,
                ConflictResolution::UseLargest,
                ConflictResolution::Skip,
            ],
        }
    }

    /// The preselected choice.
    pub fn default_choice(&self) -> ConflictResolution {
        ConflictResolution::Overwrite
    }

    /// Message shown to the user.
    pub fn message(&self) -> String {
        let name = self
            .destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match self.kind {
            ConflictKind::Identical => format!(
                "The file {name} already exists and appears to be the same in both locations. \
                 How would you like to proceed?"
            ),
            ConflictKind::Differing => format!(
                "There is already a file with the name {name} in the destination folder. \
                 How would you like to proceed?"
            ),
        }
    }

    /// Turn a chosen resolution into an action.
    ///
    /// No choice, or a choice not offered for this conflict, skips.
    pub fn decide(&self, choice: Option<ConflictResolution>) -> Decision {
        let Some(choice) = choice.filter(|c| self.choices().contains(c)) else {
            return Decision::Skip;
        };

        match choice {
            ConflictResolution::Overwrite => Decision::Transfer,
            ConflictResolution::UseLatest => {
                if self.source_stats.modified > self.destination_stats.modified {
                    Decision::Transfer
                } else {
                    Decision::KeepDestination
                }
            }
            ConflictResolution::UseLargest => {
                if self.source_stats.size > self.destination_stats.size {
                    Decision::Transfer
                } else {
                    Decision::KeepDestination
                }
            }
            ConflictResolution::Skip => Decision::Skip,
        }
    }
}

/// Source of conflict resolutions, usually a user prompt.
pub trait ConflictPrompt {
    /// Choose how to resolve `conflict`; `None` means the prompt was dismissed.
    fn resolve(&mut self, conflict: &Conflict) -> Option<ConflictResolution>;
}

/// Resolves every conflict with the same policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyPrompt(pub ConflictResolution);

impl ConflictPrompt for PolicyPrompt {
    fn resolve(&mut self, _conflict: &Conflict) -> Option<ConflictResolution> {
        Some(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn stats(size: u64, secs: u64) -> FileStats {
        FileStats {
            size,
            modified: SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
        }
    }

    fn conflict(source: FileStats, destination: FileStats) -> Conflict {
        Conflict::new("/src/a.png".into(), "/dst/a.png".into(), source, destination)
    }

    #[test]
    fn test_identical_choices() {
        let c = conflict(stats(10, 100), stats(10, 100));
        assert_eq!(c.kind, ConflictKind::Identical);
        assert_eq!(
            c.choices(),
            [ConflictResolution::Overwrite, ConflictResolution::Skip]
        );
        assert_eq!(c.default_choice(), ConflictResolution::Overwrite);
        assert!(c.message().contains("a.png"));
    }

    #[test]
    fn test_differing_choices() {
        let c = conflict(stats(10, 100), stats(10, 200));
        assert_eq!(c.kind, ConflictKind::Differing);
        assert_eq!(c.choices().len(), 4);
    }

    #[test]
    fn test_use_latest() {
        let newer_source = conflict(stats(10, 200), stats(10, 100));
        assert_eq!(
            newer_source.decide(Some(ConflictResolution::UseLatest)),
            Decision::Transfer
        );
        let older_source = conflict(stats(10, 100), stats(10, 200));
        assert_eq!(
            older_source.decide(Some(ConflictResolution::UseLatest)),
            Decision::KeepDestination
        );
    }

    #[test]
    fn test_use_largest_requires_strictly_larger() {
        let larger = conflict(stats(20, 100), stats(10, 200));
        assert_eq!(larger.decide(Some(ConflictResolution::UseLargest)), Decision::Transfer);
        let same = conflict(stats(10, 100), stats(10, 200));
        assert_eq!(
            same.decide(Some(ConflictResolution::UseLargest)),
            Decision::KeepDestination
        );
    }

    #[test]
    fn test_dismissed_or_unoffered_skips() {
        let c = conflict(stats(10, 100), stats(10, 100));
        assert_eq!(c.decide(None), Decision::Skip);
        assert_eq!(c.decide(Some(ConflictResolution::UseLatest)), Decision::Skip);
        assert_eq!(c.decide(Some(ConflictResolution::Overwrite)), Decision::Transfer);
    }

    #[test]
    fn test_labels_round_trip() {
        assert_eq!(ConflictResolution::UseLatest.to_string(), "Use Latest");
        assert_eq!(
            "Use Largest".parse::<ConflictResolution>().unwrap(),
            ConflictResolution::UseLargest
        );
        assert_eq!(
            "use-latest".parse::<ConflictResolution>().unwrap(),
            ConflictResolution::UseLatest
        );
        assert!("Nevermind".parse::<ConflictResolution>().is_err());
    }
}
