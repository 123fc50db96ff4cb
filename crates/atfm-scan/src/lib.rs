//! File reference classification engine for atfm.
//!
//! # Overview
//!
//! `atfm-scan` answers three questions about the file paths held by scene
//! nodes:
//!
//! - **Is it a tiled sequence?** [`detect_tag`] recognises UDIM / UV-tile
//!   tokens and [`expand_sequence`] lists the tiles on disk.
//! - **Does it exist?** [`classify`] partitions references into existing and
//!   missing, expanding sequences first.
//! - **Is it in place?** [`classify_location`] finds references already
//!   inside a designated project folder.
//!
//! Missing files can be looked for across whole drives with
//! [`search_for_files`], or in the background with [`start_search`].
//!
//! # Example
//!
//! ```rust,no_run
//! use atfm_scan::{classify, detect_tag, PathMap, NodeId};
//!
//! let tag = detect_tag("wall_<UDIM>.exr").unwrap();
//! assert_eq!(tag.prefix, "wall_");
//!
//! let mut paths = PathMap::new();
//! paths.insert(NodeId::new("file1"), "/proj/sourceimages/wall_<UDIM>.exr".into());
//! let result = classify(&paths);
//! println!("{} existing, {} missing", result.existing.len(), result.missing.len());
//! ```

mod existence;
mod location;
mod search;
mod sequence;
mod tag;

pub use existence::classify;
pub use location::{classify_location, classify_locations, source_root};
pub use search::{
    search_for_files, start_search, SearchEvent, SearchOutcome, SearchProgress,
    SEARCH_CHANNEL_SIZE,
};
pub use sequence::{expand_sequence, sequence_members};
pub use tag::{detect_tag, tag_pattern, SequenceTag};

// Re-export core types for convenience
pub use atfm_core::{ClassificationResult, FileStatus, LocationMatch, NodeId, PathMap};
