//! Destination planning for transfers.

use std::path::{Path, PathBuf};

use atfm_core::path::{file_name, normalize_separators, split_segments};
use atfm_core::NodeId;
use atfm_scan::sequence_members;

use crate::TransferMode;

/// Options shared by every reference in a transfer.
#[derive(Debug, Clone)]
pub struct TransferOptions {
    /// Folder files are transferred into.
    pub destination_root: PathBuf,
    /// Folder name marking where a source path's subfolders begin.
    pub source_folder_token: String,
    /// Recreate the subfolders found after the token.
    pub preserve_subfolders: bool,
    /// Report the new path of each transferred reference.
    pub update_references: bool,
    /// Copy or move.
    pub mode: TransferMode,
}

impl TransferOptions {
    /// Create options that flatten every file into `destination_root`.
    pub fn new(destination_root: impl Into<PathBuf>, mode: TransferMode) -> Self {
        Self {
            destination_root: destination_root.into(),
            source_folder_token: String::new(),
            preserve_subfolders: false,
            update_references: true,
            mode,
        }
    }

    /// Preserve the subfolders found after `token`.
    pub fn with_subfolders(mut self, token: impl Into<String>) -> Self {
        self.source_folder_token = token.into();
        self.preserve_subfolders = true;
        self
    }

    /// Set whether references are updated.
    pub fn with_update_references(mut self, update: bool) -> Self {
        self.update_references = update;
        self
    }
}

/// Everything needed to transfer one reference.
#[derive(Debug, Clone)]
pub struct TransferPlan {
    /// The node holding the reference.
    pub id: NodeId,
    /// The reference as stored on the node.
    pub source: String,
    /// Files the reference stands for.
    pub members: Vec<String>,
    /// Folder the members land in.
    pub destination_dir: PathBuf,
    /// Copy or move.
    pub mode: TransferMode,
}

impl TransferPlan {
    /// Source and destination of every member.
    pub fn pairs(&self) -> impl Iterator<Item = (PathBuf, PathBuf)> + '_ {
        self.members.iter().map(|member| {
            let destination = self.destination_dir.join(file_name(member));
            (PathBuf::from(member), destination)
        })
    }

    /// Subfolders of the destination that `destination_dir` adds.
    pub fn subfolders<'a>(&'a self, root: &'a Path) -> impl Iterator<Item = PathBuf> + 'a {
        let relative = self.destination_dir.strip_prefix(root).ok();
        relative
            .into_iter()
            .flat_map(|rel| rel.components())
            .scan(root.to_path_buf(), |dir, component| {
                dir.push(component);
                Some(dir.clone())
            })
    }

    /// The path the node should hold after the transfer.
    pub fn updated_reference(&self) -> String {
        let dir = normalize_separators(&self.destination_dir.to_string_lossy());
        let dir = dir.trim_end_matches('/');
        format!("{dir}/{}", file_name(&self.source))
    }
}

/// Folder a path lands in.
///
/// With `preserve_subfolders`, the segments between the token and the file
/// name are appended to the root; without the token, the root is used.
pub fn destination_directory(path: &str, options: &TransferOptions) -> PathBuf {
    let mut destination = options.destination_root.clone();
    if !options.preserve_subfolders || options.source_folder_token.is_empty() {
        return destination;
    }

    let segments = split_segments(path);
    let token = options.source_folder_token.trim_matches(['/', '\\']);
    if let Some(index) = segments.iter().position(|s| *s == token) {
        let last = segments.len().saturating_sub(1);
        for segment in &segments[index + 1..last.max(index + 1)] {
            destination.push(segment);
        }
    }

    destination
}

/// Plan the transfer of one reference.
pub fn plan_transfer(id: &NodeId, path: &str, options: &TransferOptions) -> TransferPlan {
    TransferPlan {
        id: id.clone(),
        source: path.to_string(),
        members: sequence_members(path),
        destination_dir: destination_directory(path, options),
        mode: options.mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> TransferOptions {
        TransferOptions::new("/proj/sourceimages", TransferMode::Copy)
    }

    #[test]
    fn test_flatten() {
        let dest = destination_directory("/old/sourceimages/wood/oak/bark.png", &options());
        assert_eq!(dest, PathBuf::from("/proj/sourceimages"));
    }

    #[test]
    fn test_preserve_subfolders() {
        let options = options().with_subfolders("sourceimages");
        let dest = destination_directory("/old/sourceimages/wood/oak/bark.png", &options);
        assert_eq!(dest, PathBuf::from("/proj/sourceimages/wood/oak"));

        let windows = destination_directory("D:\\old\\sourceimages\\wood\\bark.png", &options);
        assert_eq!(windows, PathBuf::from("/proj/sourceimages/wood"));
    }

    #[test]
    fn test_preserve_without_token_in_path() {
        let options = options().with_subfolders("sourceimages");
        let dest = destination_directory("/proj/renders/shots/sh010/tex/foo.png", &options);
        assert_eq!(dest, PathBuf::from("/proj/sourceimages"));
    }

    #[test]
    fn test_token_directly_above_file() {
        let options = options().with_subfolders("/sourceimages");
        let dest = destination_directory("/old/sourceimages/bark.png", &options);
        assert_eq!(dest, PathBuf::from("/proj/sourceimages"));
    }

    #[test]
    fn test_token_as_file_name() {
        let options = options().with_subfolders("sourceimages");
        let dest = destination_directory("/old/sourceimages", &options);
        assert_eq!(dest, PathBuf::from("/proj/sourceimages"));
    }

    #[test]
    fn test_plan_pairs_and_reference() {
        let options = options().with_subfolders("sourceimages");
        let plan = plan_transfer(
            &NodeId::new("file1"),
            "C:\\old\\sourceimages\\wood\\bark_<UDIM>.png",
            &options,
        );

        assert_eq!(plan.members.len(), 1);
        assert_eq!(
            plan.updated_reference(),
            "/proj/sourceimages/wood/bark_<UDIM>.png"
        );
        let (source, destination) = plan.pairs().next().unwrap();
        assert_eq!(source, PathBuf::from("C:\\old\\sourceimages\\wood\\bark_<UDIM>.png"));
        assert_eq!(destination, PathBuf::from("/proj/sourceimages/wood/bark_<UDIM>.png"));

        let root = PathBuf::from("/proj/sourceimages");
        let subfolders: Vec<PathBuf> = plan.subfolders(&root).collect();
        assert_eq!(subfolders, vec![PathBuf::from("/proj/sourceimages/wood")]);
    }
}
