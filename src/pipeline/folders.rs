//! Destination class folders.

use crate::error::{Error, Result};
use crate::labels::{ALL, ClassLabel};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The four class buckets under a destination root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderSet {
    root: PathBuf,
    folders: [PathBuf; 4],
}

impl FolderSet {
    /// Resolve bucket paths without touching the filesystem.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            folders: ALL.map(|label| root.join(label.folder_name())),
        }
    }

    /// Resolve bucket paths and create any that are missing.
    ///
    /// Existing folders and their contents are left alone.
    pub fn create(root: &Path) -> Result<Self> {
        let set = Self::new(root);
        for folder in &set.folders {
            fs::create_dir_all(folder).map_err(|source| Error::DestinationCreate {
                path: folder.clone(),
                source,
            })?;
        }
        debug!("Destination folders ready under {}", root.display());
        Ok(set)
    }

    /// Destination root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Bucket for a label.
    pub fn path(&self, label: ClassLabel) -> &Path {
        let slot = match label {
            ClassLabel::Deer => 0,
            ClassLabel::MuskDeer => 1,
            ClassLabel::RoeDeer => 2,
            ClassLabel::Uncertain => 3,
        };
        &self.folders[slot]
    }

    /// All buckets: deer, musk deer, roe deer, uncertain.
    pub fn paths(&self) -> &[PathBuf; 4] {
        &self.folders
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths_follow_label_order() {
        let set = FolderSet::new(Path::new("/out"));
        for (label, path) in ALL.iter().zip(set.paths()) {
            assert_eq!(set.path(*label), path);
            assert_eq!(path, &Path::new("/out").join(label.folder_name()));
        }
    }

    #[test]
    fn test_create_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("classified");

        let first = FolderSet::create(&root).unwrap();
        let kept = first.path(ClassLabel::Deer).join("keep.jpg");
        fs::write(&kept, b"x").unwrap();

        let second = FolderSet::create(&root).unwrap();
        assert_eq!(first, second);
        assert!(kept.exists());
        assert!(second.paths().iter().all(|p| p.is_dir()));
    }

    #[test]
    fn test_create_fails_when_root_is_a_file() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("not-a-dir");
        fs::write(&root, b"x").unwrap();

        let result = FolderSet::create(&root);
        assert!(matches!(result, Err(Error::DestinationCreate { .. })));
    }
}
