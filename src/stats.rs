//! Per-bucket statistics and manual relabelling of sorted images.

use crate::error::{Error, Result};
use crate::labels::{ALL, ClassLabel};
use crate::pipeline::FolderSet;
use serde::Serialize;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Image count per class bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClassCounts {
    /// Red deer.
    pub deer: usize,
    /// Musk deer.
    pub musk_deer: usize,
    /// Roe deer.
    pub roe_deer: usize,
    /// Below the confidence threshold.
    pub uncertain: usize,
}

impl ClassCounts {
    /// Count one more image for `label`.
    pub fn increment(&mut self, label: ClassLabel) {
        *self.slot(label) += 1;
    }

    /// Count for `label`.
    pub fn get(&self, label: ClassLabel) -> usize {
        match label {
            ClassLabel::Deer => self.deer,
            ClassLabel::MuskDeer => self.musk_deer,
            ClassLabel::RoeDeer => self.roe_deer,
            ClassLabel::Uncertain => self.uncertain,
        }
    }

    /// Sum over every bucket.
    pub fn total(&self) -> usize {
        ALL.iter().map(|label| self.get(*label)).sum()
    }

    fn slot(&mut self, label: ClassLabel) -> &mut usize {
        match label {
            ClassLabel::Deer => &mut self.deer,
            ClassLabel::MuskDeer => &mut self.musk_deer,
            ClassLabel::RoeDeer => &mut self.roe_deer,
            ClassLabel::Uncertain => &mut self.uncertain,
        }
    }
}

/// Count regular files in each bucket. Missing buckets count as empty.
pub fn count_folders(folders: &FolderSet) -> Result<ClassCounts> {
    let mut counts = ClassCounts::default();

    for label in ALL {
        let dir = folders.path(label);
        if !dir.is_dir() {
            continue;
        }
        for entry in fs::read_dir(dir)? {
            if entry?.file_type()?.is_file() {
                counts.increment(label);
            }
        }
    }

    Ok(counts)
}

/// Move a sorted image from one bucket to another.
///
/// Returns the new location. Overwrites a same-named file in the target bucket.
pub fn relabel(
    dest_root: &Path,
    file_name: &str,
    from: ClassLabel,
    to: ClassLabel,
) -> Result<PathBuf> {
    let folders = FolderSet::create(dest_root)?;
    let source = folders.path(from).join(file_name);

    if Path::new(file_name).file_name() != Some(OsStr::new(file_name)) || !source.is_file() {
        return Err(Error::RelabelSourceMissing {
            file: file_name.to_string(),
            folder: folders.path(from).to_path_buf(),
        });
    }

    let target = folders.path(to).join(file_name);
    if source != target {
        fs::rename(&source, &target)?;
        info!("Relabelled {file_name}: {from} -> {to}");
    }
    Ok(target)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_counts_ignore_subdirectories() {
        let dir = TempDir::new().unwrap();
        let folders = FolderSet::create(dir.path()).unwrap();
        fs::write(folders.path(ClassLabel::Deer).join("a.jpg"), b"a").unwrap();
        fs::write(folders.path(ClassLabel::Deer).join("b.jpg"), b"b").unwrap();
        fs::write(folders.path(ClassLabel::Uncertain).join("c.jpg"), b"c").unwrap();
        fs::create_dir(folders.path(ClassLabel::RoeDeer).join("nested")).unwrap();

        let counts = count_folders(&folders).unwrap();
        assert_eq!(counts.deer, 2);
        assert_eq!(counts.roe_deer, 0);
        assert_eq!(counts.uncertain, 1);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_counts_of_missing_root_are_zero() {
        let folders = FolderSet::new(Path::new("/nonexistent/classified"));
        assert_eq!(count_folders(&folders).unwrap(), ClassCounts::default());
    }

    #[test]
    fn test_relabel_moves_between_buckets() {
        let dir = TempDir::new().unwrap();
        let folders = FolderSet::create(dir.path()).unwrap();
        let original = folders.path(ClassLabel::Uncertain).join("trap.jpg");
        fs::write(&original, b"img").unwrap();

        let moved = relabel(dir.path(), "trap.jpg", ClassLabel::Uncertain, ClassLabel::RoeDeer)
            .unwrap();

        assert!(!original.exists());
        assert_eq!(moved, folders.path(ClassLabel::RoeDeer).join("trap.jpg"));
        assert_eq!(fs::read(moved).unwrap(), b"img");
    }

    #[test]
    fn test_relabel_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = relabel(dir.path(), "ghost.jpg", ClassLabel::Uncertain, ClassLabel::Deer);
        assert!(matches!(result, Err(Error::RelabelSourceMissing { .. })));
    }

    #[test]
    fn test_relabel_rejects_paths() {
        let dir = TempDir::new().unwrap();
        let result = relabel(dir.path(), "../x.jpg", ClassLabel::Uncertain, ClassLabel::Deer);
        assert!(matches!(result, Err(Error::RelabelSourceMissing { .. })));
    }

    #[test]
    fn test_increment_and_serialize() {
        let mut counts = ClassCounts::default();
        counts.increment(ClassLabel::MuskDeer);
        counts.increment(ClassLabel::MuskDeer);

        let json = serde_json::to_value(counts).unwrap();
        assert_eq!(json["musk-deer"], 2);
        assert_eq!(json["deer"], 0);
    }
}
