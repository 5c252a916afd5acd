//! Single image processing: classify, then copy into the matching bucket.

use crate::ensemble::{EnsembleConfig, EnsembleEngine};
use crate::error::{Error, Result};
use crate::labels::ClassLabel;
use crate::pipeline::FolderSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Outcome of one successfully processed image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// Original file name.
    pub image_name: String,
    /// Assigned label.
    pub label: ClassLabel,
}

/// Classify one image and copy it, unmodified, into its class folder.
///
/// The source file is left in place. A same-named file already in the bucket
/// is overwritten.
pub fn process_image(
    path: &Path,
    folders: &FolderSet,
    engine: &EnsembleEngine,
    config: &EnsembleConfig,
) -> Result<ProcessResult> {
    let missing = || Error::ImageMissing {
        path: path.to_path_buf(),
    };

    if !path.is_file() {
        return Err(missing());
    }
    let file_name = path.file_name().ok_or_else(missing)?;

    let image = image::open(path).map_err(|source| Error::ImageRead {
        path: path.to_path_buf(),
        source,
    })?;

    let prediction = engine.evaluate(&image, config)?;
    debug!(
        "{}: {} (top {:.4}, fused {})",
        path.display(),
        prediction.label,
        prediction.top_probability,
        prediction.fused
    );

    let target = folders.path(prediction.label).join(file_name);
    copy_into(path, &target)?;

    Ok(ProcessResult {
        image_name: file_name.to_string_lossy().into_owned(),
        label: prediction.label,
    })
}

/// Copy `from` to `to`, removing a partially written target on failure.
fn copy_into(from: &Path, to: &Path) -> Result<()> {
    if let Err(source) = fs::copy(from, to) {
        if to.is_file()
            && let Err(e) = fs::remove_file(to)
        {
            warn!("Failed to remove partial copy {}: {e}", to.display());
        }
        return Err(Error::CopyFailed {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_into_overwrites() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("a.jpg");
        let to = dir.path().join("b.jpg");
        fs::write(&from, b"new").unwrap();
        fs::write(&to, b"old").unwrap();

        copy_into(&from, &to).unwrap();
        assert_eq!(fs::read(&to).unwrap(), b"new");
    }

    #[test]
    fn test_copy_into_missing_source() {
        let dir = TempDir::new().unwrap();
        let to = dir.path().join("b.jpg");

        let err = copy_into(&dir.path().join("gone.jpg"), &to).unwrap_err();
        assert!(matches!(err, Error::CopyFailed { .. }));
        assert!(err.is_per_image());
        assert!(!to.exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_copy_into_removes_partial_target() {
        // Opens as a regular file but every read fails with EIO
        let from = Path::new("/proc/self/mem");
        let dir = TempDir::new().unwrap();
        let to = dir.path().join("trap.jpg");

        let err = copy_into(from, &to).unwrap_err();
        assert!(matches!(err, Error::CopyFailed { .. }));
        assert!(!to.exists());
    }
}
