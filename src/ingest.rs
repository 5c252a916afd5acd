//! Upload ingestion: place images and ZIP contents into a source folder.
//!
//! This is the file-level contract of the upload front end. It performs no
//! inference; the sorter picks the files up afterwards.

use crate::constants::ingest::{ARCHIVE_EXTENSION, IMAGE_EXTENSIONS};
use crate::error::{Error, Result};
use serde::Serialize;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Files written by one ingest call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Images copied as-is.
    pub images: Vec<PathBuf>,
    /// Files extracted from archives.
    pub extracted: Vec<PathBuf>,
}

impl IngestReport {
    /// Total files written.
    pub fn total(&self) -> usize {
        self.images.len() + self.extracted.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadKind {
    Image,
    Archive,
}

fn upload_kind(path: &Path) -> Option<UploadKind> {
    let ext = path.extension()?;
    if ext.eq_ignore_ascii_case(OsStr::new(ARCHIVE_EXTENSION)) {
        Some(UploadKind::Archive)
    } else if IMAGE_EXTENSIONS
        .iter()
        .any(|allowed| ext.eq_ignore_ascii_case(OsStr::new(allowed)))
    {
        Some(UploadKind::Image)
    } else {
        None
    }
}

/// Whether a path has an accepted image extension.
pub fn is_image_file(path: &Path) -> bool {
    upload_kind(path) == Some(UploadKind::Image)
}

/// Copy images and extract archives into `upload_dir`.
///
/// Every file is checked before anything is written, so one rejected file
/// leaves the upload folder untouched. Archive members are extracted flat
/// (directories inside the archive are dropped) and the archive itself is
/// not kept.
pub fn ingest_files(files: &[PathBuf], upload_dir: &Path) -> Result<IngestReport> {
    let mut plan = Vec::with_capacity(files.len());
    for file in files {
        let kind = upload_kind(file).ok_or_else(|| Error::UnsupportedUpload { path: file.clone() })?;
        plan.push((file, kind));
    }

    fs::create_dir_all(upload_dir)?;
    let mut report = IngestReport::default();

    for (file, kind) in plan {
        match kind {
            UploadKind::Image => {
                let name = file
                    .file_name()
                    .ok_or_else(|| Error::UnsupportedUpload { path: file.clone() })?;
                let target = upload_dir.join(name);
                fs::copy(file, &target)?;
                debug!("Stored {}", target.display());
                report.images.push(target);
            }
            UploadKind::Archive => {
                let extracted = extract_flat(file, upload_dir)?;
                info!(
                    "Extracted {} file(s) from {}",
                    extracted.len(),
                    file.display()
                );
                report.extracted.extend(extracted);
            }
        }
    }

    Ok(report)
}

fn extract_flat(archive_path: &Path, upload_dir: &Path) -> Result<Vec<PathBuf>> {
    let zip_error = |source: zip::result::ZipError| Error::ArchiveExtract {
        path: archive_path.to_path_buf(),
        source,
    };

    let mut archive = zip::ZipArchive::new(File::open(archive_path)?).map_err(zip_error)?;
    let mut extracted = Vec::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(zip_error)?;
        if entry.is_dir() {
            continue;
        }

        let Some(name) = entry
            .enclosed_name()
            .and_then(|path| path.file_name().map(ToOwned::to_owned))
        else {
            warn!("Skipping unsafe archive entry: {}", entry.name());
            continue;
        };

        let target = upload_dir.join(name);
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        extracted.push(target);
    }

    Ok(extracted)
}

/// Images currently in the upload folder, sorted by name.
pub fn list_uploads(upload_dir: &Path) -> Result<Vec<PathBuf>> {
    if !upload_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut images = Vec::new();
    for entry in fs::read_dir(upload_dir)? {
        let path = entry?.path();
        if path.is_file() && is_image_file(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// Delete every regular file in the upload folder. Returns how many were removed.
///
/// A file that cannot be removed is logged and left in place.
pub fn clear_uploads(upload_dir: &Path) -> Result<usize> {
    if !upload_dir.is_dir() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(upload_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to delete {}: {e}", path.display()),
        }
    }

    info!("Deleted {removed} file(s) from {}", upload_dir.display());
    Ok(removed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, data) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                zip.write_all(data).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_upload_kind_is_case_insensitive() {
        assert_eq!(upload_kind(Path::new("a.JPG")), Some(UploadKind::Image));
        assert_eq!(upload_kind(Path::new("a.jpeg")), Some(UploadKind::Image));
        assert_eq!(upload_kind(Path::new("batch.Zip")), Some(UploadKind::Archive));
        assert_eq!(upload_kind(Path::new("notes.txt")), None);
        assert_eq!(upload_kind(Path::new("noext")), None);
    }

    #[test]
    fn test_rejects_before_writing_anything() {
        let src = TempDir::new().unwrap();
        let uploads = TempDir::new().unwrap();
        let good = src.path().join("a.png");
        let bad = src.path().join("b.bmp");
        fs::write(&good, b"png").unwrap();
        fs::write(&bad, b"bmp").unwrap();

        let result = ingest_files(&[good, bad], uploads.path());

        assert!(matches!(result, Err(Error::UnsupportedUpload { .. })));
        assert_eq!(fs::read_dir(uploads.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_copies_images_and_extracts_archives_flat() {
        let src = TempDir::new().unwrap();
        let uploads = TempDir::new().unwrap();
        let image = src.path().join("cam1.jpg");
        fs::write(&image, b"jpg").unwrap();
        let archive = src.path().join("batch.zip");
        write_zip(
            &archive,
            &[
                ("night/", b""),
                ("night/cam2.png", b"png"),
                ("cam3.gif", b"gif"),
            ],
        );

        let report = ingest_files(&[image, archive], uploads.path()).unwrap();

        assert_eq!(report.total(), 3);
        assert_eq!(fs::read(uploads.path().join("cam2.png")).unwrap(), b"png");
        assert!(uploads.path().join("cam3.gif").is_file());
        assert!(!uploads.path().join("night").exists());
        assert!(!uploads.path().join("batch.zip").exists());
        assert_eq!(list_uploads(uploads.path()).unwrap().len(), 3);
    }

    #[test]
    fn test_corrupt_archive() {
        let src = TempDir::new().unwrap();
        let uploads = TempDir::new().unwrap();
        let archive = src.path().join("broken.zip");
        fs::write(&archive, b"not a zip").unwrap();

        let result = ingest_files(&[archive], uploads.path());
        assert!(matches!(result, Err(Error::ArchiveExtract { .. })));
    }

    #[test]
    fn test_clear_uploads_keeps_directories() {
        let uploads = TempDir::new().unwrap();
        fs::write(uploads.path().join("a.jpg"), b"a").unwrap();
        fs::write(uploads.path().join("b.txt"), b"b").unwrap();
        fs::create_dir(uploads.path().join("sub")).unwrap();

        assert_eq!(clear_uploads(uploads.path()).unwrap(), 2);
        assert!(uploads.path().join("sub").is_dir());
        assert_eq!(clear_uploads(Path::new("/nonexistent/uploads")).unwrap(), 0);
    }
}
