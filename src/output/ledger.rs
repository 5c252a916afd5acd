//! Result ledger: one `img_name,class` row per classified image.

use crate::constants::LEDGER_HEADER;
use crate::error::{Error, Result};
use crate::labels::{ClassLabel, CodeScheme};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    /// Original file name of the image.
    #[serde(rename = "img_name")]
    pub image_name: String,
    /// Numeric class code under the ledger's code scheme.
    #[serde(rename = "class")]
    pub class_code: i32,
}

/// Records accumulated during one batch, written once at the end.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    records: Vec<ClassificationRecord>,
    scheme: CodeScheme,
}

impl Ledger {
    /// Empty ledger using the given code scheme.
    pub fn new(scheme: CodeScheme) -> Self {
        Self {
            records: Vec::new(),
            scheme,
        }
    }

    /// Append a prepared record.
    pub fn append(&mut self, record: ClassificationRecord) {
        self.records.push(record);
    }

    /// Append the outcome for an image, encoding the label with the ledger's scheme.
    pub fn record(&mut self, image_name: impl Into<String>, label: ClassLabel) {
        self.append(ClassificationRecord {
            image_name: image_name.into(),
            class_code: self.scheme.code(label),
        });
    }

    /// Records in append order.
    pub fn records(&self) -> &[ClassificationRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write the ledger, replacing any file at `path`.
    ///
    /// Rows go to a sibling temporary file that is renamed over `path`, so
    /// readers never observe a half-written ledger.
    pub fn flush(&self, path: &Path) -> Result<()> {
        let tmp = temp_path(path);
        let written = self
            .write_rows(&tmp)
            .map_err(|source| Error::LedgerWrite {
                path: path.to_path_buf(),
                source,
            })
            .and_then(|()| fs::rename(&tmp, path).map_err(Error::from));

        if written.is_err()
            && tmp.exists()
            && let Err(e) = fs::remove_file(&tmp)
        {
            warn!("Failed to remove {}: {e}", tmp.display());
        }
        written?;

        debug!("Wrote {} ledger rows to {}", self.records.len(), path.display());
        Ok(())
    }

    fn write_rows(&self, tmp: &Path) -> std::result::Result<(), csv::Error> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(tmp)?;

        writer.write_record(LEDGER_HEADER)?;
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Read a ledger written by [`Ledger::flush`].
pub fn read_ledger(path: &Path) -> Result<Vec<ClassificationRecord>> {
    let read_error = |source: csv::Error| Error::LedgerRead {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(read_error)?;

    reader
        .deserialize::<ClassificationRecord>()
        .map(|row| row.map_err(read_error))
        .collect()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
