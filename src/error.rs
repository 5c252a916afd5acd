//! Error types for cervid.

use std::path::PathBuf;

/// Result type alias for cervid operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for cervid.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// An adapter was constructed without any model.
    #[error("no {kind} models configured")]
    NoModels {
        /// Adapter kind ("detection" or "classification").
        kind: &'static str,
    },

    /// A model reports a different number of classes than the ensemble expects.
    #[error("{kind} model '{model}' reports {found} classes, expected {expected}")]
    ClassCountMismatch {
        /// Adapter kind.
        kind: &'static str,
        /// Offending model name.
        model: String,
        /// Expected class count.
        expected: usize,
        /// Class count reported by the model.
        found: usize,
    },

    /// A model does not list its classes in the trained species order.
    #[error("{kind} model '{model}' class order {found:?} differs from {expected:?}")]
    ClassOrderMismatch {
        /// Adapter kind.
        kind: &'static str,
        /// Offending model name.
        model: String,
        /// Trained species order (deer, musk-deer, roe-deer).
        expected: Vec<String>,
        /// Label order of the offending model.
        found: Vec<String>,
    },

    /// Model file does not exist.
    #[error("model file does not exist: {path}")]
    ModelFileNotFound {
        /// Path to the missing model file.
        path: PathBuf,
    },

    /// Labels file does not exist.
    #[error("labels file does not exist: {path}")]
    LabelsFileNotFound {
        /// Path to the missing labels file.
        path: PathBuf,
    },

    /// Failed to read a labels file.
    #[error("failed to read labels file '{path}'")]
    LabelsRead {
        /// Path to the labels file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to load an ONNX model.
    #[error("failed to load model '{path}': {reason}")]
    ModelLoad {
        /// Path to the model file.
        path: PathBuf,
        /// Description of the load failure.
        reason: String,
    },

    /// Source directory could not be listed.
    #[error("failed to read source directory '{path}'")]
    SourceDirRead {
        /// Path to the source directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Destination root or a class folder could not be created.
    #[error("failed to create destination folder '{path}'")]
    DestinationCreate {
        /// Folder that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Image vanished or is not a regular file at processing time.
    #[error("image not found: {path}")]
    ImageMissing {
        /// Path to the missing image.
        path: PathBuf,
    },

    /// Image could not be read or decoded.
    #[error("failed to read image '{path}'")]
    ImageRead {
        /// Path to the image.
        path: PathBuf,
        /// Underlying decode error.
        #[source]
        source: image::ImageError,
    },

    /// Inference failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Description of the inference failure.
        reason: String,
    },

    /// Copying an image into its class folder failed.
    #[error("failed to copy '{from}' to '{to}'")]
    CopyFailed {
        /// Source image.
        from: PathBuf,
        /// Destination path.
        to: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the result ledger.
    #[error("failed to write ledger '{path}'")]
    LedgerWrite {
        /// Path to the ledger file.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// Failed to read the result ledger.
    #[error("failed to read ledger '{path}'")]
    LedgerRead {
        /// Path to the ledger file.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// Upload has an extension outside the accepted set.
    #[error("invalid file type '{path}': only images and ZIP files are allowed")]
    UnsupportedUpload {
        /// Rejected file.
        path: PathBuf,
    },

    /// ZIP archive could not be read.
    #[error("failed to extract archive '{path}'")]
    ArchiveExtract {
        /// Path to the archive.
        path: PathBuf,
        /// Underlying ZIP error.
        #[source]
        source: zip::result::ZipError,
    },

    /// Unknown class name.
    #[error("unknown class '{value}' (expected deer, musk-deer, roe-deer or uncertain)")]
    UnknownClass {
        /// Invalid value.
        value: String,
    },

    /// Image to relabel is not in its bucket.
    #[error("'{file}' not found in class folder '{folder}'")]
    RelabelSourceMissing {
        /// File name.
        file: String,
        /// Folder that was searched.
        folder: PathBuf,
    },

    /// Failed to start the sorting worker pool.
    #[error("failed to start {threads} sorting worker(s)")]
    WorkerPool {
        /// Requested worker count.
        threads: usize,
        /// Underlying pool error.
        #[source]
        source: rayon::ThreadPoolBuildError,
    },

    /// Failed to write the JSON summary.
    #[error("failed to write JSON summary")]
    JsonWrite {
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Whether the error concerns a single image and must not abort a batch.
    pub fn is_per_image(&self) -> bool {
        matches!(
            self,
            Self::ImageMissing { .. }
                | Self::ImageRead { .. }
                | Self::Inference { .. }
                | Self::CopyFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_image_classification() {
        let missing = Error::ImageMissing {
            path: PathBuf::from("a.png"),
        };
        let inference = Error::Inference {
            reason: "boom".to_string(),
        };
        let destination = Error::DestinationCreate {
            path: PathBuf::from("/out"),
            source: std::io::Error::other("read-only"),
        };

        assert!(missing.is_per_image());
        assert!(inference.is_per_image());
        assert!(!destination.is_per_image());
        assert!(!Error::NoModels { kind: "detection" }.is_per_image());
    }
}
