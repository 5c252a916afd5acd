//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "cervid";

/// Default weight of detection-derived probabilities in the fused vector.
pub const DEFAULT_ALPHA: f32 = 0.5;

/// Default per-detection confidence floor.
pub const DEFAULT_CONFIDENCE: f32 = 0.7;

/// Default minimum fused top-class probability for a non-uncertain decision.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Default number of sorting workers.
pub const DEFAULT_JOBS: usize = 1;

/// Upper bound on sorting workers.
pub const MAX_JOBS: usize = 64;

/// Default ledger file name, written into the destination root.
pub const DEFAULT_LEDGER_NAME: &str = "results.csv";

/// Ledger column headers, in file order.
pub const LEDGER_HEADER: [&str; 2] = ["img_name", "class"];

/// Ledger code recorded for images sorted into the uncertain folder.
pub const UNCERTAIN_CODE: i32 = -1;

/// Confidence value bounds.
pub mod confidence {
    /// Minimum valid confidence value.
    pub const MIN: f32 = 0.0;
    /// Maximum valid confidence value.
    pub const MAX: f32 = 1.0;
    /// Decimal places for probability formatting in logs.
    pub const DECIMAL_PLACES: usize = 4;
}

/// Detection model constants (YOLOv8 export layout).
pub mod detector {
    /// Square input size in pixels.
    pub const INPUT_SIZE: u32 = 640;
    /// Letterbox padding value.
    pub const PAD_VALUE: u8 = 114;
    /// Candidates below this score never reach the ensemble.
    pub const PRE_FLOOR: f32 = 0.25;
    /// IoU above which overlapping boxes of one class are suppressed.
    pub const NMS_IOU: f32 = 0.7;
    /// Maximum detections kept per image.
    pub const MAX_DETECTIONS: usize = 300;
    /// Box coordinate rows preceding class scores in the output tensor.
    pub const BOX_ROWS: usize = 4;
}

/// Classification model constants (YOLOv8-cls export layout).
pub mod classifier {
    /// Square input size in pixels.
    pub const INPUT_SIZE: u32 = 224;
}

/// Upload ingestion constants.
pub mod ingest {
    /// Accepted image extensions (lowercase).
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];
    /// Archive extension extracted flat into the upload directory.
    pub const ARCHIVE_EXTENSION: &str = "zip";
}
