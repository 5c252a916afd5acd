//! YOLO object-detection model backed by ONNX Runtime.

use crate::config::ModelConfig;
use crate::constants::detector::{
    BOX_ROWS, INPUT_SIZE, MAX_DETECTIONS, NMS_IOU, PAD_VALUE, PRE_FLOOR,
};
use crate::error::{Error, Result};
use crate::inference::preprocess::{Letterbox, letterbox};
use crate::inference::session::{OnnxSession, SessionOptions, read_labels};
use crate::inference::{BoundingBox, DetectionModel, ObjectDetection};
use image::DynamicImage;
use tracing::debug;

/// Detection model exported in the YOLOv8 layout: `[1, 4 + classes, anchors]`.
pub struct OnnxDetector {
    name: String,
    labels: Vec<String>,
    session: OnnxSession,
}

impl OnnxDetector {
    /// Load the model and its labels.
    pub fn load(model: &ModelConfig, options: SessionOptions) -> Result<Self> {
        let labels = read_labels(&model.labels)?;
        let session = OnnxSession::load(&model.path, options)?;
        Ok(Self {
            name: model.name.clone(),
            labels,
            session,
        })
    }
}

impl DetectionModel for OnnxDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn detect(&self, image: &DynamicImage) -> Result<Vec<ObjectDetection>> {
        let (input, geometry) = letterbox(image, INPUT_SIZE, PAD_VALUE);
        let size = INPUT_SIZE as usize;
        let (dims, output) = self.session.run([1, 3, size, size], input)?;

        let candidates = decode_output(&dims, &output, self.labels.len(), &geometry)?;
        let kept = non_max_suppression(candidates, NMS_IOU, MAX_DETECTIONS);
        debug!("{}: {} detections after NMS", self.name, kept.len());
        Ok(kept)
    }
}

/// Turn the raw output tensor into scored candidates above the pre-floor.
fn decode_output(
    dims: &[i64],
    output: &[f32],
    classes: usize,
    geometry: &Letterbox,
) -> Result<Vec<ObjectDetection>> {
    let shape_error = || Error::Inference {
        reason: format!(
            "unexpected detection output shape {dims:?} for {classes} classes (expected [1, {}, N])",
            BOX_ROWS + classes
        ),
    };

    let [batch, rows, anchors] = dims else {
        return Err(shape_error());
    };
    let rows = usize::try_from(*rows).map_err(|_| shape_error())?;
    let anchors = usize::try_from(*anchors).map_err(|_| shape_error())?;
    if *batch != 1 || rows != BOX_ROWS + classes || output.len() != rows * anchors {
        return Err(shape_error());
    }

    let at = |row: usize, anchor: usize| output[row * anchors + anchor];
    let mut candidates = Vec::new();

    for anchor in 0..anchors {
        let mut best = (0, f32::MIN);
        for class in 0..classes {
            let score = at(BOX_ROWS + class, anchor);
            if score > best.1 {
                best = (class, score);
            }
        }

        let (class_index, confidence) = best;
        if confidence <= PRE_FLOOR {
            continue;
        }

        let (cx, cy, w, h) = (at(0, anchor), at(1, anchor), at(2, anchor), at(3, anchor));
        candidates.push(ObjectDetection {
            class_index,
            confidence,
            bbox: BoundingBox {
                x1: geometry.unmap_x(cx - w / 2.0),
                y1: geometry.unmap_y(cy - h / 2.0),
                x2: geometry.unmap_x(cx + w / 2.0),
                y2: geometry.unmap_y(cy + h / 2.0),
            },
        });
    }

    Ok(candidates)
}

/// Greedy per-class suppression, highest confidence first.
fn non_max_suppression(
    mut candidates: Vec<ObjectDetection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<ObjectDetection> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<ObjectDetection> = Vec::new();
    for candidate in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept.iter().any(|k| {
            k.class_index == candidate.class_index && k.bbox.iou(&candidate.bbox) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}
