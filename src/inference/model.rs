//! Model handle traits shared by the ONNX models and test doubles.

use crate::error::Result;
use image::DynamicImage;

/// Axis-aligned box in input image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Left edge.
    pub x1: f32,
    /// Top edge.
    pub y1: f32,
    /// Right edge.
    pub x2: f32,
    /// Bottom edge.
    pub y2: f32,
}

impl BoundingBox {
    /// Box area, zero for degenerate boxes.
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    /// Intersection over union with another box.
    pub fn iou(&self, other: &Self) -> f32 {
        let w = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let h = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let intersection = w * h;
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 { 0.0 } else { intersection / union }
    }
}

/// One detected object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDetection {
    /// Class index in model output order.
    pub class_index: usize,
    /// Detection confidence (0.0 - 1.0).
    pub confidence: f32,
    /// Object location.
    pub bbox: BoundingBox,
}

/// A loaded object-detection model.
///
/// Handles are immutable after load and scored concurrently from worker threads.
pub trait DetectionModel: Send + Sync {
    /// Display name for logs.
    fn name(&self) -> &str;

    /// Class names in output order.
    fn labels(&self) -> &[String];

    /// Detect objects in an image.
    fn detect(&self, image: &DynamicImage) -> Result<Vec<ObjectDetection>>;
}

/// A loaded whole-image classification model.
pub trait ClassificationModel: Send + Sync {
    /// Display name for logs.
    fn name(&self) -> &str;

    /// Class names in output order.
    fn labels(&self) -> &[String];

    /// Per-class probabilities for an image, in label order.
    fn classify(&self, image: &DynamicImage) -> Result<Vec<f32>>;
}
