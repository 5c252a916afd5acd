//! Fusion of detection and classification vectors into one decision.

use crate::ensemble::{EnsembleConfig, ProbabilityVector};
use crate::error::{Error, Result};
use crate::inference::{ClassificationAdapter, DetectionAdapter};
use crate::labels::ClassLabel;
use image::DynamicImage;
use serde::Serialize;
use tracing::{debug, warn};

/// Full outcome of one prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Final label.
    pub label: ClassLabel,
    /// Fused vector the decision was taken from.
    pub fused: ProbabilityVector,
    /// Highest fused probability.
    pub top_probability: f32,
}

/// Stateless ensemble over a detection and a classification adapter.
///
/// Models are loaded once and only read afterwards, so one engine may serve
/// many threads.
#[derive(Debug)]
pub struct EnsembleEngine {
    detection: DetectionAdapter,
    classification: ClassificationAdapter,
}

impl EnsembleEngine {
    /// Combine two adapters.
    pub fn new(detection: DetectionAdapter, classification: ClassificationAdapter) -> Self {
        Self {
            detection,
            classification,
        }
    }

    /// Detection adapter.
    pub fn detection(&self) -> &DetectionAdapter {
        &self.detection
    }

    /// Classification adapter.
    pub fn classification(&self) -> &ClassificationAdapter {
        &self.classification
    }

    /// Final label for an image.
    pub fn predict(&self, image: &DynamicImage, config: &EnsembleConfig) -> Result<ClassLabel> {
        Ok(self.evaluate(image, config)?.label)
    }

    /// Run both adapters and fuse their vectors.
    pub fn evaluate(&self, image: &DynamicImage, config: &EnsembleConfig) -> Result<Prediction> {
        let od = self.detection.detect(image, config.confidence())?;
        let clf = self.classification.classify(image)?;
        debug!("detection {od}, classification {clf}");
        fuse(&od, &clf, config)
    }
}

/// Blend two vectors and apply the decision policy.
///
/// The top class wins when its fused probability reaches the threshold
/// (inclusive); ties go to the lowest class index. A fused vector with no
/// signal at all, or with a NaN or infinite score, is always uncertain.
pub fn fuse(
    od: &ProbabilityVector,
    clf: &ProbabilityVector,
    config: &EnsembleConfig,
) -> Result<Prediction> {
    let fused = ProbabilityVector::blend(config.alpha(), od, clf)?;
    let (top_class, top_probability) = fused.argmax().ok_or_else(|| Error::Inference {
        reason: "empty probability vector".to_string(),
    })?;

    let finite = fused.is_finite();
    if !finite {
        warn!("Non-finite fused scores {fused}, treating as uncertain");
    }

    let label = if !finite || fused.is_zero() || top_probability < config.threshold() {
        ClassLabel::Uncertain
    } else {
        ClassLabel::from_index(top_class).ok_or_else(|| Error::Inference {
            reason: format!("class index {top_class} has no label"),
        })?
    };

    Ok(Prediction {
        label,
        fused,
        top_probability,
    })
}
