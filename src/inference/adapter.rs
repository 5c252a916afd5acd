//! Detection and classification adapters.
//!
//! Each adapter owns one or more model handles of the same kind and reduces
//! their outputs to a single [`ProbabilityVector`] per image.

use crate::ensemble::ProbabilityVector;
use crate::error::{Error, Result};
use crate::inference::{ClassificationModel, DetectionModel};
use crate::labels::{ClassLabel, SPECIES};
use image::DynamicImage;
use tracing::trace;

/// Averages detection-derived class vectors across detection models.
pub struct DetectionAdapter {
    models: Vec<Box<dyn DetectionModel>>,
}

impl std::fmt::Debug for DetectionAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionAdapter")
            .field("models", &self.models.iter().map(|m| m.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl DetectionAdapter {
    /// Take ownership of loaded detection models.
    ///
    /// Fails when no model is given or a model does not report the trained
    /// species in model output order.
    pub fn new(models: Vec<Box<dyn DetectionModel>>) -> Result<Self> {
        const KIND: &str = "detection";
        if models.is_empty() {
            return Err(Error::NoModels { kind: KIND });
        }
        for model in &models {
            check_labels(KIND, model.name(), model.labels())?;
        }
        Ok(Self { models })
    }

    /// Number of loaded models.
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Detection-derived probability vector for an image.
    ///
    /// Each detection scoring strictly above `confidence` contributes its
    /// confidence at its class. Kept detections are averaged per model, then
    /// models are averaged uniformly. No kept detection gives a zero vector.
    pub fn detect(&self, image: &DynamicImage, confidence: f32) -> Result<ProbabilityVector> {
        let classes = SPECIES.len();
        let mut per_model = Vec::with_capacity(self.models.len());

        for model in &self.models {
            let detections = model.detect(image)?;
            let mut kept = Vec::new();
            for detection in detections.iter().filter(|d| d.confidence > confidence) {
                if detection.class_index >= classes {
                    return Err(Error::Inference {
                        reason: format!(
                            "model '{}' reported class index {} (only {classes} classes)",
                            model.name(),
                            detection.class_index
                        ),
                    });
                }
                kept.push(ProbabilityVector::one_hot(
                    classes,
                    detection.class_index,
                    detection.confidence,
                ));
            }

            let vector = ProbabilityVector::mean(&kept, classes)?;
            trace!(
                "{}: {} of {} detections above {confidence}, vector {vector}",
                model.name(),
                kept.len(),
                detections.len()
            );
            per_model.push(vector);
        }

        ProbabilityVector::mean(&per_model, classes)
    }
}

/// Averages class probability distributions across classification models.
pub struct ClassificationAdapter {
    models: Vec<Box<dyn ClassificationModel>>,
}

impl std::fmt::Debug for ClassificationAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassificationAdapter")
            .field("models", &self.models.iter().map(|m| m.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl ClassificationAdapter {
    /// Take ownership of loaded classification models.
    ///
    /// Fails when no model is given, or on class count or order mismatch.
    pub fn new(models: Vec<Box<dyn ClassificationModel>>) -> Result<Self> {
        const KIND: &str = "classification";
        if models.is_empty() {
            return Err(Error::NoModels { kind: KIND });
        }
        for model in &models {
            check_labels(KIND, model.name(), model.labels())?;
        }
        Ok(Self { models })
    }

    /// Number of loaded models.
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Uniform mean of every model's class distribution.
    pub fn classify(&self, image: &DynamicImage) -> Result<ProbabilityVector> {
        let classes = SPECIES.len();
        let mut per_model = Vec::with_capacity(self.models.len());

        for model in &self.models {
            let probs = model.classify(image)?;
            if probs.len() != classes {
                return Err(Error::Inference {
                    reason: format!(
                        "model '{}' returned {} probabilities, expected {classes}",
                        model.name(),
                        probs.len()
                    ),
                });
            }
            let vector = ProbabilityVector::new(probs);
            trace!("{}: vector {vector}", model.name());
            per_model.push(vector);
        }

        ProbabilityVector::mean(&per_model, classes)
    }
}

/// Check that a model's labels name the trained species in output order.
pub fn check_labels(kind: &'static str, model: &str, labels: &[String]) -> Result<()> {
    if labels.len() != SPECIES.len() {
        return Err(Error::ClassCountMismatch {
            kind,
            model: model.to_string(),
            expected: SPECIES.len(),
            found: labels.len(),
        });
    }

    let in_order = labels
        .iter()
        .zip(SPECIES)
        .all(|(name, species)| name.parse::<ClassLabel>().is_ok_and(|l| l == species));

    if !in_order {
        return Err(Error::ClassOrderMismatch {
            kind,
            model: model.to_string(),
            expected: SPECIES.iter().map(|s| s.name().to_string()).collect(),
            found: labels.to_vec(),
        });
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::inference::{BoundingBox, ObjectDetection};

    fn species_labels() -> Vec<String> {
        vec!["deer".into(), "muskdeer".into(), "roe".into()]
    }

    struct FixedDetector {
        labels: Vec<String>,
        detections: Vec<(usize, f32)>,
    }

    impl DetectionModel for FixedDetector {
        fn name(&self) -> &str {
            "fixed-detector"
        }

        fn labels(&self) -> &[String] {
            &self.labels
        }

        fn detect(&self, _image: &DynamicImage) -> Result<Vec<ObjectDetection>> {
            Ok(self
                .detections
                .iter()
                .map(|&(class_index, confidence)| ObjectDetection {
                    class_index,
                    confidence,
                    bbox: BoundingBox {
                        x1: 0.0,
                        y1: 0.0,
                        x2: 1.0,
                        y2: 1.0,
                    },
                })
                .collect())
        }
    }

    struct FixedClassifier {
        labels: Vec<String>,
        probs: Vec<f32>,
    }

    impl ClassificationModel for FixedClassifier {
        fn name(&self) -> &str {
            "fixed-classifier"
        }

        fn labels(&self) -> &[String] {
            &self.labels
        }

        fn classify(&self, _image: &DynamicImage) -> Result<Vec<f32>> {
            Ok(self.probs.clone())
        }
    }

    fn detector(detections: Vec<(usize, f32)>) -> Box<dyn DetectionModel> {
        Box::new(FixedDetector {
            labels: species_labels(),
            detections,
        })
    }

    fn classifier(probs: Vec<f32>) -> Box<dyn ClassificationModel> {
        Box::new(FixedClassifier {
            labels: species_labels(),
            probs,
        })
    }

    fn blank() -> DynamicImage {
        DynamicImage::new_rgb8(4, 4)
    }

    #[test]
    fn test_detection_adapter_requires_models() {
        assert!(matches!(
            DetectionAdapter::new(vec![]).unwrap_err(),
            Error::NoModels { kind: "detection" }
        ));
    }

    #[test]
    fn test_detection_floor_is_exclusive() {
        let adapter = DetectionAdapter::new(vec![detector(vec![(0, 0.7), (2, 0.9)])]).unwrap();
        let v = adapter.detect(&blank(), 0.7).unwrap();
        assert_eq!(v.as_slice(), &[0.0, 0.0, 0.9]);
    }

    #[test]
    fn test_detections_averaged_within_then_across_models() {
        let adapter = DetectionAdapter::new(vec![
            detector(vec![(0, 0.8), (1, 0.9)]),
            detector(vec![]),
        ])
        .unwrap();
        let v = adapter.detect(&blank(), 0.5).unwrap();
        // model 1: [0.4, 0.45, 0]; model 2: zeros
        assert!((v.as_slice()[0] - 0.2).abs() < 1e-6);
        assert!((v.as_slice()[1] - 0.225).abs() < 1e-6);
        assert_eq!(v.as_slice()[2], 0.0);
    }

    #[test]
    fn test_no_detections_is_zero_vector() {
        let adapter = DetectionAdapter::new(vec![detector(vec![(1, 0.3)])]).unwrap();
        let v = adapter.detect(&blank(), 0.7).unwrap();
        assert!(v.is_zero());
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn test_detection_out_of_range_class_is_inference_error() {
        let adapter = DetectionAdapter::new(vec![detector(vec![(5, 0.9)])]).unwrap();
        assert!(matches!(
            adapter.detect(&blank(), 0.5).unwrap_err(),
            Error::Inference { .. }
        ));
    }

    #[test]
    fn test_classification_adapter_averages() {
        let adapter = ClassificationAdapter::new(vec![
            classifier(vec![0.6, 0.2, 0.2]),
            classifier(vec![0.2, 0.6, 0.2]),
        ])
        .unwrap();
        let v = adapter.classify(&blank()).unwrap();
        assert!((v.as_slice()[0] - 0.4).abs() < 1e-6);
        assert!((v.as_slice()[1] - 0.4).abs() < 1e-6);
        assert!((v.as_slice()[2] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_classification_class_count_mismatch_fails_at_construction() {
        let model = Box::new(FixedClassifier {
            labels: vec!["deer".into(), "muskdeer".into()],
            probs: vec![0.5, 0.5],
        });
        assert!(matches!(
            ClassificationAdapter::new(vec![classifier(vec![1.0, 0.0, 0.0]), model]).unwrap_err(),
            Error::ClassCountMismatch {
                expected: 3,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_classification_class_order_mismatch_fails_at_construction() {
        let model = Box::new(FixedClassifier {
            labels: vec!["roe".into(), "deer".into(), "muskdeer".into()],
            probs: vec![0.2, 0.3, 0.5],
        });
        match ClassificationAdapter::new(vec![model]).unwrap_err() {
            Error::ClassOrderMismatch {
                expected, found, ..
            } => {
                assert_eq!(expected, vec!["deer", "musk-deer", "roe-deer"]);
                assert_eq!(found, vec!["roe", "deer", "muskdeer"]);
            }
            other => panic!("expected class order mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_classification_wrong_output_length_is_inference_error() {
        let model = Box::new(FixedClassifier {
            labels: species_labels(),
            probs: vec![1.0],
        });
        let adapter = ClassificationAdapter::new(vec![model]).unwrap();
        assert!(matches!(
            adapter.classify(&blank()).unwrap_err(),
            Error::Inference { .. }
        ));
    }
}
