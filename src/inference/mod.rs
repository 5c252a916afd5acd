//! Model loading and inference for deer species recognition.

mod adapter;
mod classifier;
mod detector;
mod model;
mod preprocess;
mod session;

pub use adapter::{ClassificationAdapter, DetectionAdapter, check_labels};
pub use classifier::OnnxClassifier;
pub use detector::OnnxDetector;
pub use model::{BoundingBox, ClassificationModel, DetectionModel, ObjectDetection};
pub use session::{OnnxSession, SessionOptions, init_runtime, read_labels};

use crate::config::{Config, validate_model_config};
use crate::ensemble::EnsembleEngine;
use crate::error::{Error, Result};
use tracing::info;

/// Load every configured model and assemble the ensemble engine.
///
/// Model lists and files are checked before the runtime is initialized, so
/// configuration mistakes are reported without touching ONNX Runtime.
pub fn load_engine(config: &Config, options: SessionOptions) -> Result<EnsembleEngine> {
    for (kind, models) in [
        ("detection", &config.detection),
        ("classification", &config.classification),
    ] {
        if models.is_empty() {
            return Err(Error::NoModels { kind });
        }
        for model in models {
            validate_model_config(model)?;
        }
    }

    init_runtime();

    let mut detectors: Vec<Box<dyn DetectionModel>> = Vec::with_capacity(config.detection.len());
    for model in &config.detection {
        detectors.push(Box::new(OnnxDetector::load(model, options)?));
    }

    let mut classifiers: Vec<Box<dyn ClassificationModel>> =
        Vec::with_capacity(config.classification.len());
    for model in &config.classification {
        classifiers.push(Box::new(OnnxClassifier::load(model, options)?));
    }

    let detection = DetectionAdapter::new(detectors)?;
    let classification = ClassificationAdapter::new(classifiers)?;
    info!(
        "Loaded {} detection and {} classification model(s)",
        detection.model_count(),
        classification.model_count()
    );

    Ok(EnsembleEngine::new(detection, classification))
}
