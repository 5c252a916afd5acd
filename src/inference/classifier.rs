//! YOLO image-classification model backed by ONNX Runtime.

use crate::config::ModelConfig;
use crate::constants::classifier::INPUT_SIZE;
use crate::error::{Error, Result};
use crate::inference::ClassificationModel;
use crate::inference::preprocess::center_crop;
use crate::inference::session::{OnnxSession, SessionOptions, read_labels};
use image::DynamicImage;

/// Classification model exported with a `[1, classes]` probability output.
pub struct OnnxClassifier {
    name: String,
    labels: Vec<String>,
    session: OnnxSession,
}

impl OnnxClassifier {
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

impl ClassificationModel for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn classify(&self, image: &DynamicImage) -> Result<Vec<f32>> {
        let input = center_crop(image, INPUT_SIZE);
        let size = INPUT_SIZE as usize;
        let (dims, output) = self.session.run([1, 3, size, size], input)?;
        decode_output(&dims, output, self.labels.len())
    }
}

fn decode_output(dims: &[i64], output: Vec<f32>, classes: usize) -> Result<Vec<f32>> {
    let expected = i64::try_from(classes).unwrap_or(i64::MAX);
    if dims != [1, expected] || output.len() != classes {
        return Err(Error::Inference {
            reason: format!(
                "unexpected classification output shape {dims:?} (expected [1, {classes}])"
            ),
        });
    }
    Ok(output)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_accepts_matching_shape() {
        let probs = decode_output(&[1, 3], vec![0.1, 0.7, 0.2], 3).unwrap();
        assert_eq!(probs, vec![0.1, 0.7, 0.2]);
    }

    #[test]
    fn test_decode_rejects_extra_batch() {
        let result = decode_output(&[2, 3], vec![0.0; 6], 3);
        assert!(matches!(result, Err(Error::Inference { .. })));
    }

    #[test]
    fn test_decode_rejects_class_mismatch() {
        let result = decode_output(&[1, 4], vec![0.25; 4], 3);
        assert!(matches!(result, Err(Error::Inference { .. })));
    }
}
