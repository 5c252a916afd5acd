//! Fixed-length per-class probability vectors.

use crate::error::{Error, Result};
use serde::Serialize;

/// One non-negative score per trained class, in model output order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProbabilityVector(Vec<f32>);

impl ProbabilityVector {
    /// Wrap raw scores.
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// All-zero vector, the uninformative input.
    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    /// Vector with `mass` at `index` and zero elsewhere.
    pub fn one_hot(len: usize, index: usize, mass: f32) -> Self {
        let mut values = vec![0.0; len];
        if let Some(slot) = values.get_mut(index) {
            *slot = mass;
        }
        Self(values)
    }

    /// Element-wise unweighted mean.
    ///
    /// An empty input yields the all-zero vector of `len`.
    pub fn mean(vectors: &[Self], len: usize) -> Result<Self> {
        let mut sum = vec![0.0_f32; len];
        for vector in vectors {
            if vector.len() != len {
                return Err(length_mismatch(len, vector.len()));
            }
            for (acc, value) in sum.iter_mut().zip(&vector.0) {
                *acc += value;
            }
        }

        if !vectors.is_empty() {
            #[allow(clippy::cast_precision_loss)]
            let count = vectors.len() as f32;
            for value in &mut sum {
                *value /= count;
            }
        }

        Ok(Self(sum))
    }

    /// `alpha * detection + (1 - alpha) * classification`, element-wise.
    pub fn blend(alpha: f32, detection: &Self, classification: &Self) -> Result<Self> {
        if detection.len() != classification.len() {
            return Err(length_mismatch(detection.len(), classification.len()));
        }

        let fused = detection
            .0
            .iter()
            .zip(&classification.0)
            .map(|(od, clf)| alpha.mul_add(*od, (1.0 - alpha) * clf))
            .collect();

        Ok(Self(fused))
    }

    /// Index and value of the largest entry; ties resolve to the lowest index.
    pub fn argmax(&self) -> Option<(usize, f32)> {
        self.0
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best, (i, value)| match best {
                Some((_, top)) if value <= top => best,
                _ => Some((i, value)),
            })
    }

    /// Whether every entry is a finite number.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// Whether every entry is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the vector has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw scores.
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

impl std::fmt::Display for ProbabilityVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use crate::constants::confidence::DECIMAL_PLACES;

        write!(f, "[")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value:.DECIMAL_PLACES$}")?;
        }
        write!(f, "]")
    }
}

fn length_mismatch(expected: usize, found: usize) -> Error {
    Error::Inference {
        reason: format!("probability vector has {found} classes, expected {expected}"),
    }
}
