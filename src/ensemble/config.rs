//! Per-run ensemble settings.

use crate::config::validate_unit_range;
use crate::config::DefaultsConfig;
use crate::error::{Error, Result};
use serde::Serialize;

/// Immutable settings for one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnsembleConfig {
    alpha: f32,
    confidence: f32,
    threshold: f32,
}

impl EnsembleConfig {
    /// Build a validated configuration.
    ///
    /// `alpha` and `confidence` must lie in `[0, 1]`. `threshold` must be a
    /// non-negative number; values above 1 send every image to uncertain.
    pub fn new(alpha: f32, confidence: f32, threshold: f32) -> Result<Self> {
        validate_unit_range("alpha", alpha)?;
        validate_unit_range("confidence", confidence)?;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(Error::ConfigValidation {
                message: format!("threshold must be a non-negative number, got {threshold}"),
            });
        }

        Ok(Self {
            alpha,
            confidence,
            threshold,
        })
    }

    /// Build from configured defaults.
    pub fn from_defaults(defaults: &DefaultsConfig) -> Result<Self> {
        Self::new(defaults.alpha, defaults.confidence, defaults.threshold)
    }

    /// Weight of detection-derived probabilities.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Per-detection confidence floor (exclusive).
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Minimum fused top-class probability (inclusive).
    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

/// Map a 0-100 slider position onto a `[0, 1]` threshold.
pub fn threshold_from_percent(percent: u8) -> f32 {
    f32::from(percent.min(100)) / 100.0
}
