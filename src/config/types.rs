//! Configuration type definitions.

use crate::constants::{
    DEFAULT_ALPHA, DEFAULT_CONFIDENCE, DEFAULT_JOBS, DEFAULT_LEDGER_NAME, DEFAULT_THRESHOLD,
};
use crate::labels::CodeScheme;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Object-detection models, averaged uniformly.
    pub detection: Vec<ModelConfig>,

    /// Whole-image classification models, averaged uniformly.
    pub classification: Vec<ModelConfig>,

    /// Default ensemble and batch settings.
    pub defaults: DefaultsConfig,

    /// Inference settings.
    pub inference: InferenceConfig,

    /// Ledger settings.
    pub ledger: LedgerConfig,
}

/// Configuration for a single model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Display name used in logs.
    pub name: String,

    /// Path to the ONNX model file.
    pub path: PathBuf,

    /// Path to the labels file (one class per line, model output order).
    pub labels: PathBuf,
}

/// Default ensemble and batch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Weight of detection-derived probabilities (0.0-1.0).
    pub alpha: f32,

    /// Per-detection confidence floor (0.0-1.0).
    pub confidence: f32,

    /// Minimum fused top-class probability for a species decision.
    pub threshold: f32,

    /// Number of sorting workers.
    pub jobs: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            confidence: DEFAULT_CONFIDENCE,
            threshold: DEFAULT_THRESHOLD,
            jobs: DEFAULT_JOBS,
        }
    }
}

/// Inference device configuration.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum InferenceDevice {
    /// Try the GPU provider, silently fall back to CPU.
    #[default]
    Auto,
    /// Request the GPU provider, warn on CPU fallback.
    Gpu,
    /// Force CPU inference.
    Cpu,
}

impl std::fmt::Display for InferenceDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Gpu => write!(f, "gpu"),
            Self::Cpu => write!(f, "cpu"),
        }
    }
}

/// Inference settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Device to use for inference.
    pub device: InferenceDevice,

    /// Intra-op threads per ONNX session (0 lets the runtime decide).
    pub intra_threads: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            device: InferenceDevice::Auto,
            intra_threads: 0,
        }
    }
}

/// Ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Ledger file name inside the destination root.
    pub file_name: String,

    /// Numeric class code scheme.
    pub code_scheme: CodeScheme,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_LEDGER_NAME.to_string(),
            code_scheme: CodeScheme::Legacy,
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_config_default_values() {
        let defaults = DefaultsConfig::default();
        assert_eq!(defaults.alpha, 0.5);
        assert_eq!(defaults.confidence, 0.7);
        assert_eq!(defaults.threshold, 0.5);
        assert_eq!(defaults.jobs, 1);
    }

    #[test]
    fn test_ledger_defaults_preserve_legacy_codes() {
        let ledger = LedgerConfig::default();
        assert_eq!(ledger.file_name, "results.csv");
        assert_eq!(ledger.code_scheme, CodeScheme::Legacy);
    }

    #[test]
    fn test_device_display() {
        assert_eq!(InferenceDevice::Auto.to_string(), "auto");
        assert_eq!(InferenceDevice::Cpu.to_string(), "cpu");
    }
}
