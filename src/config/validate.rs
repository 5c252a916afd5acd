//! Configuration validation.

use crate::config::{Config, ModelConfig};
use crate::constants::{MAX_JOBS, confidence};
use crate::error::{Error, Result};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_defaults(config)?;
    validate_ledger(config)?;
    Ok(())
}

/// Validate default settings.
fn validate_defaults(config: &Config) -> Result<()> {
    let defaults = &config.defaults;

    validate_unit_range("alpha", defaults.alpha)?;
    validate_unit_range("confidence", defaults.confidence)?;

    // Thresholds above 1.0 are allowed and force every image to uncertain
    if !defaults.threshold.is_finite() || defaults.threshold < 0.0 {
        return Err(Error::ConfigValidation {
            message: format!(
                "threshold must be a non-negative number, got {}",
                defaults.threshold
            ),
        });
    }

    if defaults.jobs == 0 || defaults.jobs > MAX_JOBS {
        return Err(Error::ConfigValidation {
            message: format!(
                "jobs must be between 1 and {MAX_JOBS}, got {}",
                defaults.jobs
            ),
        });
    }

    Ok(())
}

fn validate_ledger(config: &Config) -> Result<()> {
    let name = config.ledger.file_name.trim();
    if name.is_empty() || matches!(name, "." | "..") || name.contains(['/', '\\']) {
        return Err(Error::ConfigValidation {
            message: format!(
                "ledger file_name must be a plain file name, got '{}'",
                config.ledger.file_name
            ),
        });
    }
    Ok(())
}

/// Check a value lies in `[0, 1]`.
pub fn validate_unit_range(name: &str, value: f32) -> Result<()> {
    if !(confidence::MIN..=confidence::MAX).contains(&value) {
        return Err(Error::ConfigValidation {
            message: format!(
                "{name} must be between {} and {}, got {value}",
                confidence::MIN,
                confidence::MAX
            ),
        });
    }
    Ok(())
}

/// Validate a model configuration and check files exist.
pub fn validate_model_config(model: &ModelConfig) -> Result<()> {
    if !model.path.exists() {
        return Err(Error::ModelFileNotFound {
            path: model.path.clone(),
        });
    }

    if !model.labels.exists() {
        return Err(Error::LabelsFileNotFound {
            path: model.labels.clone(),
        });
    }

    Ok(())
}
