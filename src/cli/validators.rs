//! CLI argument validators.
//!
//! Shared validation functions for CLI argument parsing.

use crate::constants::MAX_JOBS;

/// Parse and validate a probability-like value (0.0-1.0).
pub fn parse_unit(s: &str) -> Result<f32, String> {
    let value = parse_bounded_float(s, 0.0, 1.0, "value")?;
    #[allow(clippy::cast_possible_truncation)]
    Ok(value as f32)
}

/// Parse and validate a confidence threshold.
///
/// Values above 1.0 are accepted and send every image to the uncertain folder.
pub fn parse_threshold(s: &str) -> Result<f32, String> {
    let value = parse_bounded_float(s, 0.0, f64::from(f32::MAX), "threshold")?;
    #[allow(clippy::cast_possible_truncation)]
    Ok(value as f32)
}

/// Parse and validate a worker count.
pub fn parse_jobs(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 || value > MAX_JOBS {
        return Err(format!("jobs must be between 1 and {MAX_JOBS}, got {value}"));
    }

    Ok(value)
}

/// Parse and validate a bounded float value.
///
/// # Arguments
///
/// * `s` - The string to parse
/// * `min` - Minimum allowed value (inclusive)
/// * `max` - Maximum allowed value (inclusive)
/// * `name` - Name of the parameter for error messages
pub fn parse_bounded_float(s: &str, min: f64, max: f64, name: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !(min..=max).contains(&value) {
        return Err(format!(
            "{name} must be between {min} and {max}, got {value}"
        ));
    }

    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unit_valid() {
        assert_eq!(parse_unit("0.5").ok(), Some(0.5));
        assert_eq!(parse_unit("0.0").ok(), Some(0.0));
        assert_eq!(parse_unit("1.0").ok(), Some(1.0));
    }

    #[test]
    fn test_parse_unit_invalid() {
        assert!(parse_unit("1.1").is_err());
        assert!(parse_unit("-0.1").is_err());
        assert!(parse_unit("abc").is_err());
        assert!(parse_unit("NaN").is_err());
    }

    #[test]
    fn test_parse_threshold_allows_above_one() {
        assert_eq!(parse_threshold("1.01").ok(), Some(1.01));
        assert!(parse_threshold("-0.5").is_err());
        assert!(parse_threshold("inf").is_err());
    }

    #[test]
    fn test_parse_jobs() {
        assert_eq!(parse_jobs("4").ok(), Some(4));
        assert!(parse_jobs("0").is_err());
        assert!(parse_jobs("1000").is_err());
        assert!(parse_jobs("two").is_err());
    }

    #[test]
    fn test_parse_bounded_float_valid() {
        assert_eq!(
            parse_bounded_float("50.0", -100.0, 100.0, "test").ok(),
            Some(50.0)
        );
        assert_eq!(
            parse_bounded_float("-100.0", -100.0, 100.0, "test").ok(),
            Some(-100.0)
        );
    }

    #[test]
    fn test_parse_bounded_float_error_names_parameter() {
        let err = parse_bounded_float("150", 0.0, 100.0, "percent").unwrap_err();
        assert!(err.contains("percent"));
    }
}
