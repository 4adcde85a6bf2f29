//! Error types for chart fitting and run-length experiments.

use thiserror::Error;

/// Errors raised while fitting charts or running experiments.
///
/// A trial that never signals is not an error: it is censored by the
/// experiment harness and reported through `censored_trials`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpcError {
    /// Data is empty or malformed and a parameter cannot be inferred from it.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A tuning or process parameter is out of its valid range.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The bias-correction table has no constant for the sample size.
    #[error("No bias-correction constant for sample size {sample_size}")]
    LookupFailure { sample_size: usize },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SpcError>;

impl SpcError {
    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        SpcError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Checks that `value` is finite and strictly positive.
pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SpcError::invalid_parameter(
            name,
            format!("must be positive and finite, got {value}"),
        ));
    }
    Ok(value)
}

/// Checks that `value` is finite.
pub(crate) fn require_finite(name: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(SpcError::invalid_parameter(
            name,
            format!("must be finite, got {value}"),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_message() {
        let err = SpcError::invalid_parameter("lambda", "must be in (0, 1], got 1.5");
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'lambda': must be in (0, 1], got 1.5"
        );
    }

    #[test]
    fn test_lookup_failure_message() {
        let err = SpcError::LookupFailure { sample_size: 30 };
        assert_eq!(
            err.to_string(),
            "No bias-correction constant for sample size 30"
        );
    }

    #[test]
    fn test_require_positive() {
        assert_eq!(require_positive("k", 3.0), Ok(3.0));
        assert!(require_positive("k", 0.0).is_err());
        assert!(require_positive("k", -1.0).is_err());
        assert!(require_positive("k", f64::NAN).is_err());
        assert!(require_positive("k", f64::INFINITY).is_err());
    }

    #[test]
    fn test_require_finite() {
        assert_eq!(require_finite("mean", -4.5), Ok(-4.5));
        assert!(require_finite("mean", f64::NEG_INFINITY).is_err());
    }
}
