// src/error.rs
use thiserror::Error;

/// Error types for the fast-jd library
///
/// Two categories exist: configuration errors, raised while parameters are
/// validated and before any simulation work, and numerical errors, raised when
/// a path or payoff evaluation produces NaN or infinity. Neither is retried.
#[derive(Debug, Clone, Error)]
pub enum JdError {
    /// Invalid parameter values
    #[error("Invalid parameter '{parameter}' = {value}: {constraint}")]
    InvalidParameter {
        parameter: String,
        value: f64,
        constraint: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// NaN, infinity or overflow during simulation or payoff evaluation
    #[error("Numerical error in {stage}: {reason}")]
    Numerical { stage: String, reason: String },
}

impl JdError {
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            JdError::InvalidParameter { .. } | JdError::InvalidConfiguration { .. }
        )
    }

    pub fn is_numerical(&self) -> bool {
        matches!(self, JdError::Numerical { .. })
    }

    pub(crate) fn numerical(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        JdError::Numerical {
            stage: stage.into(),
            reason: reason.into(),
        }
    }

    /// Tag a numerical error with the sample (path or antithetic pair) it came from
    pub(crate) fn with_sample(self, index: u64) -> Self {
        match self {
            JdError::Numerical { stage, reason } => JdError::Numerical {
                stage: format!("{} (sample {})", stage, index),
                reason,
            },
            other => other,
        }
    }
}

/// Result type alias for fast-jd operations
pub type JdResult<T> = Result<T, JdError>;

/// Validation utilities
///
/// Every check also rejects NaN: comparisons are written so that a NaN value
/// fails them.
pub mod validation {
    use super::{JdError, JdResult};

    /// Upper bound on paths (or antithetic pairs) in a single run
    pub const MAX_PATHS: usize = 1_000_000_000;

    /// Upper bound on time steps per path
    pub const MAX_STEPS: usize = 100_000;

    /// Validate that a parameter is positive and finite
    pub fn validate_positive(name: &str, value: f64) -> JdResult<()> {
        if value > 0.0 && value.is_finite() {
            Ok(())
        } else {
            Err(JdError::InvalidParameter {
                parameter: name.to_string(),
                value,
                constraint: "must be positive (> 0) and finite".to_string(),
            })
        }
    }

    /// Validate that a parameter is non-negative and finite
    pub fn validate_non_negative(name: &str, value: f64) -> JdResult<()> {
        if value >= 0.0 && value.is_finite() {
            Ok(())
        } else {
            Err(JdError::InvalidParameter {
                parameter: name.to_string(),
                value,
                constraint: "must be non-negative (≥ 0) and finite".to_string(),
            })
        }
    }

    /// Validate that a value is finite and not NaN
    pub fn validate_finite(name: &str, value: f64) -> JdResult<()> {
        if !value.is_finite() {
            Err(JdError::InvalidParameter {
                parameter: name.to_string(),
                value,
                constraint: "must be finite (not NaN or infinite)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a value lies strictly between 0 and 1
    pub fn validate_open_unit_interval(name: &str, value: f64) -> JdResult<()> {
        if value > 0.0 && value < 1.0 {
            Ok(())
        } else {
            Err(JdError::InvalidParameter {
                parameter: name.to_string(),
                value,
                constraint: "must be in the open interval (0, 1)".to_string(),
            })
        }
    }

    /// Validate paths count
    pub fn validate_paths(paths: usize) -> JdResult<()> {
        if paths == 0 {
            Err(JdError::InvalidConfiguration {
                field: "paths".to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else if paths > MAX_PATHS {
            Err(JdError::InvalidConfiguration {
                field: "paths".to_string(),
                reason: "exceeds maximum allowed (1 billion)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate steps count
    pub fn validate_steps(steps: usize) -> JdResult<()> {
        if steps == 0 {
            Err(JdError::InvalidConfiguration {
                field: "steps".to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else if steps > MAX_STEPS {
            Err(JdError::InvalidConfiguration {
                field: "steps".to_string(),
                reason: "exceeds maximum allowed (100,000)".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::validation::*;
    use super::*;

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive("sigma", 0.2).is_ok());
        assert!(validate_positive("sigma", 0.0).is_err());
        assert!(validate_positive("sigma", -0.1).is_err());
        assert!(validate_positive("sigma", f64::NAN).is_err());
        assert!(validate_positive("sigma", f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative("lambda", 0.0).is_ok());
        assert!(validate_non_negative("lambda", 1.5).is_ok());
        assert!(validate_non_negative("lambda", -1e-12).is_err());
        assert!(validate_non_negative("lambda", f64::NAN).is_err());
    }

    #[test]
    fn test_validate_finite() {
        assert!(validate_finite("value", 1.0).is_ok());
        assert!(validate_finite("value", f64::NAN).is_err());
        assert!(validate_finite("value", f64::INFINITY).is_err());
        assert!(validate_finite("value", f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_validate_counts() {
        assert!(validate_paths(1).is_ok());
        assert!(validate_paths(0).is_err());
        assert!(validate_paths(MAX_PATHS + 1).is_err());
        assert!(validate_steps(1).is_ok());
        assert!(validate_steps(0).is_err());
    }

    #[test]
    fn test_error_display() {
        let error = JdError::InvalidParameter {
            parameter: "sigma".to_string(),
            value: -0.1,
            constraint: "must be positive".to_string(),
        };

        let display = format!("{}", error);
        assert!(display.contains("sigma"));
        assert!(display.contains("-0.1"));
        assert!(display.contains("positive"));
        assert!(error.is_configuration());
        assert!(!error.is_numerical());
    }

    #[test]
    fn test_numerical_error_category() {
        let error = JdError::numerical("path 7", "terminal price is inf");
        assert!(error.is_numerical());
        assert!(format!("{}", error).contains("path 7"));
    }
}
