//! Error types for descent optimization.
//!
//! This module defines the error taxonomy shared by every solver, line search
//! and objective in the workspace. Errors fall into four families:
//!
//! - **Parameter-range errors** (`InvalidConfiguration`): raised at entry,
//!   before any iteration is performed.
//! - **Precondition violations** (`InvalidSearchDirection`): a line search was
//!   handed a direction that is not a descent direction.
//! - **Non-convergence** (`LineSearchFailed`, `MaxIterationsReached`): a
//!   bracketing, backtracking or outer loop exceeded its iteration cap.
//! - **Numerical and capability failures** (`NumericalError`,
//!   `DimensionMismatch`, `NotImplemented`).

use thiserror::Error;

/// Errors that can occur during optimization.
#[derive(Debug, Clone, Error)]
pub enum OptimizerError {
    /// Invalid optimizer configuration.
    ///
    /// This error occurs when a routine is called with parameters outside their
    /// admissible range (e.g., non-positive tolerance, σ outside (0, 1/2)).
    #[error("Invalid optimizer configuration: {reason} ({parameter} = {value})")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
        /// Name of the invalid parameter
        parameter: String,
        /// Value that was invalid
        value: String,
    },

    /// Invalid search direction.
    ///
    /// This error occurs when the search direction is not a descent direction.
    #[error("Invalid search direction: not a descent direction (directional derivative {directional_derivative})")]
    InvalidSearchDirection {
        /// The offending value of gradient(x)ᵀd
        directional_derivative: f64,
    },

    /// Line search failed to find an acceptable step.
    ///
    /// This error occurs when the bracketing, bisection or backtracking phase
    /// of a line search exceeds its iteration cap.
    #[error("Line search failed: {reason}")]
    LineSearchFailed {
        /// Description of why the line search failed
        reason: String,
        /// Number of iterations attempted
        iterations: usize,
        /// Last step size tried
        last_step_size: f64,
        /// Function value at the starting point
        initial_value: f64,
    },

    /// Maximum number of iterations reached without convergence.
    ///
    /// This error indicates that an outer or inner loop has reached its
    /// iteration limit without satisfying its stopping functional.
    #[error("Maximum iterations ({max_iterations}) reached without convergence")]
    MaxIterationsReached {
        /// Maximum number of iterations allowed
        max_iterations: usize,
        /// Final function value
        final_value: f64,
        /// Final value of the stopping functional
        final_gradient_norm: f64,
        /// Convergence tolerance that was not met
        tolerance: f64,
    },

    /// Numerical instability detected.
    ///
    /// This error occurs when numerical operations become unstable,
    /// such as non-finite values or a failed factorization.
    #[error("Numerical instability detected: {reason}")]
    NumericalError {
        /// Description of the numerical issue
        reason: String,
    },

    /// Dimension mismatch between vectors or matrices.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions
        expected: String,
        /// Actual dimensions
        actual: String,
    },

    /// Optional capability not provided.
    ///
    /// Used for optional methods such as `Objective::hessian` that a
    /// particular objective does not implement.
    #[error("Feature not implemented: {feature}")]
    NotImplemented {
        /// Name of the unimplemented feature
        feature: String,
    },
}

impl OptimizerError {
    /// Create an InvalidConfiguration error.
    pub fn invalid_configuration<S1, S2, S3>(reason: S1, parameter: S2, value: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self::InvalidConfiguration {
            reason: reason.into(),
            parameter: parameter.into(),
            value: value.into(),
        }
    }

    /// Create an InvalidSearchDirection error from the directional derivative.
    pub fn invalid_search_direction(directional_derivative: f64) -> Self {
        Self::InvalidSearchDirection {
            directional_derivative,
        }
    }

    /// Create a LineSearchFailed error with detailed context.
    pub fn line_search_failed<S: Into<String>>(
        reason: S,
        iterations: usize,
        last_step_size: f64,
        initial_value: f64,
    ) -> Self {
        Self::LineSearchFailed {
            reason: reason.into(),
            iterations,
            last_step_size,
            initial_value,
        }
    }

    /// Create a MaxIterationsReached error with convergence information.
    pub fn max_iterations_reached(
        max_iterations: usize,
        final_value: f64,
        final_gradient_norm: f64,
        tolerance: f64,
    ) -> Self {
        Self::MaxIterationsReached {
            max_iterations,
            final_value,
            final_gradient_norm,
            tolerance,
        }
    }

    /// Create a NumericalError with a custom reason.
    pub fn numerical_error<S: Into<String>>(reason: S) -> Self {
        Self::NumericalError {
            reason: reason.into(),
        }
    }

    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch<S1, S2>(expected: S1, actual: S2) -> Self
    where
        S1: std::fmt::Display,
        S2: std::fmt::Display,
    {
        Self::DimensionMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a NotImplemented error for a specific feature.
    pub fn not_implemented<S: Into<String>>(feature: S) -> Self {
        Self::NotImplemented {
            feature: feature.into(),
        }
    }

    /// Returns true for errors raised because a loop hit its iteration cap.
    pub fn is_non_convergence(&self) -> bool {
        matches!(
            self,
            Self::LineSearchFailed { .. } | Self::MaxIterationsReached { .. }
        )
    }
}

/// Result type alias for optimizer operations.
pub type Result<T> = std::result::Result<T, OptimizerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = OptimizerError::invalid_configuration("must be positive", "tolerance", "-1");
        assert!(matches!(err, OptimizerError::InvalidConfiguration { .. }));
        assert_eq!(
            err.to_string(),
            "Invalid optimizer configuration: must be positive (tolerance = -1)"
        );

        let err = OptimizerError::dimension_mismatch("3", "4");
        assert!(matches!(err, OptimizerError::DimensionMismatch { .. }));
        assert_eq!(err.to_string(), "Dimension mismatch: expected 3, got 4");
    }

    #[test]
    fn test_optimizer_error_context() {
        let err = OptimizerError::line_search_failed("bracket expansion diverged", 25, 1e8, 42.0);

        if let OptimizerError::LineSearchFailed {
            reason,
            iterations,
            last_step_size,
            initial_value,
        } = err
        {
            assert_eq!(reason, "bracket expansion diverged");
            assert_eq!(iterations, 25);
            assert_eq!(last_step_size, 1e8);
            assert_eq!(initial_value, 42.0);
        } else {
            panic!("Expected LineSearchFailed variant");
        }

        let err = OptimizerError::max_iterations_reached(500, 1.23, 0.456, 1e-3);
        assert!(err.to_string().contains("500"));
        assert!(err.is_non_convergence());
    }

    #[test]
    fn test_error_display() {
        let errors = vec![
            OptimizerError::invalid_search_direction(0.5),
            OptimizerError::numerical_error("matrix is not positive definite"),
            OptimizerError::not_implemented("hessian"),
            OptimizerError::line_search_failed("step size underflow", 50, 1e-16, 10.0),
        ];

        for err in errors {
            assert!(!err.to_string().is_empty());
        }
        assert!(!OptimizerError::not_implemented("hessian").is_non_convergence());
    }
}
