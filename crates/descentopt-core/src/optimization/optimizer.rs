//! Optimizer trait and result type shared by the descent routines.
//!
//! Every routine runs an outer loop driven by a stopping functional (gradient
//! norm, residual-gradient norm or projected stationarity) and returns an
//! [`OptimizationResult`] once the functional drops below the tolerance.
//! Exhausting an iteration cap is an error, not a result.

use crate::core::{
    error::Result,
    objective::Objective,
    types::{DVector, Scalar},
};
use std::fmt::Debug;
use std::time::Duration;

/// Outcome of an optimization run.
///
/// - **point**: the final iterate
/// - **value**: the objective value at the final iterate
/// - **gradient_norm**: the final value of the routine's stopping functional
///
/// `value_history` records the objective value at the start point and after
/// every accepted outer iteration.
///
/// A result is only returned once the stopping functional is below the
/// tolerance, so every `Ok` result is converged. Running out of iterations
/// yields [`OptimizerError::MaxIterationsReached`](crate::core::error::OptimizerError::MaxIterationsReached)
/// instead.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimizationResult<T>
where
    T: Scalar,
{
    /// The final point found by the optimizer
    pub point: DVector<T>,

    /// The objective value at the final point
    pub value: T,

    /// Final value of the stopping functional
    pub gradient_norm: T,

    /// Number of outer iterations performed
    pub iterations: usize,

    /// Total number of objective evaluations
    pub function_evaluations: usize,

    /// Total number of gradient evaluations
    pub gradient_evaluations: usize,

    /// Wall-clock time elapsed during optimization
    pub duration: Duration,

    /// Objective value at the start point and after every outer iteration
    pub value_history: Vec<T>,
}

impl<T> OptimizationResult<T>
where
    T: Scalar,
{
    /// Creates a new optimization result.
    pub fn new(
        point: DVector<T>,
        value: T,
        gradient_norm: T,
        iterations: usize,
        duration: Duration,
    ) -> Self {
        Self {
            point,
            value,
            gradient_norm,
            iterations,
            function_evaluations: 0,
            gradient_evaluations: 0,
            duration,
            value_history: Vec::new(),
        }
    }

    /// Sets the function evaluation count.
    pub fn with_function_evaluations(mut self, count: usize) -> Self {
        self.function_evaluations = count;
        self
    }

    /// Sets the gradient evaluation count.
    pub fn with_gradient_evaluations(mut self, count: usize) -> Self {
        self.gradient_evaluations = count;
        self
    }

    /// Sets the recorded objective values.
    pub fn with_value_history(mut self, history: Vec<T>) -> Self {
        self.value_history = history;
        self
    }

    /// Returns true when the recorded objective values never increase.
    pub fn is_monotone(&self) -> bool {
        self.value_history.windows(2).all(|pair| pair[1] <= pair[0])
    }
}

/// Common interface for unconstrained descent methods.
pub trait Optimizer<T>: Debug
where
    T: Scalar,
{
    /// Returns the optimizer's name.
    fn name(&self) -> &str;

    /// Minimizes `f` starting from `x0`.
    fn minimize<F>(&self, f: &F, x0: &DVector<T>) -> Result<OptimizationResult<T>>
    where
        F: Objective<T> + ?Sized;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_builder() {
        let result = OptimizationResult::new(
            DVector::from_vec(vec![1.0, 2.0]),
            0.5,
            1e-7,
            12,
            Duration::from_millis(3),
        )
        .with_function_evaluations(30)
        .with_gradient_evaluations(13)
        .with_value_history(vec![3.0, 1.0, 1.0, 0.5]);

        assert_eq!(result.iterations, 12);
        assert_eq!(result.function_evaluations, 30);
        assert_eq!(result.gradient_evaluations, 13);
        assert!(result.is_monotone());
    }

    #[test]
    fn test_non_monotone_history() {
        let result = OptimizationResult::new(DVector::zeros(1), 0.0, 0.0, 2, Duration::ZERO)
            .with_value_history(vec![1.0, 2.0, 0.0]);
        assert!(!result.is_monotone());
    }
}
