//! Newton descent
//!
//! Each iteration solves the Newton system ∇²f(x)·d = −∇f(x) with the
//! incomplete-Cholesky preconditioned CG solver and takes the full step.
//! The objective must provide an SPD Hessian along the iterates; a missing
//! Hessian surfaces as `NotImplemented` and an indefinite one as a
//! `NumericalError` from the inner solve.

use std::time::Instant;

use descentopt_core::{
    core::{
        error::{OptimizerError, Result},
        objective::Objective,
        types::{DVector, Scalar},
    },
    numerical::pcg::PCGSolver,
    optimization::optimizer::{OptimizationResult, Optimizer},
    report,
};
use num_traits::Float;

/// Configuration for Newton descent
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NewtonConfig<T: Scalar> {
    /// Gradient-norm tolerance ε
    pub tolerance: T,
    /// Upper bound on the PCG tolerance; the inner solve uses min(this, 0.1·ε)
    pub cg_tolerance: T,
    /// Maximum number of Newton steps
    pub max_iterations: usize,
    /// Report progress at `INFO` instead of `DEBUG`
    pub verbose: bool,
}

impl<T: Scalar> Default for NewtonConfig<T> {
    fn default() -> Self {
        Self {
            tolerance: T::DEFAULT_GRADIENT_TOLERANCE,
            cg_tolerance: T::DEFAULT_TOLERANCE,
            max_iterations: 1000,
            verbose: false,
        }
    }
}

impl<T: Scalar> NewtonConfig<T> {
    /// Create a new Newton configuration with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gradient-norm tolerance
    pub fn with_tolerance(mut self, tolerance: T) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the upper bound on the inner PCG tolerance
    pub fn with_cg_tolerance(mut self, cg_tolerance: T) -> Self {
        self.cg_tolerance = cg_tolerance;
        self
    }

    /// Set the maximum number of Newton steps
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Enable verbose progress reporting
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Checks that both tolerances are positive.
    pub fn validate(&self) -> Result<()> {
        if self.tolerance <= T::zero() {
            return Err(OptimizerError::invalid_configuration(
                "tolerance must be positive",
                "tolerance",
                self.tolerance.to_string(),
            ));
        }
        if self.cg_tolerance <= T::zero() {
            return Err(OptimizerError::invalid_configuration(
                "CG tolerance must be positive",
                "cg_tolerance",
                self.cg_tolerance.to_string(),
            ));
        }
        Ok(())
    }

    fn inner_tolerance(&self) -> T {
        Float::min(
            self.cg_tolerance,
            <T as Scalar>::from_f64(0.1) * self.tolerance,
        )
    }
}

/// Newton descent optimizer
#[derive(Debug, Clone, Default)]
pub struct Newton<T: Scalar> {
    config: NewtonConfig<T>,
}

impl<T: Scalar> Newton<T> {
    /// Create a new Newton optimizer with the given configuration
    pub fn new(config: NewtonConfig<T>) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &NewtonConfig<T> {
        &self.config
    }
}

impl<T: Scalar> Optimizer<T> for Newton<T> {
    fn name(&self) -> &str {
        "Newton"
    }

    fn minimize<F>(&self, f: &F, x0: &DVector<T>) -> Result<OptimizationResult<T>>
    where
        F: Objective<T> + ?Sized,
    {
        self.config.validate()?;
        let start = Instant::now();
        let verbose = self.config.verbose;
        let eps = self.config.tolerance;
        let solver = PCGSolver::with_tolerance(self.config.inner_tolerance());

        report!(verbose, dimension = x0.len(), "start Newton descent");

        let mut x = x0.clone();
        let mut value = f.objective(&x)?;
        let mut gradient = f.gradient(&x)?;
        let mut history = vec![value];
        let mut iterations = 0;
        let mut evaluations = 1;

        while gradient.norm() > eps {
            if iterations >= self.config.max_iterations {
                return Err(OptimizerError::max_iterations_reached(
                    self.config.max_iterations,
                    Scalar::to_f64(value),
                    Scalar::to_f64(gradient.norm()),
                    Scalar::to_f64(eps),
                ));
            }

            let hessian = f.hessian(&x)?;
            let direction = solver.solve(&hessian, &(-&gradient))?.solution;
            x += &direction;
            value = f.objective(&x)?;
            gradient = f.gradient(&x)?;
            history.push(value);
            iterations += 1;
            evaluations += 1;

            tracing::trace!(
                iteration = iterations,
                value = Scalar::to_f64(value),
                gradient_norm = Scalar::to_f64(gradient.norm()),
                "Newton step"
            );
        }

        let gradient_norm = gradient.norm();
        report!(
            verbose,
            iterations,
            gradient_norm = Scalar::to_f64(gradient_norm),
            "Newton descent terminated"
        );

        Ok(
            OptimizationResult::new(x, value, gradient_norm, iterations, start.elapsed())
                .with_function_evaluations(evaluations)
                .with_gradient_evaluations(evaluations)
                .with_value_history(history),
        )
    }
}
