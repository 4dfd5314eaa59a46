//! Preconditioned conjugate gradient solver for SPD systems.
//!
//! Solves `A·x = b` for symmetric positive-definite `A` until the absolute
//! residual satisfies `‖A·x − b‖ ≤ δ`.
//!
//! # Algorithm
//!
//! With preconditioner `M ≈ A` and the residual convention `r = A·x − b`:
//!
//! 1. `x₀ = M⁻¹b`, `r₀ = A·x₀ − b`, `z₀ = M⁻¹r₀`, `d₀ = −z₀`, `ρ₀ = r₀ᵀz₀`
//! 2. `q = A·d`, `κ = dᵀq`, `t = ρ/κ`
//! 3. `x ← x + t·d`, `r ← r + t·q`, `z = M⁻¹r`
//! 4. `ρ' = rᵀz`, `d ← −z + (ρ'/ρ)·d`
//!
//! A non-positive curvature `κ` means `A` is not positive definite and is
//! reported as a numerical error.

use crate::core::{
    error::{OptimizerError, Result},
    types::{DMatrix, DVector, Scalar},
};
use crate::numerical::preconditioner::{IncompleteCholesky, Preconditioner};
use crate::report;
use num_traits::Float;

/// Configuration for the PCG solver.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PCGConfig<T>
where
    T: Scalar,
{
    /// Absolute residual tolerance δ
    pub tolerance: T,
    /// Iteration cap; `None` uses `max(10·n, 10)`
    pub max_iterations: Option<usize>,
    /// Report progress at `INFO` instead of `DEBUG`
    pub verbose: bool,
}

impl<T> Default for PCGConfig<T>
where
    T: Scalar,
{
    fn default() -> Self {
        Self {
            tolerance: T::DEFAULT_TOLERANCE,
            max_iterations: None,
            verbose: false,
        }
    }
}

impl<T> PCGConfig<T>
where
    T: Scalar,
{
    /// Creates a new configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the residual tolerance.
    pub fn with_tolerance(mut self, tolerance: T) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets an explicit iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Enables or disables verbose progress reports.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Checks the parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance > T::zero()) {
            return Err(OptimizerError::invalid_configuration(
                "tolerance must be positive",
                "tolerance",
                self.tolerance.to_string(),
            ));
        }
        Ok(())
    }

    fn iteration_cap(&self, n: usize) -> usize {
        self.max_iterations.unwrap_or_else(|| (10 * n).max(10))
    }
}

/// Solution of a PCG solve.
#[derive(Debug, Clone)]
pub struct PCGResult<T>
where
    T: Scalar,
{
    /// The approximate solution x
    pub solution: DVector<T>,
    /// Number of CG iterations performed
    pub iterations: usize,
    /// Final residual norm ‖A·x − b‖
    pub residual_norm: T,
}

/// Preconditioned conjugate gradient solver.
#[derive(Debug, Clone, Default)]
pub struct PCGSolver<T>
where
    T: Scalar,
{
    config: PCGConfig<T>,
}

impl<T> PCGSolver<T>
where
    T: Scalar,
{
    /// Creates a solver with the given configuration.
    pub fn new(config: PCGConfig<T>) -> Self {
        Self { config }
    }

    /// Creates a solver with the given tolerance and defaults elsewhere.
    pub fn with_tolerance(tolerance: T) -> Self {
        Self::new(PCGConfig::new().with_tolerance(tolerance))
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PCGConfig<T> {
        &self.config
    }

    /// Solves `A·x = b` preconditioned with the incomplete Cholesky factor
    /// of `A`.
    pub fn solve(&self, a: &DMatrix<T>, b: &DVector<T>) -> Result<PCGResult<T>> {
        self.config.validate()?;
        check_system(a, b)?;
        let preconditioner = IncompleteCholesky::new(a)?;
        self.solve_with_preconditioner(a, b, &preconditioner)
    }

    /// Solves `A·x = b` with an explicit preconditioner.
    pub fn solve_with_preconditioner<P>(
        &self,
        a: &DMatrix<T>,
        b: &DVector<T>,
        preconditioner: &P,
    ) -> Result<PCGResult<T>>
    where
        P: Preconditioner<T> + ?Sized,
    {
        self.config.validate()?;
        check_system(a, b)?;

        let verbose = self.config.verbose;
        let tolerance = self.config.tolerance;
        let max_iterations = self.config.iteration_cap(b.len());
        report!(
            verbose,
            dimension = b.len(),
            preconditioner = preconditioner.name(),
            "start PCG solver"
        );

        let mut x = preconditioner.apply(b)?;
        let mut r = a * &x - b;
        let mut z = preconditioner.apply(&r)?;
        let mut d = -&z;
        let mut rho = r.dot(&z);
        let mut iterations = 0;

        loop {
            if r.norm() <= tolerance {
                // The recursive residual drifts from A·x − b; only stop on the true one.
                let true_residual = a * &x - b;
                let converged = true_residual.norm() <= tolerance;
                r = true_residual;
                if converged {
                    break;
                }
                tracing::trace!(
                    iteration = iterations,
                    residual_norm = Scalar::to_f64(r.norm()),
                    "PCG restart from the true residual"
                );
                z = preconditioner.apply(&r)?;
                d = -&z;
                rho = r.dot(&z);
            }
            if iterations >= max_iterations {
                return Err(OptimizerError::max_iterations_reached(
                    max_iterations,
                    f64::NAN,
                    Scalar::to_f64(r.norm()),
                    Scalar::to_f64(tolerance),
                ));
            }

            let q = a * &d;
            let kappa = d.dot(&q);
            if !(kappa > T::zero()) {
                return Err(OptimizerError::numerical_error(
                    "matrix is not positive definite",
                ));
            }

            let t = rho / kappa;
            x += &d * t;
            r += &q * t;
            z = preconditioner.apply(&r)?;

            let rho_next = r.dot(&z);
            let beta = rho_next / rho;
            d = &d * beta - &z;
            rho = rho_next;
            iterations += 1;

            tracing::trace!(
                iteration = iterations,
                residual_norm = Scalar::to_f64(r.norm()),
                "PCG step"
            );
        }

        let residual_norm = r.norm();
        if !Float::is_finite(residual_norm) {
            return Err(OptimizerError::numerical_error("PCG residual is not finite"));
        }
        report!(
            verbose,
            iterations,
            residual_norm = Scalar::to_f64(residual_norm),
            "PCG solver terminated"
        );

        Ok(PCGResult {
            solution: x,
            iterations,
            residual_norm,
        })
    }
}

/// Solves `A·x = b` to the tolerance `delta` and returns only `x`.
pub fn pcg_solve<T: Scalar>(a: &DMatrix<T>, b: &DVector<T>, delta: T) -> Result<DVector<T>> {
    PCGSolver::with_tolerance(delta)
        .solve(a, b)
        .map(|result| result.solution)
}

fn check_system<T: Scalar>(a: &DMatrix<T>, b: &DVector<T>) -> Result<()> {
    if a.nrows() != b.len() || a.ncols() != b.len() {
        return Err(OptimizerError::dimension_mismatch(
            format!("{0}x{0} matrix", b.len()),
            format!("{}x{} matrix", a.nrows(), a.ncols()),
        ));
    }
    Ok(())
}
