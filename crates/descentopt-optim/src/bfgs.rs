//! BFGS quasi-Newton descent
//!
//! BFGS maintains an approximation B of the inverse Hessian and moves along
//! d = −B·∇f(x) with a Wolfe-Powell step. The curvature condition enforced
//! by the line search keeps yᵀs positive, so B stays SPD; whenever that
//! fails, or d is not a descent direction, B is reset to the identity.
//!
//! ## Update Formula
//!
//! With s = x' − x, y = ∇f(x') − ∇f(x) and ρ = 1/(yᵀs):
//!
//! B' = (I − ρ·s·yᵀ)·B·(I − ρ·y·sᵀ) + ρ·s·sᵀ

use std::time::Instant;

use descentopt_core::{
    core::{
        error::{OptimizerError, Result},
        objective::Objective,
        types::{DMatrix, DVector, Scalar},
    },
    optimization::{
        line_search::{LineSearchParams, WolfePowellSearch},
        optimizer::{OptimizationResult, Optimizer},
    },
    report,
};

/// Configuration for BFGS descent
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BFGSConfig<T: Scalar> {
    /// Gradient-norm tolerance ε
    pub tolerance: T,
    /// Wolfe-Powell parameters (σ = 10⁻³, ρ = 10⁻² by default)
    pub line_search_params: LineSearchParams<T>,
    /// Maximum number of outer iterations
    pub max_iterations: usize,
    /// Report progress at `INFO` instead of `DEBUG`
    pub verbose: bool,
}

impl<T: Scalar> Default for BFGSConfig<T> {
    fn default() -> Self {
        Self {
            tolerance: T::DEFAULT_GRADIENT_TOLERANCE,
            line_search_params: LineSearchParams::wolfe_powell(),
            max_iterations: 10_000,
            verbose: false,
        }
    }
}

impl<T: Scalar> BFGSConfig<T> {
    /// Create a new BFGS configuration with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gradient-norm tolerance
    pub fn with_tolerance(mut self, tolerance: T) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the Wolfe-Powell parameters
    pub fn with_line_search_params(mut self, params: LineSearchParams<T>) -> Self {
        self.line_search_params = params;
        self
    }

    /// Set the maximum number of outer iterations
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Enable verbose progress reporting
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Checks the tolerance and the line-search parameters.
    pub fn validate(&self) -> Result<()> {
        if self.tolerance <= T::zero() {
            return Err(OptimizerError::invalid_configuration(
                "tolerance must be positive",
                "tolerance",
                self.tolerance.to_string(),
            ));
        }
        self.line_search_params.validate_wolfe_powell()
    }
}

/// Result of a BFGS run: the optimization result and the final inverse
/// Hessian approximation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BFGSResult<T: Scalar> {
    /// Final point, value and counters
    pub result: OptimizationResult<T>,
    /// Inverse BFGS matrix at termination
    pub inverse_hessian: DMatrix<T>,
    /// Number of times B was reset to the identity
    pub resets: usize,
}

/// BFGS descent optimizer
#[derive(Debug, Clone, Default)]
pub struct BFGS<T: Scalar> {
    config: BFGSConfig<T>,
}

impl<T: Scalar> BFGS<T> {
    /// Create a new BFGS optimizer with the given configuration
    pub fn new(config: BFGSConfig<T>) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &BFGSConfig<T> {
        &self.config
    }

    /// Minimizes `f` from `x0` and also returns the inverse BFGS matrix.
    pub fn minimize_with_inverse_hessian<F>(&self, f: &F, x0: &DVector<T>) -> Result<BFGSResult<T>>
    where
        F: Objective<T> + ?Sized,
    {
        let n = x0.len();
        self.minimize_from_inverse_hessian(f, x0, DMatrix::identity(n, n))
    }

    /// Minimizes `f` from `x0`, starting the iteration with the inverse
    /// Hessian approximation `b0` instead of the identity.
    ///
    /// Passing the `inverse_hessian` of an earlier [`BFGSResult`] warm-starts
    /// a follow-up run. A `b0` that does not yield a descent direction is
    /// replaced by the identity on the first iteration.
    pub fn minimize_from_inverse_hessian<F>(
        &self,
        f: &F,
        x0: &DVector<T>,
        b0: DMatrix<T>,
    ) -> Result<BFGSResult<T>>
    where
        F: Objective<T> + ?Sized,
    {
        self.config.validate()?;
        let n = x0.len();
        if b0.nrows() != n || b0.ncols() != n {
            return Err(OptimizerError::dimension_mismatch(
                format!("{n}x{n} matrix"),
                format!("{}x{} matrix", b0.nrows(), b0.ncols()),
            ));
        }
        let start = Instant::now();
        let verbose = self.config.verbose;
        let eps = self.config.tolerance;
        let identity = DMatrix::<T>::identity(n, n);
        let line_search = WolfePowellSearch::new();

        report!(verbose, dimension = n, "start BFGS descent");

        let mut x = x0.clone();
        let mut value = f.objective(&x)?;
        let mut gradient = f.gradient(&x)?;
        let mut b = b0;
        let mut history = vec![value];
        let mut iterations = 0;
        let mut resets = 0;
        let mut function_evaluations = 1;
        let mut gradient_evaluations = 1;

        while gradient.norm() > eps {
            if iterations >= self.config.max_iterations {
                return Err(OptimizerError::max_iterations_reached(
                    self.config.max_iterations,
                    Scalar::to_f64(value),
                    Scalar::to_f64(gradient.norm()),
                    Scalar::to_f64(eps),
                ));
            }

            let mut direction = -(&b * &gradient);
            if direction.dot(&gradient) >= T::zero() {
                report!(verbose, iteration = iterations, "reset BFGS matrix: no descent direction");
                direction = -&gradient;
                b = identity.clone();
                resets += 1;
            }

            let step = line_search.search_from(
                f,
                &x,
                value,
                &gradient,
                &direction,
                &self.config.line_search_params,
            )?;
            function_evaluations += step.function_evals;
            gradient_evaluations += step.gradient_evals;

            let new_gradient = match step.new_gradient {
                Some(g) => g,
                None => {
                    gradient_evaluations += 1;
                    f.gradient(&step.new_point)?
                }
            };
            let s = &step.new_point - &x;
            let y = &new_gradient - &gradient;

            match inverse_hessian_update(&b, &s, &y) {
                Some(updated) => b = updated,
                None => {
                    report!(verbose, iteration = iterations, "reset BFGS matrix: yᵀs is not positive");
                    b = identity.clone();
                    resets += 1;
                }
            }

            x = step.new_point;
            value = step.new_value;
            gradient = new_gradient;
            history.push(value);
            iterations += 1;

            tracing::trace!(
                iteration = iterations,
                step = Scalar::to_f64(step.step_size),
                value = Scalar::to_f64(value),
                gradient_norm = Scalar::to_f64(gradient.norm()),
                "BFGS step"
            );
        }

        let gradient_norm = gradient.norm();
        report!(
            verbose,
            iterations,
            resets,
            gradient_norm = Scalar::to_f64(gradient_norm),
            "BFGS descent terminated"
        );

        let result =
            OptimizationResult::new(x, value, gradient_norm, iterations, start.elapsed())
                .with_function_evaluations(function_evaluations)
                .with_gradient_evaluations(gradient_evaluations)
                .with_value_history(history);

        Ok(BFGSResult {
            result,
            inverse_hessian: b,
            resets,
        })
    }
}

/// BFGS update of the inverse Hessian approximation `b` for the step `s`
/// and gradient change `y`.
///
/// Returns `None` when yᵀs ≤ 0, where the update would lose positive
/// definiteness.
pub fn inverse_hessian_update<T: Scalar>(
    b: &DMatrix<T>,
    s: &DVector<T>,
    y: &DVector<T>,
) -> Option<DMatrix<T>> {
    let curvature = y.dot(s);
    if curvature <= T::zero() {
        return None;
    }

    let n = s.len();
    let identity = DMatrix::<T>::identity(n, n);
    let rho = T::one() / curvature;
    let left = &identity - (s * y.transpose()) * rho;
    let right = &identity - (y * s.transpose()) * rho;
    Some(&left * b * &right + (s * s.transpose()) * rho)
}

impl<T: Scalar> Optimizer<T> for BFGS<T> {
    fn name(&self) -> &str {
        "BFGS"
    }

    fn minimize<F>(&self, f: &F, x0: &DVector<T>) -> Result<OptimizationResult<T>>
    where
        F: Objective<T> + ?Sized,
    {
        self.minimize_with_inverse_hessian(f, x0)
            .map(|bfgs| bfgs.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use descentopt_core::problems::{MultidimensionalObjective, SimpleValleyObjective};

    #[test]
    fn test_bfgs_on_valley_recovers_inverse_hessian() {
        let f = SimpleValleyObjective::<f64>::default();
        let optimizer = BFGS::new(BFGSConfig::new().with_tolerance(1e-6));

        let out = optimizer
            .minimize_with_inverse_hessian(&f, &DVector::from_vec(vec![1.0, 2.0]))
            .unwrap();

        assert!(out.result.gradient_norm <= 1e-6);
        assert_relative_eq!(out.result.point, DVector::from_vec(vec![0.0, 1.0]), epsilon = 1e-6);
        let expected = DMatrix::from_diagonal(&DVector::from_vec(vec![1.0, 0.5]));
        assert_relative_eq!(out.inverse_hessian, expected, epsilon = 1e-2);
    }

    #[test]
    fn test_bfgs_reaches_local_minimizer() {
        let f = MultidimensionalObjective::<f64>::default();
        let optimizer = BFGS::new(BFGSConfig::new());

        let out = optimizer
            .minimize_with_inverse_hessian(&f, &DVector::from_element(8, 1.0))
            .unwrap();

        assert!(out.result.gradient_norm <= 1e-3);
        assert_relative_eq!(
            out.result.point,
            MultidimensionalObjective::local_minimizer(),
            epsilon = 1e-3
        );
        assert!(out.result.is_monotone());

        let b = &out.inverse_hessian;
        assert_relative_eq!(b.clone(), b.transpose(), epsilon = 1e-8);
        assert!(b.clone().cholesky().is_some());
    }

    #[test]
    fn test_bfgs_iteration_cap() {
        let f = MultidimensionalObjective::<f64>::default();
        let optimizer = BFGS::new(BFGSConfig::new().with_max_iterations(2));
        let err = optimizer.minimize(&f, &DVector::from_element(8, 1.0)).unwrap_err();
        assert!(err.is_non_convergence());
    }

    #[test]
    fn test_inverse_update_satisfies_secant_equation() {
        let b = DMatrix::<f64>::identity(2, 2);
        let s = DVector::from_vec(vec![1.0, 0.5]);
        let y = DVector::from_vec(vec![2.0, 0.5]);

        let updated = inverse_hessian_update(&b, &s, &y).unwrap();

        assert_relative_eq!(&updated * &y, s, epsilon = 1e-12);
        assert!(updated.cholesky().is_some());
    }

    #[test]
    fn test_inverse_update_rejects_negative_curvature() {
        let b = DMatrix::<f64>::identity(2, 2);
        let s = DVector::from_vec(vec![1.0, 0.0]);

        assert!(inverse_hessian_update(&b, &s, &DVector::from_vec(vec![-1.0, 0.0])).is_none());
        assert!(inverse_hessian_update(&b, &s, &DVector::from_vec(vec![0.0, 3.0])).is_none());
    }

    #[test]
    fn test_bfgs_resets_non_descent_start_matrix() {
        let f = SimpleValleyObjective::<f64>::default();
        let optimizer = BFGS::new(BFGSConfig::new().with_tolerance(1e-6));
        let flipped = -DMatrix::<f64>::identity(2, 2);

        let out = optimizer
            .minimize_from_inverse_hessian(&f, &DVector::from_vec(vec![1.0, 2.0]), flipped)
            .unwrap();

        assert!(out.resets >= 1);
        assert_relative_eq!(out.result.point, DVector::from_vec(vec![0.0, 1.0]), epsilon = 1e-6);
        assert!(out.inverse_hessian.clone().cholesky().is_some());
        assert!(out.result.is_monotone());
    }

    #[test]
    fn test_bfgs_warm_start_checks_dimensions() {
        let f = SimpleValleyObjective::<f64>::default();
        let err = BFGS::new(BFGSConfig::new())
            .minimize_from_inverse_hessian(&f, &DVector::zeros(2), DMatrix::identity(3, 3))
            .unwrap_err();
        assert!(matches!(err, OptimizerError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_bfgs_rejects_bad_line_search_params() {
        let f = SimpleValleyObjective::<f64>::default();
        let params = LineSearchParams::wolfe_powell().with_rho(1e-4);
        let optimizer = BFGS::new(BFGSConfig::new().with_line_search_params(params));
        let err = optimizer.minimize(&f, &DVector::zeros(2)).unwrap_err();
        assert!(matches!(err, OptimizerError::InvalidConfiguration { .. }));
    }
}
