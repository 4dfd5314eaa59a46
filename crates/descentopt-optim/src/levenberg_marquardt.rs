//! Levenberg-Marquardt descent for nonlinear least squares
//!
//! Minimizes ½‖r(p)‖² over the parameters of a [`ResidualModel`]. Each trial
//! step solves the damped normal equations
//!
//! (JᵀJ + α·I)·d = −Jᵀr
//!
//! with the preconditioned CG solver. A step is accepted when it lowers the
//! residual, after which the damping is reset to α₀; a rejected step
//! multiplies the damping by β and retries from the same parameters.

use std::time::Instant;

use descentopt_core::{
    core::{
        error::{OptimizerError, Result},
        objective::ResidualModel,
        types::{DMatrix, DVector, Scalar},
    },
    numerical::pcg::PCGSolver,
    optimization::optimizer::OptimizationResult,
    report,
};

/// Configuration for Levenberg-Marquardt descent
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevenbergMarquardtConfig<T: Scalar> {
    /// Tolerance ε on ‖Jᵀr‖
    pub tolerance: T,
    /// Initial damping α₀, restored after every accepted step
    pub initial_damping: T,
    /// Damping growth factor β applied after a rejected step
    pub damping_growth: T,
    /// Tolerance of the inner PCG solve
    pub cg_tolerance: T,
    /// Maximum number of trial steps, accepted and rejected
    pub max_iterations: usize,
    /// Report progress at `INFO` instead of `DEBUG`
    pub verbose: bool,
}

impl<T: Scalar> Default for LevenbergMarquardtConfig<T> {
    fn default() -> Self {
        Self {
            tolerance: <T as Scalar>::from_f64(1e-4),
            initial_damping: <T as Scalar>::from_f64(1e-3),
            damping_growth: <T as Scalar>::from_f64(100.0),
            cg_tolerance: T::DEFAULT_TOLERANCE,
            max_iterations: 1000,
            verbose: false,
        }
    }
}

impl<T: Scalar> LevenbergMarquardtConfig<T> {
    /// Create a new configuration with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tolerance on ‖Jᵀr‖
    pub fn with_tolerance(mut self, tolerance: T) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the initial damping α₀
    pub fn with_initial_damping(mut self, alpha: T) -> Self {
        self.initial_damping = alpha;
        self
    }

    /// Set the damping growth factor β
    pub fn with_damping_growth(mut self, beta: T) -> Self {
        self.damping_growth = beta;
        self
    }

    /// Set the inner PCG tolerance
    pub fn with_cg_tolerance(mut self, cg_tolerance: T) -> Self {
        self.cg_tolerance = cg_tolerance;
        self
    }

    /// Set the maximum number of trial steps
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Enable verbose progress reporting
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Checks ε > 0, α₀ > 0, β > 1 and a positive CG tolerance.
    pub fn validate(&self) -> Result<()> {
        if self.tolerance <= T::zero() {
            return Err(OptimizerError::invalid_configuration(
                "tolerance must be positive",
                "tolerance",
                self.tolerance.to_string(),
            ));
        }
        if self.initial_damping <= T::zero() {
            return Err(OptimizerError::invalid_configuration(
                "initial damping must be positive",
                "initial_damping",
                self.initial_damping.to_string(),
            ));
        }
        if self.damping_growth <= T::one() {
            return Err(OptimizerError::invalid_configuration(
                "damping growth must exceed 1",
                "damping_growth",
                self.damping_growth.to_string(),
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
}

/// Result of a Levenberg-Marquardt run with the damping record.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevenbergMarquardtResult<T: Scalar> {
    /// Final parameters, value and counters
    pub result: OptimizationResult<T>,
    /// Damping α used by each trial step, in order
    pub damping_history: Vec<T>,
    /// Number of trial steps that did not lower the residual
    pub rejected_steps: usize,
}

/// Levenberg-Marquardt least-squares optimizer
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt<T: Scalar> {
    config: LevenbergMarquardtConfig<T>,
}

impl<T: Scalar> LevenbergMarquardt<T> {
    /// Create a new optimizer with the given configuration
    pub fn new(config: LevenbergMarquardtConfig<T>) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &LevenbergMarquardtConfig<T> {
        &self.config
    }

    /// Returns the optimizer's name.
    pub fn name(&self) -> &str {
        "Levenberg-Marquardt"
    }

    /// Fits the parameters of `model` starting from `p0`.
    ///
    /// The returned `value` is ½‖r(p)‖² and `gradient_norm` is ‖Jᵀr‖.
    /// `iterations` counts every trial step, rejected ones included.
    pub fn minimize<R>(&self, model: &R, p0: &DVector<T>) -> Result<OptimizationResult<T>>
    where
        R: ResidualModel<T> + ?Sized,
    {
        self.minimize_with_damping(model, p0).map(|lm| lm.result)
    }

    /// Like [`LevenbergMarquardt::minimize`], also returning the damping of
    /// every trial step and the number of rejected steps.
    pub fn minimize_with_damping<R>(
        &self,
        model: &R,
        p0: &DVector<T>,
    ) -> Result<LevenbergMarquardtResult<T>>
    where
        R: ResidualModel<T> + ?Sized,
    {
        self.config.validate()?;
        let start = Instant::now();
        let verbose = self.config.verbose;
        let eps = self.config.tolerance;
        let alpha0 = self.config.initial_damping;
        let m = p0.len();
        let identity = DMatrix::<T>::identity(m, m);
        let solver = PCGSolver::with_tolerance(self.config.cg_tolerance);
        let half = <T as Scalar>::from_f64(0.5);

        report!(verbose, parameters = m, "start Levenberg-Marquardt descent");

        let mut p = p0.clone();
        let mut residual = model.residual(&p)?;
        let mut jacobian = model.jacobian(&p)?;
        let mut value = residual.norm_squared() * half;
        let mut gradient = jacobian.tr_mul(&residual);
        let mut alpha = alpha0;
        let mut history = vec![value];
        let mut damping_history = Vec::new();
        let mut iterations = 0;
        let mut rejected = 0;
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
            iterations += 1;
            damping_history.push(alpha);

            let normal_matrix = jacobian.tr_mul(&jacobian) + &identity * alpha;
            let direction = -solver.solve(&normal_matrix, &gradient)?.solution;
            let trial = &p + &direction;
            let trial_residual = model.residual(&trial)?;
            let trial_value = trial_residual.norm_squared() * half;
            evaluations += 1;

            if trial_value < value {
                p = trial;
                residual = trial_residual;
                jacobian = model.jacobian(&p)?;
                value = trial_value;
                gradient = jacobian.tr_mul(&residual);
                alpha = alpha0;
                history.push(value);
                tracing::trace!(
                    iteration = iterations,
                    value = Scalar::to_f64(value),
                    gradient_norm = Scalar::to_f64(gradient.norm()),
                    "Levenberg-Marquardt step accepted"
                );
            } else {
                alpha = alpha * self.config.damping_growth;
                rejected += 1;
                tracing::trace!(
                    iteration = iterations,
                    damping = Scalar::to_f64(alpha),
                    "Levenberg-Marquardt step rejected"
                );
            }
        }

        let gradient_norm = gradient.norm();
        report!(
            verbose,
            iterations,
            rejected,
            gradient_norm = Scalar::to_f64(gradient_norm),
            "Levenberg-Marquardt descent terminated"
        );

        let result = OptimizationResult::new(p, value, gradient_norm, iterations, start.elapsed())
            .with_function_evaluations(evaluations)
            .with_gradient_evaluations(history.len())
            .with_value_history(history);

        Ok(LevenbergMarquardtResult {
            result,
            damping_history,
            rejected_steps: rejected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use descentopt_core::problems::{LeastSquaresModel, SimpleValleyObjective};

    fn two_point_fit() -> LeastSquaresModel<f64, SimpleValleyObjective<f64>> {
        let x_data = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 1.0, 2.0]);
        let f_data = DVector::from_vec(vec![2.0, 3.0]);
        LeastSquaresModel::new(SimpleValleyObjective::default(), x_data, f_data).unwrap()
    }

    #[test]
    fn test_levenberg_marquardt_two_point_fit() {
        let model = two_point_fit();
        let optimizer = LevenbergMarquardt::new(LevenbergMarquardtConfig::new());

        let result = optimizer
            .minimize(&model, &DVector::from_vec(vec![180.0, 0.0]))
            .unwrap();

        assert!(result.gradient_norm <= 1e-4);
        assert_relative_eq!(result.point, DVector::from_vec(vec![1.0, 1.0]), epsilon = 1e-3);
        assert!(result.is_monotone());
    }

    /// r(p) = atan(p), whose undamped Gauss-Newton step overshoots for |p| > 1.4.
    #[derive(Debug)]
    struct ArctanResidual;

    impl ResidualModel<f64> for ArctanResidual {
        fn residual(&self, p: &DVector<f64>) -> Result<DVector<f64>> {
            Ok(DVector::from_element(1, p[0].atan()))
        }

        fn jacobian(&self, p: &DVector<f64>) -> Result<DMatrix<f64>> {
            Ok(DMatrix::from_element(1, 1, 1.0 / (1.0 + p[0] * p[0])))
        }
    }

    #[test]
    fn test_levenberg_marquardt_rejects_overshooting_step() {
        let optimizer = LevenbergMarquardt::new(LevenbergMarquardtConfig::new().with_tolerance(1e-8));

        let out = optimizer
            .minimize_with_damping(&ArctanResidual, &DVector::from_element(1, 2.0))
            .unwrap();

        assert_relative_eq!(out.result.point[0], 0.0, epsilon = 1e-6);
        assert!(out.rejected_steps >= 1);
        assert!(out.result.iterations > out.result.value_history.len() - 1);
        assert_eq!(out.damping_history.len(), out.result.iterations);
        assert!(out.result.is_monotone());

        // rejected at α₀, accepted at β·α₀, then back to α₀
        assert_relative_eq!(out.damping_history[0], 1e-3);
        assert_relative_eq!(out.damping_history[1], 1e-1);
        assert_relative_eq!(out.damping_history[2], 1e-3);
    }

    #[test]
    fn test_levenberg_marquardt_at_solution() {
        let model = two_point_fit();
        let p0 = DVector::from_vec(vec![1.0, 1.0]);
        let result = LevenbergMarquardt::new(LevenbergMarquardtConfig::new())
            .minimize(&model, &p0)
            .unwrap();
        assert_eq!(result.iterations, 0);
        assert_eq!(result.value, 0.0);
    }

    #[test]
    fn test_levenberg_marquardt_rejects_bad_config() {
        let model = two_point_fit();
        let p0 = DVector::from_vec(vec![0.0, 0.0]);

        for config in [
            LevenbergMarquardtConfig::new().with_tolerance(0.0),
            LevenbergMarquardtConfig::new().with_initial_damping(-1.0),
            LevenbergMarquardtConfig::new().with_damping_growth(1.0),
        ] {
            let err = LevenbergMarquardt::new(config).minimize(&model, &p0).unwrap_err();
            assert!(matches!(err, OptimizerError::InvalidConfiguration { .. }));
        }
    }

    #[test]
    fn test_levenberg_marquardt_iteration_cap() {
        let model = two_point_fit();
        let optimizer =
            LevenbergMarquardt::new(LevenbergMarquardtConfig::new().with_max_iterations(0));
        let err = optimizer
            .minimize(&model, &DVector::from_vec(vec![180.0, 0.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            OptimizerError::MaxIterationsReached { max_iterations: 0, .. }
        ));
    }
}
