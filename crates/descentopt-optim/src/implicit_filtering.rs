//! Implicit filtering for noisy objectives
//!
//! Implicit filtering minimizes an objective that can only be evaluated
//! with noise, over a closed convex set. Derivatives are replaced by the
//! central simplex gradient at a sequence of decreasing scales h₁ > h₂ > …
//! so that large scales step over the noise and small scales refine.
//!
//! # Algorithm
//!
//! At each scale h a projected steepest descent runs from the best point
//! found so far, using the simplex gradient g and the step
//! d = −min(1, 10h/‖g‖)·g. It stops on the first of:
//!
//! - stencil failure at x (no neighbour on the stencil improves f(x))
//! - ‖x − P(x − g)‖ ≤ ε·h
//! - 10·n steps
//! - a backtracking failure
//!
//! One sweep visits every scale; the outer loop repeats sweeps until one
//! leaves the best point unchanged.

use std::time::Instant;

use descentopt_core::{
    core::{
        error::{OptimizerError, Result},
        objective::Objective,
        projection::Projection,
        types::{DVector, Scalar},
    },
    numerical::simplex_gradient::{simplex_gradient, stencil_failure},
    optimization::optimizer::OptimizationResult,
    report,
};
use num_traits::Float;

/// Configuration for implicit filtering
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImplicitFilteringConfig<T: Scalar> {
    /// Stencil scales, visited in order in every sweep
    pub scales: Vec<T>,
    /// Stationarity tolerance ε; a scale h stops at ‖x − P(x − g)‖ ≤ ε·h
    pub tolerance: T,
    /// Sufficient decrease parameter σ of the inner backtracking
    pub sigma: T,
    /// Number of step halvings after which the inner backtracking fails
    pub max_halvings: usize,
    /// Maximum number of sweeps over all scales
    pub max_sweeps: usize,
    /// Report progress at `INFO` instead of `DEBUG`
    pub verbose: bool,
}

impl<T: Scalar> Default for ImplicitFilteringConfig<T> {
    fn default() -> Self {
        Self {
            scales: [1.0, 1e-1, 1e-2, 1e-3, 1e-4, 1e-5]
                .iter()
                .map(|&h| <T as Scalar>::from_f64(h))
                .collect(),
            tolerance: T::DEFAULT_GRADIENT_TOLERANCE,
            sigma: <T as Scalar>::from_f64(1e-4),
            max_halvings: 10,
            max_sweeps: 100,
            verbose: false,
        }
    }
}

impl<T: Scalar> ImplicitFilteringConfig<T> {
    /// Create a new configuration with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the stencil scales
    pub fn with_scales(mut self, scales: Vec<T>) -> Self {
        self.scales = scales;
        self
    }

    /// Set the stationarity tolerance
    pub fn with_tolerance(mut self, tolerance: T) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the sufficient decrease parameter
    pub fn with_sigma(mut self, sigma: T) -> Self {
        self.sigma = sigma;
        self
    }

    /// Set the maximum number of sweeps
    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    /// Enable verbose progress reporting
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Checks that the scale list is non-empty with positive entries and
    /// that ε > 0 and σ ∈ (0, 1).
    pub fn validate(&self) -> Result<()> {
        if self.scales.is_empty() {
            return Err(OptimizerError::invalid_configuration(
                "at least one scale is required",
                "scales",
                "[]",
            ));
        }
        if let Some(h) = self.scales.iter().find(|&&h| h <= T::zero()) {
            return Err(OptimizerError::invalid_configuration(
                "scales must be positive",
                "scales",
                h.to_string(),
            ));
        }
        if self.tolerance <= T::zero() {
            return Err(OptimizerError::invalid_configuration(
                "tolerance must be positive",
                "tolerance",
                self.tolerance.to_string(),
            ));
        }
        if self.sigma <= T::zero() || self.sigma >= T::one() {
            return Err(OptimizerError::invalid_configuration(
                "sigma must be in (0, 1)",
                "sigma",
                self.sigma.to_string(),
            ));
        }
        Ok(())
    }
}

/// Why the steepest descent at one scale stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleTermination {
    /// No point on the stencil improves the center
    StencilFailure,
    /// Projected simplex-gradient step below ε·h
    Stationary,
    /// 10·n steps taken
    StepLimit,
    /// Backtracking ran out of halvings
    LineSearchFailure,
}

/// Implicit filtering optimizer
#[derive(Debug, Clone, Default)]
pub struct ImplicitFiltering<T: Scalar> {
    config: ImplicitFilteringConfig<T>,
}

impl<T: Scalar> ImplicitFiltering<T> {
    /// Create a new optimizer with the given configuration
    pub fn new(config: ImplicitFilteringConfig<T>) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ImplicitFilteringConfig<T> {
        &self.config
    }

    /// Returns the optimizer's name.
    pub fn name(&self) -> &str {
        "Implicit Filtering"
    }

    /// Minimizes `f` over the set of `projection`, starting from P(x0).
    ///
    /// `iterations` counts sweeps and `gradient_norm` holds the projected
    /// simplex-gradient stationarity at the smallest scale.
    pub fn minimize<F, P>(
        &self,
        f: &F,
        projection: &P,
        x0: &DVector<T>,
    ) -> Result<OptimizationResult<T>>
    where
        F: Objective<T> + ?Sized,
        P: Projection<T> + ?Sized,
    {
        self.config.validate()?;
        let start = Instant::now();
        let verbose = self.config.verbose;

        report!(
            verbose,
            dimension = x0.len(),
            scales = self.config.scales.len(),
            "start implicit filtering"
        );

        let mut best = projection.project(x0)?;
        let mut best_value = f.objective(&best)?;
        let mut history = vec![best_value];
        let mut evaluations = 1;
        let mut sweeps = 0;

        loop {
            if sweeps >= self.config.max_sweeps {
                return Err(OptimizerError::max_iterations_reached(
                    self.config.max_sweeps,
                    Scalar::to_f64(best_value),
                    f64::NAN,
                    Scalar::to_f64(self.config.tolerance),
                ));
            }
            sweeps += 1;
            let sweep_start = best.clone();

            for &h in &self.config.scales {
                let (candidate, stop, used) = self.descend_at_scale(f, projection, &best, h)?;
                let candidate_value = f.objective(&candidate)?;
                evaluations += used + 1;

                tracing::trace!(
                    sweep = sweeps,
                    scale = Scalar::to_f64(h),
                    stop = ?stop,
                    value = Scalar::to_f64(candidate_value),
                    "scale finished"
                );

                if candidate != best && candidate_value < best_value {
                    best = candidate;
                    best_value = candidate_value;
                }
            }
            history.push(best_value);

            report!(
                verbose,
                sweep = sweeps,
                value = Scalar::to_f64(best_value),
                "implicit filtering sweep"
            );

            if best == sweep_start {
                break;
            }
        }

        let finest = self
            .config
            .scales
            .iter()
            .copied()
            .fold(<T as Float>::infinity(), <T as Float>::min);
        let gradient = simplex_gradient(f, &best, finest)?;
        evaluations += 2 * best.len();
        let stationarity = (&best - projection.project(&(&best - &gradient))?).norm();

        report!(
            verbose,
            sweeps,
            stationarity = Scalar::to_f64(stationarity),
            "implicit filtering terminated"
        );

        Ok(
            OptimizationResult::new(best, best_value, stationarity, sweeps, start.elapsed())
                .with_function_evaluations(evaluations)
                .with_value_history(history),
        )
    }

    /// Projected steepest descent on the simplex gradient at scale `h`.
    ///
    /// Returns the final point, the stopping cause and the number of
    /// objective evaluations spent.
    fn descend_at_scale<F, P>(
        &self,
        f: &F,
        projection: &P,
        x0: &DVector<T>,
        h: T,
    ) -> Result<(DVector<T>, ScaleTermination, usize)>
    where
        F: Objective<T> + ?Sized,
        P: Projection<T> + ?Sized,
    {
        let n = x0.len();
        let max_steps = 10 * n;
        let sigma = self.config.sigma;
        let half = <T as Scalar>::from_f64(0.5);
        let ten = <T as Scalar>::from_f64(10.0);
        let threshold = self.config.tolerance * h;

        let mut x = projection.project(x0)?;
        let mut evaluations = 0;
        let mut steps = 0;

        let stop = loop {
            let gradient = simplex_gradient(f, &x, h)?;
            let failed = stencil_failure(f, &x, h)?;
            evaluations += 4 * n + 1;
            if failed {
                break ScaleTermination::StencilFailure;
            }
            if (&x - projection.project(&(&x - &gradient))?).norm() <= threshold {
                break ScaleTermination::Stationary;
            }
            if steps >= max_steps {
                break ScaleTermination::StepLimit;
            }

            let scaling = Float::min(T::one(), ten * h / gradient.norm());
            let direction = &gradient * (-scaling);
            let value = f.objective(&x)?;
            evaluations += 1;

            let mut t = T::one();
            let mut halvings = 0;
            let accepted = loop {
                let trial = projection.project(&(&x + &direction * t))?;
                let trial_value = f.objective(&trial)?;
                evaluations += 1;
                let gap = (&x - projection.project(&(&x - &gradient * t))?).norm_squared();
                if trial_value <= value - sigma / t * gap {
                    break Some(trial);
                }
                if halvings >= self.config.max_halvings {
                    break None;
                }
                t = t * half;
                halvings += 1;
            };

            match accepted {
                Some(trial) => {
                    x = trial;
                    steps += 1;
                }
                None => break ScaleTermination::LineSearchFailure,
            }
        };

        Ok((x, stop, evaluations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use descentopt_core::{
        core::{objective::QuadraticObjective, projection::BallProjection},
        problems::{MultidimensionalObjective, NoisyObjective},
    };

    fn expected_minimizer() -> DVector<f64> {
        let mut x = DVector::zeros(8);
        x[0] = 0.290;
        x[1] = 0.072;
        x[2] = 0.020;
        x
    }

    fn small_ball() -> BallProjection<f64> {
        BallProjection::new(DVector::zeros(8), 0.3).unwrap()
    }

    #[test]
    fn test_noise_free_objective_in_ball() {
        let f = MultidimensionalObjective::<f64>::default();
        let optimizer = ImplicitFiltering::new(ImplicitFilteringConfig::new());

        let result = optimizer
            .minimize(&f, &small_ball(), &DVector::from_element(8, 1.0))
            .unwrap();

        assert!((&result.point - expected_minimizer()).norm() < 1e-2);
        assert!(result.point.norm() <= 0.3 + 1e-12);
        assert!(result.is_monotone());
    }

    #[test]
    fn test_noisy_objective_in_ball() {
        let f = NoisyObjective::with_seed(1.0, 42);
        let config = ImplicitFilteringConfig::new()
            .with_scales(vec![1.0, 0.1])
            .with_tolerance(0.1);
        let mut x0 = DVector::from_element(8, 1.0);
        x0[0] = 10.0;

        let result = ImplicitFiltering::new(config)
            .minimize(&f, &small_ball(), &x0)
            .unwrap();

        assert!((&result.point - expected_minimizer()).norm() < 5e-2);
    }

    #[test]
    fn test_stencil_failure_at_minimizer() {
        let f = QuadraticObjective::<f64>::simple(2);
        let projection = BallProjection::new(DVector::zeros(2), 1.0).unwrap();
        let optimizer = ImplicitFiltering::new(ImplicitFilteringConfig::new());
        let x0 = DVector::zeros(2);

        let (x, stop, _) = optimizer.descend_at_scale(&f, &projection, &x0, 0.1).unwrap();
        assert_eq!(stop, ScaleTermination::StencilFailure);
        assert_eq!(x, x0);

        let result = optimizer.minimize(&f, &projection, &x0).unwrap();
        assert_eq!(result.iterations, 1);
        assert_eq!(result.point, x0);
    }

    #[test]
    fn test_rejects_bad_scales() {
        let f = QuadraticObjective::<f64>::simple(2);
        let projection = BallProjection::new(DVector::zeros(2), 1.0).unwrap();
        let x0 = DVector::zeros(2);

        for scales in [vec![], vec![1.0, 0.0]] {
            let optimizer = ImplicitFiltering::new(ImplicitFilteringConfig::new().with_scales(scales));
            let err = optimizer.minimize(&f, &projection, &x0).unwrap_err();
            assert!(matches!(err, OptimizerError::InvalidConfiguration { .. }));
        }
    }

    #[test]
    fn test_sweep_cap() {
        let f = MultidimensionalObjective::<f64>::default();
        let optimizer = ImplicitFiltering::new(ImplicitFilteringConfig::new().with_max_sweeps(1));
        let err = optimizer
            .minimize(&f, &small_ball(), &DVector::from_element(8, 1.0))
            .unwrap_err();
        assert!(matches!(
            err,
            OptimizerError::MaxIterationsReached { max_iterations: 1, .. }
        ));
    }
}
