//! Projected inexact Newton-CG
//!
//! Minimizes f over a closed convex set given by a [`Projection`]. The
//! stopping functional is the projected stationarity
//!
//! stat(x) = ‖x − P(x − ∇f(x))‖
//!
//! Each outer step runs truncated CG on the reduced Hessian, which acts as
//! the identity on the active index set, until the residual drops below the
//! forcing term η = min(½, stat)·stat or non-positive curvature shows up.
//! The resulting direction is globalized by projected backtracking.

use std::time::Instant;

use descentopt_core::{
    core::{
        error::{OptimizerError, Result},
        objective::Objective,
        projection::Projection,
        types::{check_len, DVector, Scalar},
    },
    optimization::{
        line_search::{LineSearchParams, ProjectedBacktrackingSearch},
        optimizer::OptimizationResult,
    },
    report,
};
use num_traits::Float;

/// Configuration for projected inexact Newton-CG
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProjectedNewtonCGConfig<T: Scalar> {
    /// Projected stationarity tolerance ε, also the curvature threshold of the
    /// inner CG loop
    pub tolerance: T,
    /// Projected backtracking parameters
    pub line_search_params: LineSearchParams<T>,
    /// Cap on inner CG steps per outer iteration (10·n when `None`)
    pub max_cg_iterations: Option<usize>,
    /// Maximum number of outer iterations
    pub max_iterations: usize,
    /// Report progress at `INFO` instead of `DEBUG`
    pub verbose: bool,
}

impl<T: Scalar> Default for ProjectedNewtonCGConfig<T> {
    fn default() -> Self {
        Self {
            tolerance: T::DEFAULT_GRADIENT_TOLERANCE,
            line_search_params: LineSearchParams::projected_backtracking(),
            max_cg_iterations: None,
            max_iterations: 1000,
            verbose: false,
        }
    }
}

impl<T: Scalar> ProjectedNewtonCGConfig<T> {
    /// Create a new configuration with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the projected stationarity tolerance
    pub fn with_tolerance(mut self, tolerance: T) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the projected backtracking parameters
    pub fn with_line_search_params(mut self, params: LineSearchParams<T>) -> Self {
        self.line_search_params = params;
        self
    }

    /// Set the cap on inner CG steps
    pub fn with_max_cg_iterations(mut self, max_cg_iterations: usize) -> Self {
        self.max_cg_iterations = Some(max_cg_iterations);
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

    /// Checks the tolerance and the backtracking parameters.
    pub fn validate(&self) -> Result<()> {
        if self.tolerance <= T::zero() {
            return Err(OptimizerError::invalid_configuration(
                "tolerance must be positive",
                "tolerance",
                self.tolerance.to_string(),
            ));
        }
        self.line_search_params.validate_backtracking()
    }

    fn cg_cap(&self, n: usize) -> usize {
        self.max_cg_iterations.unwrap_or(10 * n)
    }
}

/// Applies the reduced Hessian at `x` to `d`.
///
/// Entries of `d` in the active index set of `x` pass through unchanged; the
/// inactive entries receive the Hessian applied to `d` with its active
/// entries zeroed.
pub fn reduced_hessian_action<T, F, P>(
    f: &F,
    projection: &P,
    x: &DVector<T>,
    d: &DVector<T>,
) -> Result<DVector<T>>
where
    T: Scalar,
    F: Objective<T> + ?Sized,
    P: Projection<T> + ?Sized,
{
    check_len(d, x.len())?;
    let active = projection.active_index_set(x)?;
    let mut inactive_part = d.clone();
    for &i in &active {
        inactive_part[i] = T::zero();
    }
    let mut action = f.hessian_vector_product(x, &inactive_part)?;
    for &i in &active {
        action[i] = d[i];
    }
    Ok(action)
}

/// Projected inexact Newton-CG optimizer
#[derive(Debug, Clone, Default)]
pub struct ProjectedNewtonCG<T: Scalar> {
    config: ProjectedNewtonCGConfig<T>,
}

impl<T: Scalar> ProjectedNewtonCG<T> {
    /// Create a new optimizer with the given configuration
    pub fn new(config: ProjectedNewtonCGConfig<T>) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ProjectedNewtonCGConfig<T> {
        &self.config
    }

    /// Returns the optimizer's name.
    pub fn name(&self) -> &str {
        "Projected Newton-CG"
    }

    /// Minimizes `f` over the set of `projection`, starting from P(x0).
    ///
    /// `gradient_norm` in the result holds the projected stationarity.
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
        let eps = self.config.tolerance;
        let cg_cap = self.config.cg_cap(x0.len());
        let line_search = ProjectedBacktrackingSearch::new();
        let half = <T as Scalar>::from_f64(0.5);
        let (atol, rtol) = (<T as Scalar>::from_f64(1e-8), <T as Scalar>::from_f64(1e-5));

        report!(verbose, dimension = x0.len(), "start projected Newton-CG");

        let mut x = projection.project(x0)?;
        let mut value = f.objective(&x)?;
        let mut gradient = f.gradient(&x)?;
        let mut stationarity = (&x - projection.project(&(&x - &gradient))?).norm();
        let mut history = vec![value];
        let mut iterations = 0;
        let mut function_evaluations = 1;
        let mut gradient_evaluations = 1;

        while stationarity > eps {
            if iterations >= self.config.max_iterations {
                return Err(OptimizerError::max_iterations_reached(
                    self.config.max_iterations,
                    Scalar::to_f64(value),
                    Scalar::to_f64(stationarity),
                    Scalar::to_f64(eps),
                ));
            }
            iterations += 1;

            // Truncated CG on the reduced Hessian at x.
            let eta = Float::min(half, stationarity) * stationarity;
            let mut xj = x.clone();
            let mut rj = gradient.clone();
            let mut dj = -&rj;
            let mut cg_steps = 0;
            while rj.norm() > eta {
                if cg_steps >= cg_cap {
                    return Err(OptimizerError::max_iterations_reached(
                        cg_cap,
                        Scalar::to_f64(value),
                        Scalar::to_f64(rj.norm()),
                        Scalar::to_f64(eta),
                    ));
                }
                cg_steps += 1;

                let d_a = reduced_hessian_action(f, projection, &x, &dj)?;
                let curvature = dj.dot(&d_a);
                if curvature <= eps * dj.norm_squared() {
                    tracing::trace!(cg_steps, "non-positive curvature in truncated CG");
                    break;
                }
                let t = rj.norm_squared() / curvature;
                xj += &dj * t;
                let r_next = &rj + &d_a * t;
                let beta = r_next.norm_squared() / rj.norm_squared();
                dj = &dj * beta - &r_next;
                rj = r_next;
            }

            let direction = if approx::relative_eq!(xj, x, epsilon = atol, max_relative = rtol) {
                -&gradient
            } else {
                &xj - &x
            };

            let step = line_search.search(
                f,
                projection,
                &x,
                &direction,
                &self.config.line_search_params,
            )?;
            function_evaluations += step.function_evals;
            gradient_evaluations += step.gradient_evals;

            x = step.new_point;
            value = step.new_value;
            gradient = f.gradient(&x)?;
            gradient_evaluations += 1;
            stationarity = (&x - projection.project(&(&x - &gradient))?).norm();
            history.push(value);

            tracing::trace!(
                iteration = iterations,
                cg_steps,
                step = Scalar::to_f64(step.step_size),
                stationarity = Scalar::to_f64(stationarity),
                "projected Newton-CG step"
            );
        }

        report!(
            verbose,
            iterations,
            stationarity = Scalar::to_f64(stationarity),
            "projected Newton-CG terminated"
        );

        Ok(
            OptimizationResult::new(x, value, stationarity, iterations, start.elapsed())
                .with_function_evaluations(function_evaluations)
                .with_gradient_evaluations(gradient_evaluations)
                .with_value_history(history),
        )
    }
}
