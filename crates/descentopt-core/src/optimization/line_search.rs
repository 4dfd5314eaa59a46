//! Line search algorithms for descent methods.
//!
//! This module implements the two step-length strategies used by the descent
//! routines: the Wolfe-Powell bracket-and-bisect search for unconstrained
//! quasi-Newton methods, and the projected backtracking search for methods
//! that stay inside a convex feasible set.
//!
//! # Mathematical Foundation
//!
//! Given a point x, a direction d and an objective f, a line search picks a
//! step t > 0 for the update x ← x + t·d (or x ← P(x + t·d) under a
//! projection P).
//!
//! ## Wolfe-Powell Conditions
//!
//! With σ ∈ (0, ½) and ρ ∈ (σ, 1):
//! 1. **WP1** (sufficient decrease): f(x + t·d) ≤ f(x) + t·σ·∇f(x)ᵀd
//! 2. **WP2** (curvature): ∇f(x + t·d)ᵀd ≥ ρ·∇f(x)ᵀd
//!
//! ## Projected Sufficient Decrease
//!
//! With σ ∈ (0, 1) and the gradient g taken at P(x):
//!
//! f(P(x + t·d)) ≤ f(x) − (σ/t)·‖x − P(x − t·g)‖²
//!
//! # Algorithm Variants
//!
//! ## Wolfe-Powell Search
//! - **Strategy**: Starts at t = 1, halves or doubles until a bracket
//!   [t₋, t₊] with WP1 at t₋ and not at t₊ is found, then bisects until WP2
//!   holds at t₋.
//! - **Applications**: BFGS, where WP2 keeps the inverse update positive
//!   definite.
//!
//! ## Projected Backtracking Search
//! - **Strategy**: Pure backtracking from t = 1, never expanding past 1.
//! - **Applications**: Projected Newton-CG and other box/ball constrained
//!   methods.
//!
//! Every phase is capped by `max_iterations`; exceeding a cap is reported as
//! `LineSearchFailed`.
//!
//! # Examples
//!
//! ```rust
//! # use descentopt_core::prelude::*;
//! let f = SimpleValleyObjective::new(DVector::from_vec(vec![0.0, 1.0]))?;
//! let x = DVector::from_vec(vec![-1.2, 1.0]);
//! let d = DVector::from_vec(vec![0.1, 1.0]);
//!
//! let result = WolfePowellSearch::new().search(&f, &x, &d, &LineSearchParams::wolfe_powell())?;
//! assert_eq!(result.step_size, 16.0);
//! # Ok::<(), OptimizerError>(())
//! ```

use crate::core::{
    error::{OptimizerError, Result},
    objective::{directional_derivative, Objective},
    projection::Projection,
    types::{check_len, DVector, Scalar},
};
use crate::report;

/// Result of a line search.
///
/// Captures the accepted step together with the state at the new point so
/// that callers can reuse the evaluations.
#[derive(Debug, Clone)]
pub struct LineSearchResult<T>
where
    T: Scalar,
{
    /// The accepted step size t
    pub step_size: T,

    /// The new point x + t·d, or P(x + t·d) for projected searches
    pub new_point: DVector<T>,

    /// The objective value at the new point
    pub new_value: T,

    /// The gradient at the new point (if computed during the search)
    pub new_gradient: Option<DVector<T>>,

    /// Number of objective evaluations performed
    pub function_evals: usize,

    /// Number of gradient evaluations performed
    pub gradient_evals: usize,
}

/// Parameters for the line searches.
///
/// # Parameter Guidelines
///
/// ## For Wolfe-Powell
/// ```rust
/// # use descentopt_core::prelude::*;
/// let params = LineSearchParams::<f64>::wolfe_powell(); // σ = 10⁻³, ρ = 10⁻²
/// ```
///
/// ## For Projected Backtracking
/// ```rust
/// # use descentopt_core::prelude::*;
/// let params = LineSearchParams::<f64>::projected_backtracking().with_sigma(0.5);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineSearchParams<T>
where
    T: Scalar,
{
    /// Sufficient decrease parameter σ
    pub sigma: T,

    /// Curvature parameter ρ ∈ (σ, 1), used by Wolfe-Powell only
    pub rho: T,

    /// Iteration cap for each halving, doubling or bisection phase
    pub max_iterations: usize,

    /// Report progress at `INFO` instead of `DEBUG`
    pub verbose: bool,
}

impl<T> Default for LineSearchParams<T>
where
    T: Scalar,
{
    fn default() -> Self {
        Self::wolfe_powell()
    }
}

impl<T> LineSearchParams<T>
where
    T: Scalar,
{
    /// Parameters for the Wolfe-Powell search: σ = 10⁻³, ρ = 10⁻².
    pub fn wolfe_powell() -> Self {
        Self {
            sigma: <T as Scalar>::from_f64(1e-3),
            rho: <T as Scalar>::from_f64(1e-2),
            max_iterations: 100,
            verbose: false,
        }
    }

    /// Parameters for the projected backtracking search: σ = 10⁻⁴.
    pub fn projected_backtracking() -> Self {
        Self {
            sigma: <T as Scalar>::from_f64(1e-4),
            ..Self::wolfe_powell()
        }
    }

    /// Sets the sufficient decrease parameter.
    pub fn with_sigma(mut self, sigma: T) -> Self {
        self.sigma = sigma;
        self
    }

    /// Sets the curvature parameter.
    pub fn with_rho(mut self, rho: T) -> Self {
        self.rho = rho;
        self
    }

    /// Sets the per-phase iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Enables or disables verbose progress reports.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Validates σ ∈ (0, ½) and ρ ∈ (σ, 1).
    pub fn validate_wolfe_powell(&self) -> Result<()> {
        let half = <T as Scalar>::from_f64(0.5);
        if !(self.sigma > T::zero() && self.sigma < half) {
            return Err(OptimizerError::invalid_configuration(
                "sigma must lie in (0, 0.5)",
                "sigma",
                self.sigma.to_string(),
            ));
        }
        if !(self.rho > self.sigma && self.rho < T::one()) {
            return Err(OptimizerError::invalid_configuration(
                "rho must lie in (sigma, 1)",
                "rho",
                self.rho.to_string(),
            ));
        }
        self.validate_iterations()
    }

    /// Validates σ ∈ (0, 1).
    pub fn validate_backtracking(&self) -> Result<()> {
        if !(self.sigma > T::zero() && self.sigma < T::one()) {
            return Err(OptimizerError::invalid_configuration(
                "sigma must lie in (0, 1)",
                "sigma",
                self.sigma.to_string(),
            ));
        }
        self.validate_iterations()
    }

    fn validate_iterations(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(OptimizerError::invalid_configuration(
                "maximum iterations must be at least 1",
                "max_iterations",
                "0",
            ));
        }
        Ok(())
    }
}

/// Objective and evaluation counters for one search.
struct Probe<'a, T, F>
where
    T: Scalar,
    F: ?Sized,
{
    f: &'a F,
    x: &'a DVector<T>,
    d: &'a DVector<T>,
    function_evals: usize,
    gradient_evals: usize,
}

impl<'a, T, F> Probe<'a, T, F>
where
    T: Scalar,
    F: Objective<T> + ?Sized,
{
    fn new(f: &'a F, x: &'a DVector<T>, d: &'a DVector<T>) -> Self {
        Self {
            f,
            x,
            d,
            function_evals: 0,
            gradient_evals: 0,
        }
    }

    fn value_at(&mut self, point: &DVector<T>) -> Result<T> {
        self.function_evals += 1;
        self.f.objective(point)
    }

    fn gradient_at(&mut self, point: &DVector<T>) -> Result<DVector<T>> {
        self.gradient_evals += 1;
        self.f.gradient(point)
    }

    /// Point x + t·d and its value.
    fn step(&mut self, t: T) -> Result<(DVector<T>, T)> {
        let point = self.x + self.d * t;
        let value = self.value_at(&point)?;
        Ok((point, value))
    }
}

/// Wolfe-Powell line search.
///
/// Returns a step t satisfying both WP1 and WP2:
///
/// 1. If WP1 fails at t = 1, t is halved until WP1 holds; then t₋ = t and
///    t₊ = 2t.
/// 2. Otherwise, if WP2 holds at t = 1, the search returns 1.
/// 3. Otherwise t is doubled while WP1 holds; at the first failure t₊ = t and
///    t₋ = t/2.
/// 4. While WP2 fails at t₋, the midpoint t of [t₋, t₊] replaces t₋ if WP1
///    holds there and t₊ otherwise.
///
/// WP1 holds at t₋ throughout, so the returned t₋ satisfies both conditions.
#[derive(Debug, Clone, Copy, Default)]
pub struct WolfePowellSearch;

impl WolfePowellSearch {
    /// Creates a new Wolfe-Powell line search.
    pub fn new() -> Self {
        Self
    }

    /// Returns a human-readable name.
    pub fn name(&self) -> &str {
        "Wolfe-Powell"
    }

    /// Searches along `d` from `x`.
    ///
    /// # Errors
    ///
    /// - `InvalidSearchDirection` if ∇f(x)ᵀd ≥ 0
    /// - `InvalidConfiguration` if σ or ρ lie outside their ranges
    /// - `LineSearchFailed` if a phase exceeds `max_iterations`
    pub fn search<T, F>(
        &self,
        f: &F,
        x: &DVector<T>,
        d: &DVector<T>,
        params: &LineSearchParams<T>,
    ) -> Result<LineSearchResult<T>>
    where
        T: Scalar,
        F: Objective<T> + ?Sized,
    {
        check_len(d, x.len())?;
        let mut probe = Probe::new(f, x, d);
        let fx = probe.value_at(x)?;
        let gradient = probe.gradient_at(x)?;
        self.search_with_state(probe, fx, &gradient, params)
    }

    /// Searches along `d` reusing f(x) and ∇f(x) computed by the caller.
    pub fn search_from<T, F>(
        &self,
        f: &F,
        x: &DVector<T>,
        value: T,
        gradient: &DVector<T>,
        d: &DVector<T>,
        params: &LineSearchParams<T>,
    ) -> Result<LineSearchResult<T>>
    where
        T: Scalar,
        F: Objective<T> + ?Sized,
    {
        check_len(d, x.len())?;
        check_len(gradient, x.len())?;
        self.search_with_state(Probe::new(f, x, d), value, gradient, params)
    }

    fn search_with_state<T, F>(
        &self,
        mut probe: Probe<'_, T, F>,
        fx: T,
        gradient: &DVector<T>,
        params: &LineSearchParams<T>,
    ) -> Result<LineSearchResult<T>>
    where
        T: Scalar,
        F: Objective<T> + ?Sized,
    {
        let descent = directional_derivative(gradient, probe.d)?;
        if descent >= T::zero() {
            return Err(OptimizerError::invalid_search_direction(Scalar::to_f64(
                descent,
            )));
        }
        params.validate_wolfe_powell()?;

        let sigma = params.sigma;
        let curvature_bound = params.rho * descent;
        let cap = params.max_iterations;
        let two = <T as Scalar>::from_f64(2.0);
        let half = <T as Scalar>::from_f64(0.5);
        let wp1 = |t: T, value: T| value <= fx + t * sigma * descent;
        let fail = |reason: &str, iterations: usize, t: T| {
            OptimizerError::line_search_failed(
                reason,
                iterations,
                Scalar::to_f64(t),
                Scalar::to_f64(fx),
            )
        };

        report!(
            params.verbose,
            value = Scalar::to_f64(fx),
            descent = Scalar::to_f64(descent),
            "start Wolfe-Powell search"
        );

        let mut t = T::one();
        let (mut point, mut value) = probe.step(t)?;
        let mut t_plus;
        // ∇f at the current t, when already evaluated
        let mut known_gradient = None;

        if !wp1(t, value) {
            let mut halvings = 0;
            loop {
                if halvings >= cap {
                    return Err(fail("step halving did not reach sufficient decrease", halvings, t));
                }
                t = t * half;
                halvings += 1;
                (point, value) = probe.step(t)?;
                tracing::trace!(step = Scalar::to_f64(t), "Wolfe-Powell halving");
                if wp1(t, value) {
                    break;
                }
            }
            t_plus = t * two;
        } else {
            let new_gradient = probe.gradient_at(&point)?;
            if new_gradient.dot(probe.d) >= curvature_bound {
                return Ok(finish(params, probe, t, point, value, new_gradient));
            }
            known_gradient = Some(new_gradient);

            let mut doublings = 0;
            loop {
                if doublings >= cap {
                    return Err(fail("step doubling kept sufficient decrease", doublings, t));
                }
                let trial = t * two;
                doublings += 1;
                let (trial_point, trial_value) = probe.step(trial)?;
                tracing::trace!(step = Scalar::to_f64(trial), "Wolfe-Powell doubling");
                if !wp1(trial, trial_value) {
                    t_plus = trial;
                    break;
                }
                t = trial;
                point = trial_point;
                value = trial_value;
                known_gradient = None;
            }
        }

        // Bisection: WP1 holds at t, fails at t_plus.
        let mut new_gradient = match known_gradient {
            Some(gradient) => gradient,
            None => probe.gradient_at(&point)?,
        };
        let mut bisections = 0;
        while new_gradient.dot(probe.d) < curvature_bound {
            if bisections >= cap {
                return Err(fail("bisection did not reach the curvature condition", bisections, t));
            }
            bisections += 1;
            let middle = (t + t_plus) * half;
            let (middle_point, middle_value) = probe.step(middle)?;
            tracing::trace!(step = Scalar::to_f64(middle), "Wolfe-Powell bisection");
            if wp1(middle, middle_value) {
                t = middle;
                point = middle_point;
                value = middle_value;
                new_gradient = probe.gradient_at(&point)?;
            } else {
                t_plus = middle;
            }
        }

        Ok(finish(params, probe, t, point, value, new_gradient))
    }
}

fn finish<T, F>(
    params: &LineSearchParams<T>,
    probe: Probe<'_, T, F>,
    step_size: T,
    new_point: DVector<T>,
    new_value: T,
    new_gradient: DVector<T>,
) -> LineSearchResult<T>
where
    T: Scalar,
    F: ?Sized,
{
    report!(
        params.verbose,
        step = Scalar::to_f64(step_size),
        value = Scalar::to_f64(new_value),
        "Wolfe-Powell search terminated"
    );
    LineSearchResult {
        step_size,
        new_point,
        new_value,
        new_gradient: Some(new_gradient),
        function_evals: probe.function_evals,
        gradient_evals: probe.gradient_evals,
    }
}

/// Projected backtracking line search.
///
/// Returns the largest t = 2ᵐ ≤ 1 satisfying the projected sufficient
/// decrease condition. The search never expands past t = 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectedBacktrackingSearch;

impl ProjectedBacktrackingSearch {
    /// Creates a new projected backtracking line search.
    pub fn new() -> Self {
        Self
    }

    /// Returns a human-readable name.
    pub fn name(&self) -> &str {
        "Projected Backtracking"
    }

    /// Searches along `d` from `x` inside the set defined by `projection`.
    ///
    /// # Errors
    ///
    /// - `InvalidSearchDirection` if ∇f(P(x))ᵀd ≥ 0
    /// - `InvalidConfiguration` if σ ∉ (0, 1)
    /// - `LineSearchFailed` if the projected full step does not move `x`,
    ///   or after `max_iterations` halvings
    pub fn search<T, F, P>(
        &self,
        f: &F,
        projection: &P,
        x: &DVector<T>,
        d: &DVector<T>,
        params: &LineSearchParams<T>,
    ) -> Result<LineSearchResult<T>>
    where
        T: Scalar,
        F: Objective<T> + ?Sized,
        P: Projection<T> + ?Sized,
    {
        check_len(d, x.len())?;
        let mut probe = Probe::new(f, x, d);

        let projected = projection.project(x)?;
        let gradient = probe.gradient_at(&projected)?;
        let decrease = directional_derivative(&gradient, d)?;
        if decrease >= T::zero() {
            return Err(OptimizerError::invalid_search_direction(Scalar::to_f64(
                decrease,
            )));
        }
        params.validate_backtracking()?;

        let fx = probe.value_at(x)?;
        report!(
            params.verbose,
            value = Scalar::to_f64(fx),
            "start projected backtracking search"
        );

        if projection.project(&(x + d))? == *x {
            return Err(OptimizerError::line_search_failed(
                "point is stationary for the projection",
                0,
                1.0,
                Scalar::to_f64(fx),
            ));
        }

        let half = <T as Scalar>::from_f64(0.5);
        let mut t = T::one();
        let mut halvings = 0;
        loop {
            let candidate = projection.project(&(x + d * t))?;
            let value = probe.value_at(&candidate)?;
            let stationarity = (x - projection.project(&(x - &gradient * t))?).norm_squared();

            if value <= fx - params.sigma / t * stationarity {
                report!(
                    params.verbose,
                    step = Scalar::to_f64(t),
                    value = Scalar::to_f64(value),
                    "projected backtracking search terminated"
                );
                return Ok(LineSearchResult {
                    step_size: t,
                    new_point: candidate,
                    new_value: value,
                    new_gradient: None,
                    function_evals: probe.function_evals,
                    gradient_evals: probe.gradient_evals,
                });
            }

            if halvings >= params.max_iterations {
                return Err(OptimizerError::line_search_failed(
                    "projected sufficient decrease not reached",
                    halvings,
                    Scalar::to_f64(t),
                    Scalar::to_f64(fx),
                ));
            }
            halvings += 1;
            t = t * half;
            tracing::trace!(step = Scalar::to_f64(t), "projected backtracking halving");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::projection::BoxProjection;
    use crate::problems::SimpleValleyObjective;
    use approx::assert_relative_eq;

    fn valley() -> SimpleValleyObjective<f64> {
        SimpleValleyObjective::new(DVector::from_vec(vec![0.0, 1.0])).unwrap()
    }

    fn wolfe_step(x: [f64; 2], d: [f64; 2]) -> LineSearchResult<f64> {
        let x = DVector::from_row_slice(&x);
        let d = DVector::from_row_slice(&d);
        WolfePowellSearch::new()
            .search(&valley(), &x, &d, &LineSearchParams::wolfe_powell())
            .unwrap()
    }

    #[test]
    fn test_wolfe_powell_accepts_unit_step() {
        assert_eq!(wolfe_step([-1.01, 1.0], [1.0, 1.0]).step_size, 1.0);
    }

    #[test]
    fn test_wolfe_powell_expands() {
        let result = wolfe_step([-1.2, 1.0], [0.1, 1.0]);
        assert_eq!(result.step_size, 16.0);
        assert_relative_eq!(result.new_point[0], 0.4, epsilon = 1e-12);
        assert!(result.new_gradient.is_some());
    }

    #[test]
    fn test_wolfe_powell_contracts() {
        assert_eq!(wolfe_step([-0.2, 1.0], [1.0, 1.0]).step_size, 0.25);
    }

    #[test]
    fn test_wolfe_powell_rejects_ascent_direction() {
        let x = DVector::from_vec(vec![-0.2, 1.0]);
        let d = DVector::from_vec(vec![-1.0, 0.0]);
        let result = WolfePowellSearch::new().search(&valley(), &x, &d, &LineSearchParams::wolfe_powell());
        assert!(matches!(result, Err(OptimizerError::InvalidSearchDirection { .. })));
    }

    #[test]
    fn test_wolfe_powell_rejects_bad_parameters() {
        let x = DVector::from_vec(vec![-0.2, 1.0]);
        let d = DVector::from_vec(vec![1.0, 0.0]);
        let search = WolfePowellSearch::new();

        for params in [
            LineSearchParams::wolfe_powell().with_sigma(0.5),
            LineSearchParams::wolfe_powell().with_sigma(0.0),
            LineSearchParams::wolfe_powell().with_rho(1e-3),
            LineSearchParams::wolfe_powell().with_rho(1.0),
        ] {
            assert!(matches!(
                search.search(&valley(), &x, &d, &params),
                Err(OptimizerError::InvalidConfiguration { .. })
            ));
        }
    }

    #[test]
    fn test_wolfe_powell_phase_cap() {
        let x = DVector::from_vec(vec![-1.2, 1.0]);
        let d = DVector::from_vec(vec![0.1, 1.0]);
        let params = LineSearchParams::wolfe_powell().with_max_iterations(2);
        let result = WolfePowellSearch::new().search(&valley(), &x, &d, &params);
        assert!(matches!(result, Err(OptimizerError::LineSearchFailed { .. })));
    }

    /// f(x) = −x₀ + 0.2·x₀⁴, which drops along e₀ up to x₀ ≈ 1.08 and
    /// then rises steeply.
    #[derive(Debug)]
    struct QuarticDrop;

    impl Objective<f64> for QuarticDrop {
        fn objective(&self, x: &DVector<f64>) -> Result<f64> {
            Ok(-x[0] + 0.2 * x[0].powi(4))
        }

        fn gradient(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
            Ok(DVector::from_element(1, -1.0 + 0.8 * x[0].powi(3)))
        }
    }

    #[test]
    fn test_wolfe_powell_bisects_after_first_doubling() {
        // WP1 holds at 1 and fails at 2, WP2 fails at 1.
        let x = DVector::zeros(1);
        let d = DVector::from_element(1, 1.0);
        let gradient = QuarticDrop.gradient(&x).unwrap();

        let result = WolfePowellSearch::new()
            .search_from(&QuarticDrop, &x, 0.0, &gradient, &d, &LineSearchParams::wolfe_powell())
            .unwrap();

        assert_eq!(result.step_size, 1.5);
        assert_eq!(result.function_evals, 3);
        assert_eq!(result.gradient_evals, 2);
    }

    fn unit_box() -> BoxProjection<f64> {
        BoxProjection::new(
            DVector::from_vec(vec![-2.0, 1.0]),
            DVector::from_vec(vec![2.0, 2.0]),
        )
        .unwrap()
    }

    #[test]
    fn test_projected_backtracking() {
        let x = DVector::from_vec(vec![1.0, 1.0]);
        let d = DVector::from_vec(vec![-1.99, 0.0]);
        let params = LineSearchParams::projected_backtracking().with_sigma(0.5);

        let result = ProjectedBacktrackingSearch::new()
            .search(&valley(), &unit_box(), &x, &d, &params)
            .unwrap();
        assert_eq!(result.step_size, 0.5);
        assert_relative_eq!(result.new_point, DVector::from_vec(vec![0.005, 1.0]), epsilon = 1e-12);
    }

    #[test]
    fn test_projected_backtracking_never_expands() {
        let x = DVector::from_vec(vec![1.0, 1.0]);
        let d = DVector::from_vec(vec![-0.5, 0.0]);
        let result = ProjectedBacktrackingSearch::new()
            .search(&valley(), &unit_box(), &x, &d, &LineSearchParams::projected_backtracking())
            .unwrap();
        assert_eq!(result.step_size, 1.0);
    }

    #[test]
    fn test_projected_backtracking_stationary_point() {
        // Moving down in x₂ from the lower bound is undone by the projection.
        let f = SimpleValleyObjective::new(DVector::from_vec(vec![1.0, 0.0])).unwrap();
        let x = DVector::from_vec(vec![0.0, 1.5]);
        let d = DVector::from_vec(vec![0.0, -1.0]);
        let boxed = BoxProjection::new(
            DVector::from_vec(vec![0.0, 1.5]),
            DVector::from_vec(vec![1.0, 2.0]),
        )
        .unwrap();

        let result = ProjectedBacktrackingSearch::new().search(
            &f,
            &boxed,
            &x,
            &d,
            &LineSearchParams::projected_backtracking(),
        );
        assert!(matches!(result, Err(OptimizerError::LineSearchFailed { .. })));
    }
}
