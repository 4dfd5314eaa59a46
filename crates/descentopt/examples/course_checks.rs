//! Runs every routine on its reference problem and logs the outcome.
//!
//! Run with: cargo run --example course_checks
//! (set RUST_LOG=debug to see per-routine progress, trace for inner steps)

use descentopt::prelude::*;
use descentopt::init_logger;

fn main() -> Result<()> {
    init_logger();

    // PCG on a small SPD system
    let a = DMatrix::from_row_slice(3, 3, &[4.0, 1.0, 0.0, 1.0, 7.0, 0.0, 0.0, 0.0, 3.0]);
    let b = DVector::from_vec(vec![5.0, 8.0, 3.0]);
    let x = pcg_solve(&a, &b, 1e-6)?;
    tracing::info!(solution = ?x.as_slice(), "PCG");

    // Wolfe-Powell step on the valley
    let valley = SimpleValleyObjective::new(DVector::from_vec(vec![0.0, 1.0]))?;
    let step = WolfePowellSearch::new().search(
        &valley,
        &DVector::from_vec(vec![-1.2, 1.0]),
        &DVector::from_vec(vec![0.1, 1.0]),
        &LineSearchParams::wolfe_powell(),
    )?;
    tracing::info!(step = step.step_size, "Wolfe-Powell");

    // Newton and BFGS on the 8-dimensional objective
    let f = MultidimensionalObjective::<f64>::default();
    let x0 = DVector::from_element(8, 1.0);
    let bfgs = BFGS::new(BFGSConfig::new().with_verbose(true)).minimize_with_inverse_hessian(&f, &x0)?;
    tracing::info!(
        point = ?bfgs.result.point.as_slice(),
        iterations = bfgs.result.iterations,
        resets = bfgs.resets,
        "BFGS"
    );

    let near = MultidimensionalObjective::<f64>::local_minimizer();
    let newton = Newton::new(NewtonConfig::new()).minimize(&f, &near)?;
    tracing::info!(value = newton.value, iterations = newton.iterations, "Newton");

    // Levenberg-Marquardt on the two-point fit
    let model = LeastSquaresModel::new(
        SimpleValleyObjective::default(),
        DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 1.0, 2.0]),
        DVector::from_vec(vec![2.0, 3.0]),
    )?;
    let fit = LevenbergMarquardt::new(LevenbergMarquardtConfig::new())
        .minimize(&model, &DVector::from_vec(vec![180.0, 0.0]))?;
    tracing::info!(parameters = ?fit.point.as_slice(), "Levenberg-Marquardt");

    // Projected Newton-CG on a box
    let unit_valley = SimpleValleyObjective::<f64>::default();
    let corner_box = BoxProjection::new(
        DVector::from_vec(vec![1.0, 1.0]),
        DVector::from_vec(vec![2.0, 2.0]),
    )?;
    let projected = ProjectedNewtonCG::new(ProjectedNewtonCGConfig::new())
        .minimize(&unit_valley, &corner_box, &DVector::from_vec(vec![2.0, 2.0]))?;
    tracing::info!(point = ?projected.point.as_slice(), "projected Newton-CG");

    // Augmented Lagrangian objective
    let two = DMatrix::from_diagonal_element(2, 2, 2.0);
    let al = AugmentedLagrangianObjective::new(
        QuadraticObjective::new(two.clone(), DVector::zeros(2), 1.0)?,
        QuadraticObjective::new(two, DVector::zeros(2), -1.0)?,
        -1.0,
        10.0,
    )?;
    let at = DVector::from_vec(vec![2.0, 2.0]);
    let value = al.objective(&at)?;
    let gradient = al.gradient(&at)?;
    tracing::info!(value, gradient = ?gradient.as_slice(), "augmented Lagrangian");

    // Implicit filtering on the noisy objective in a ball
    let noisy = NoisyObjective::new(1.0);
    let ball = BallProjection::new(DVector::zeros(8), 0.3)?;
    let mut start = DVector::from_element(8, 1.0);
    start[0] = 10.0;
    let filtered = ImplicitFiltering::new(
        ImplicitFilteringConfig::new()
            .with_scales(vec![1.0, 0.1])
            .with_tolerance(0.1)
            .with_verbose(true),
    )
    .minimize(&noisy, &ball, &start)?;
    tracing::info!(point = ?filtered.point.as_slice(), sweeps = filtered.iterations, "implicit filtering");

    Ok(())
}
