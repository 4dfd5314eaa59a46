//! Tests that accepted Wolfe-Powell steps satisfy both Wolfe conditions and
//! that projected backtracking steps satisfy the projected Armijo rule.

use descentopt_core::prelude::*;
use proptest::prelude::*;

fn diagonal_quadratic(weights: &[f64], shift: &[f64]) -> QuadraticObjective<f64> {
    let a = DMatrix::from_diagonal(&DVector::from_column_slice(weights));
    let b = -(&a * DVector::from_column_slice(shift));
    QuadraticObjective::new(a, b, 0.0).unwrap()
}

proptest! {
    #[test]
    fn wolfe_powell_step_satisfies_both_conditions(
        weights in prop::collection::vec(0.1f64..50.0, 4),
        shift in prop::collection::vec(-5.0f64..5.0, 4),
        start in prop::collection::vec(-5.0f64..5.0, 4),
    ) {
        let f = diagonal_quadratic(&weights, &shift);
        let x = DVector::from_vec(start);
        let g = f.gradient(&x).unwrap();
        prop_assume!(g.norm() > 1e-6);

        let d = -&g;
        let params = LineSearchParams::wolfe_powell();
        let result = WolfePowellSearch::new().search(&f, &x, &d, &params).unwrap();

        let fx = f.objective(&x).unwrap();
        let descent = g.dot(&d);
        let t = result.step_size;
        prop_assert!(t > 0.0);
        prop_assert!(result.new_value <= fx + params.sigma * t * descent + 1e-12);

        let new_gradient = result.new_gradient.unwrap();
        prop_assert!(new_gradient.dot(&d) >= params.rho * descent - 1e-12);
    }
}

#[test]
fn test_wolfe_powell_reuses_caller_state() {
    let f = SimpleValleyObjective::<f64>::default();
    let x = DVector::from_vec(vec![1.0, 2.0]);
    let value = f.objective(&x).unwrap();
    let gradient = f.gradient(&x).unwrap();
    let d = -&gradient;
    let params = LineSearchParams::wolfe_powell();

    let fresh = WolfePowellSearch::new().search(&f, &x, &d, &params).unwrap();
    let reused = WolfePowellSearch::new()
        .search_from(&f, &x, value, &gradient, &d, &params)
        .unwrap();

    assert_eq!(fresh.step_size, reused.step_size);
    assert!(reused.function_evals < fresh.function_evals);
}

#[test]
fn test_projected_backtracking_respects_the_box() {
    let f = QuadraticObjective::<f64>::simple(2);
    let projection = BoxProjection::new(
        DVector::from_vec(vec![0.5, -1.0]),
        DVector::from_vec(vec![2.0, 1.0]),
    )
    .unwrap();
    let x = DVector::from_vec(vec![1.5, 0.8]);
    let d = -f.gradient(&x).unwrap();
    let params = LineSearchParams::projected_backtracking();

    let result = ProjectedBacktrackingSearch::new()
        .search(&f, &projection, &x, &d, &params)
        .unwrap();

    assert!(projection.contains(&result.new_point).unwrap());
    assert!(result.new_value < f.objective(&x).unwrap());
    assert!(result.step_size <= 1.0);
}
