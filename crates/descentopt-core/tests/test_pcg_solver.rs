//! Tests for the preconditioned conjugate gradient solver on random
//! symmetric positive definite systems.

use descentopt_core::prelude::*;
use proptest::prelude::*;

/// Symmetric, strictly diagonally dominant matrix with positive diagonal.
fn spd_matrix(n: usize, entries: &[f64]) -> DMatrix<f64> {
    let mut a = DMatrix::from_fn(n, n, |i, j| {
        let (lo, hi) = if i <= j { (i, j) } else { (j, i) };
        entries[lo * n + hi]
    });
    for i in 0..n {
        let off_diagonal: f64 = (0..n).filter(|&j| j != i).map(|j| a[(i, j)].abs()).sum();
        a[(i, i)] = off_diagonal + 1.0 + entries[i * n + i].abs();
    }
    a
}

proptest! {
    #[test]
    fn pcg_residual_is_below_tolerance(
        entries in prop::collection::vec(-1.0f64..1.0, 36),
        rhs in prop::collection::vec(-10.0f64..10.0, 6),
    ) {
        let a = spd_matrix(6, &entries);
        let b = DVector::from_vec(rhs);
        let result = PCGSolver::with_tolerance(1e-8).solve(&a, &b).unwrap();

        let true_residual = (&a * &result.solution - &b).norm();
        prop_assert!(true_residual <= 1e-8);
        prop_assert_eq!(result.residual_norm, true_residual);
    }

    #[test]
    fn incomplete_cholesky_matches_cholesky_on_dense_matrices(
        entries in prop::collection::vec(-1.0f64..1.0, 16),
    ) {
        let a = spd_matrix(4, &entries);
        let ic = IncompleteCholesky::new(&a).unwrap();
        let dense = a.clone().cholesky().unwrap();

        prop_assert_eq!(ic.shift(), 0.0);
        prop_assert!((ic.factor() - dense.l()).norm() <= 1e-10);
    }
}

#[test]
fn test_pcg_solve_helper() {
    let a = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
    let b = DVector::from_vec(vec![1.0, 2.0]);
    let x = pcg_solve(&a, &b, 1e-10).unwrap();
    assert!((x - DVector::from_vec(vec![1.0 / 11.0, 7.0 / 11.0])).norm() < 1e-9);
}
