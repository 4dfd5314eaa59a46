//! Preconditioning strategies for the conjugate-gradient solver.
//!
//! A preconditioner approximates `A⁻¹` cheaply. The default choice for the
//! PCG solver is the zero-fill incomplete Cholesky factorization, which keeps
//! the sparsity pattern of `A` in its lower-triangular factor and is applied
//! through one forward and one backward triangular solve.

use crate::core::{
    error::{OptimizerError, Result},
    types::{check_len, DMatrix, DVector, Scalar},
};
use num_traits::Float;
use std::fmt::Debug;

/// Maximum number of diagonal shifts tried before giving up.
const MAX_SHIFT_ATTEMPTS: usize = 64;

/// Preconditioner trait for residual transformations.
pub trait Preconditioner<T>: Debug
where
    T: Scalar,
{
    /// Applies the preconditioner to a residual vector, returning `M⁻¹r`.
    fn apply(&self, residual: &DVector<T>) -> Result<DVector<T>>;

    /// Returns the name of this preconditioner.
    fn name(&self) -> &str {
        "Generic Preconditioner"
    }
}

/// Identity preconditioner (no preconditioning).
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityPreconditioner;

impl<T> Preconditioner<T> for IdentityPreconditioner
where
    T: Scalar,
{
    fn apply(&self, residual: &DVector<T>) -> Result<DVector<T>> {
        Ok(residual.clone())
    }

    fn name(&self) -> &str {
        "Identity"
    }
}

/// Zero-fill incomplete Cholesky factor `L` with `L·Lᵀ ≈ A + shift·I`.
///
/// The factor is immutable once built. Entries of `L` are only computed where
/// the lower triangle of `A` is non-zero, so for dense matrices the factor is
/// the exact Cholesky factor.
#[derive(Debug, Clone)]
pub struct IncompleteCholesky<T>
where
    T: Scalar,
{
    factor: DMatrix<T>,
    shift: T,
}

impl<T> IncompleteCholesky<T>
where
    T: Scalar,
{
    /// Factorizes `a` with a default shift increment of 1e-3.
    pub fn new(a: &DMatrix<T>) -> Result<Self> {
        Self::with_shift_increment(a, <T as Scalar>::from_f64(1e-3))
    }

    /// Factorizes `a`, retrying with a growing diagonal shift on breakdown.
    ///
    /// When the smallest diagonal entry of `a` is not positive the first
    /// attempt already uses `increment − min(diag(a))`. Every breakdown doubles
    /// the shift (starting from `increment`).
    pub fn with_shift_increment(a: &DMatrix<T>, increment: T) -> Result<Self> {
        if !a.is_square() {
            return Err(OptimizerError::dimension_mismatch(
                format!("{0}x{0} matrix", a.nrows()),
                format!("{}x{} matrix", a.nrows(), a.ncols()),
            ));
        }
        if !(increment > T::zero()) {
            return Err(OptimizerError::invalid_configuration(
                "shift increment must be positive",
                "increment",
                increment.to_string(),
            ));
        }

        let min_diagonal = a.diagonal().iter().copied().fold(<T as Float>::infinity(), <T as Float>::min);
        let mut shift = if a.nrows() == 0 || min_diagonal > T::zero() {
            T::zero()
        } else {
            increment - min_diagonal
        };

        for attempt in 0..MAX_SHIFT_ATTEMPTS {
            if let Some(factor) = factorize(a, shift) {
                if attempt > 0 {
                    tracing::debug!(
                        shift = Scalar::to_f64(shift),
                        attempts = attempt + 1,
                        "incomplete Cholesky needed a diagonal shift"
                    );
                }
                return Ok(Self { factor, shift });
            }
            shift = Float::max(shift + shift, increment);
        }

        Err(OptimizerError::numerical_error(format!(
            "incomplete Cholesky broke down after {MAX_SHIFT_ATTEMPTS} diagonal shifts"
        )))
    }

    /// The lower-triangular factor.
    pub fn factor(&self) -> &DMatrix<T> {
        &self.factor
    }

    /// Diagonal shift that was added to make the factorization succeed.
    pub fn shift(&self) -> T {
        self.shift
    }

    /// Solves `L·Lᵀ·y = rhs` by forward then backward substitution.
    pub fn solve(&self, rhs: &DVector<T>) -> Result<DVector<T>> {
        check_len(rhs, self.factor.nrows())?;
        let forward = self
            .factor
            .solve_lower_triangular(rhs)
            .ok_or_else(|| OptimizerError::numerical_error("singular incomplete Cholesky factor"))?;
        self.factor
            .tr_solve_lower_triangular(&forward)
            .ok_or_else(|| OptimizerError::numerical_error("singular incomplete Cholesky factor"))
    }
}

impl<T> Preconditioner<T> for IncompleteCholesky<T>
where
    T: Scalar,
{
    fn apply(&self, residual: &DVector<T>) -> Result<DVector<T>> {
        self.solve(residual)
    }

    fn name(&self) -> &str {
        "Incomplete Cholesky"
    }
}

/// One IC(0) attempt on `a + shift·I`; `None` on a non-positive pivot.
fn factorize<T: Scalar>(a: &DMatrix<T>, shift: T) -> Option<DMatrix<T>> {
    let n = a.nrows();
    let mut l = DMatrix::zeros(n, n);

    for k in 0..n {
        let mut pivot = a[(k, k)] + shift;
        for j in 0..k {
            pivot = pivot - l[(k, j)] * l[(k, j)];
        }
        if !(pivot > T::zero()) || !Float::is_finite(pivot) {
            return None;
        }
        let pivot = Float::sqrt(pivot);
        l[(k, k)] = pivot;

        for i in (k + 1)..n {
            if a[(i, k)] == T::zero() {
                continue;
            }
            let mut entry = a[(i, k)];
            for j in 0..k {
                entry = entry - l[(i, j)] * l[(k, j)];
            }
            l[(i, k)] = entry / pivot;
        }
    }

    Some(l)
}
