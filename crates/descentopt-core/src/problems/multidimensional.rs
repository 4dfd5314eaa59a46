//! Eight-dimensional nonlinear objective and its noisy variant.

use crate::core::{
    error::Result,
    objective::{Objective, ParametricModel},
    types::{check_len, DMatrix, DVector, Scalar},
};
use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};

const DIMENSION: usize = 8;

/// Banded SPD matrix with diagonal 10 and off-diagonals 3 and 1.
fn banded_matrix<T: Scalar>() -> DMatrix<T> {
    DMatrix::from_fn(DIMENSION, DIMENSION, |i, j| match i.abs_diff(j) {
        0 => <T as Scalar>::from_f64(10.0),
        1 => <T as Scalar>::from_f64(3.0),
        2 => T::one(),
        _ => T::zero(),
    })
}

/// f(x) = ½xᵀAx − bᵀx + p/τ(x) with τ(x) = ½xᵀAx + 1.
///
/// `A` is the 8×8 banded matrix with diagonal 10 and off-diagonals 3 and 1,
/// and b = (10, 3, 1, 0, …, 0). The objective is coercive but not convex;
/// for p = 1 it has a local minimizer near (1.02614, 0, …, 0).
#[derive(Debug, Clone)]
pub struct MultidimensionalObjective<T>
where
    T: Scalar,
{
    a: DMatrix<T>,
    b: DVector<T>,
    p: T,
}

impl<T> MultidimensionalObjective<T>
where
    T: Scalar,
{
    /// Creates the objective with parameter `p`.
    pub fn new(p: T) -> Self {
        let mut b = DVector::zeros(DIMENSION);
        b[0] = <T as Scalar>::from_f64(10.0);
        b[1] = <T as Scalar>::from_f64(3.0);
        b[2] = T::one();
        Self {
            a: banded_matrix(),
            b,
            p,
        }
    }

    /// Dimension of the domain.
    pub fn dimension(&self) -> usize {
        DIMENSION
    }

    /// Approximate local minimizer for p = 1.
    pub fn local_minimizer() -> DVector<T> {
        let mut x = DVector::zeros(DIMENSION);
        x[0] = <T as Scalar>::from_f64(1.02614);
        x
    }

    /// Returns `(A·x, τ(x))`.
    fn quadratic_part(&self, x: &DVector<T>) -> Result<(DVector<T>, T)> {
        check_len(x, DIMENSION)?;
        let ax = &self.a * x;
        let tau = <T as Scalar>::from_f64(0.5) * x.dot(&ax) + T::one();
        Ok((ax, tau))
    }

    fn value_with(&self, x: &DVector<T>, p: T) -> Result<T> {
        let (_, tau) = self.quadratic_part(x)?;
        Ok(tau - T::one() - self.b.dot(x) + p / tau)
    }
}

impl<T> Default for MultidimensionalObjective<T>
where
    T: Scalar,
{
    fn default() -> Self {
        Self::new(T::one())
    }
}

impl<T> Objective<T> for MultidimensionalObjective<T>
where
    T: Scalar,
{
    fn objective(&self, x: &DVector<T>) -> Result<T> {
        self.value_with(x, self.p)
    }

    fn gradient(&self, x: &DVector<T>) -> Result<DVector<T>> {
        let (ax, tau) = self.quadratic_part(x)?;
        let scale = T::one() - self.p / (tau * tau);
        Ok(ax * scale - &self.b)
    }

    fn hessian(&self, x: &DVector<T>) -> Result<DMatrix<T>> {
        let (ax, tau) = self.quadratic_part(x)?;
        let two = <T as Scalar>::from_f64(2.0);
        let scale = T::one() - self.p / (tau * tau);
        let rank_one = two * self.p / (tau * tau * tau);
        Ok(&self.a * scale + (&ax * ax.transpose()) * rank_one)
    }
}

impl<T> ParametricModel<T> for MultidimensionalObjective<T>
where
    T: Scalar,
{
    fn parameter_count(&self) -> usize {
        1
    }

    fn model_value(&self, x: &DVector<T>, p: &DVector<T>) -> Result<T> {
        check_len(p, 1)?;
        self.value_with(x, p[0])
    }

    fn parameter_gradient(&self, x: &DVector<T>, p: &DVector<T>) -> Result<DVector<T>> {
        check_len(p, 1)?;
        let (_, tau) = self.quadratic_part(x)?;
        Ok(DVector::from_element(1, T::one() / tau))
    }
}

/// [`MultidimensionalObjective`] plus noise `0.001·sin(2π·U)` with U uniform
/// on [0, 1), drawn fresh on every evaluation.
///
/// Only objective values are provided; gradients fall back to finite
/// differences and are dominated by the noise.
#[derive(Debug)]
pub struct NoisyObjective<T>
where
    T: Scalar,
{
    base: MultidimensionalObjective<T>,
    amplitude: T,
    rng: Mutex<StdRng>,
}

impl<T> NoisyObjective<T>
where
    T: Scalar,
{
    /// Creates the objective with parameter `p` and an entropy-seeded source.
    pub fn new(p: T) -> Self {
        Self::from_rng(p, StdRng::from_entropy())
    }

    /// Creates the objective with a reproducible random source.
    pub fn with_seed(p: T, seed: u64) -> Self {
        Self::from_rng(p, StdRng::seed_from_u64(seed))
    }

    fn from_rng(p: T, rng: StdRng) -> Self {
        Self {
            base: MultidimensionalObjective::new(p),
            amplitude: <T as Scalar>::from_f64(1e-3),
            rng: Mutex::new(rng),
        }
    }

    /// Noise-free objective underneath.
    pub fn base(&self) -> &MultidimensionalObjective<T> {
        &self.base
    }

    fn noise(&self) -> T {
        let u: f64 = self.rng.lock().gen();
        self.amplitude * <T as Scalar>::from_f64((std::f64::consts::TAU * u).sin())
    }
}

impl<T> Objective<T> for NoisyObjective<T>
where
    T: Scalar,
{
    fn objective(&self, x: &DVector<T>) -> Result<T> {
        Ok(self.base.objective(x)? + self.noise())
    }
}
