//! Objective interfaces for descent algorithms.
//!
//! This module defines the capability traits the solvers consume:
//!
//! - [`Objective`]: scalar objective with gradient and optional Hessian.
//! - [`ParametricModel`]: a model `m(x; p)` whose parameters are fitted by
//!   least squares.
//! - [`ResidualModel`]: residual vector and Jacobian of a least-squares fit.
//!
//! # Design Philosophy
//!
//! Only `objective` is mandatory. The gradient defaults to central finite
//! differences and the Hessian-vector product defaults to the exact Hessian
//! when one is provided, otherwise to a forward difference of the gradient.
//! Derivative-free objectives (such as noisy measurements) therefore plug
//! into the same routines as analytic ones.

use crate::core::{
    error::{OptimizerError, Result},
    types::{check_len, constants, DMatrix, DVector, Scalar},
};
use num_traits::Float;
use std::fmt::Debug;

/// Trait for objectives f: ℝⁿ → ℝ.
///
/// The gradient returned by [`Objective::gradient`] must be the true gradient
/// of [`Objective::objective`]. Consistency is the implementor's
/// responsibility and is not verified by the solvers.
pub trait Objective<T>: Debug
where
    T: Scalar,
{
    /// Evaluates the objective at a point.
    fn objective(&self, x: &DVector<T>) -> Result<T>;

    /// Evaluates the gradient at a point.
    ///
    /// # Default Implementation
    ///
    /// Central finite differences with step √ε.
    fn gradient(&self, x: &DVector<T>) -> Result<DVector<T>> {
        self.gradient_fd(x)
    }

    /// Evaluates the Hessian matrix at a point.
    ///
    /// # Default Implementation
    ///
    /// Returns `NotImplemented`. Override for second-order methods.
    fn hessian(&self, _x: &DVector<T>) -> Result<DMatrix<T>> {
        Err(OptimizerError::not_implemented(
            "Hessian computation not implemented for this objective",
        ))
    }

    /// Computes the Hessian-vector product H(x)·v.
    ///
    /// # Default Implementation
    ///
    /// Uses the exact Hessian when [`Objective::hessian`] is implemented and
    /// falls back to a forward difference of the gradient otherwise.
    fn hessian_vector_product(&self, x: &DVector<T>, v: &DVector<T>) -> Result<DVector<T>> {
        check_len(v, x.len())?;
        match self.hessian(x) {
            Ok(hess) => Ok(hess * v),
            Err(OptimizerError::NotImplemented { .. }) => {
                let norm = v.norm();
                if norm < T::EPSILON {
                    return Ok(DVector::zeros(x.len()));
                }

                let t = constants::sqrt_epsilon::<T>() / norm;
                let perturbed = x + v * t;
                let grad1 = self.gradient(x)?;
                let grad2 = self.gradient(&perturbed)?;

                Ok((grad2 - grad1) / t)
            }
            Err(e) => Err(e),
        }
    }

    /// Computes the gradient using central finite differences.
    fn gradient_fd(&self, x: &DVector<T>) -> Result<DVector<T>> {
        let h = constants::sqrt_epsilon::<T>();
        let mut gradient = DVector::zeros(x.len());

        for i in 0..x.len() {
            let mut x_plus = x.clone();
            let mut x_minus = x.clone();
            x_plus[i] = x_plus[i] + h;
            x_minus[i] = x_minus[i] - h;

            gradient[i] = (self.objective(&x_plus)? - self.objective(&x_minus)?) / (h + h);
        }

        Ok(gradient)
    }
}

impl<T, O> Objective<T> for &O
where
    T: Scalar,
    O: Objective<T> + ?Sized,
{
    fn objective(&self, x: &DVector<T>) -> Result<T> {
        (**self).objective(x)
    }

    fn gradient(&self, x: &DVector<T>) -> Result<DVector<T>> {
        (**self).gradient(x)
    }

    fn hessian(&self, x: &DVector<T>) -> Result<DMatrix<T>> {
        (**self).hessian(x)
    }

    fn hessian_vector_product(&self, x: &DVector<T>, v: &DVector<T>) -> Result<DVector<T>> {
        (**self).hessian_vector_product(x, v)
    }
}

/// A model `m(x; p)` whose parameters `p` can be fitted to data.
///
/// The parameter vector is passed explicitly, so evaluation never mutates
/// the model.
pub trait ParametricModel<T>: Debug
where
    T: Scalar,
{
    /// Number of parameters `m`.
    fn parameter_count(&self) -> usize;

    /// Evaluates `m(x; p)`.
    fn model_value(&self, x: &DVector<T>, p: &DVector<T>) -> Result<T>;

    /// Evaluates ∂m(x; p)/∂p.
    fn parameter_gradient(&self, x: &DVector<T>, p: &DVector<T>) -> Result<DVector<T>>;
}

/// Residual vector and Jacobian of a nonlinear least-squares problem.
pub trait ResidualModel<T>: Debug
where
    T: Scalar,
{
    /// Residual vector r(p) ∈ ℝᴺ.
    fn residual(&self, p: &DVector<T>) -> Result<DVector<T>>;

    /// Jacobian J(p) ∈ ℝᴺˣᵐ with `J[k, j] = ∂r_k/∂p_j`.
    fn jacobian(&self, p: &DVector<T>) -> Result<DMatrix<T>>;
}

/// Quadratic objective f(x) = ½ xᵀAx + bᵀx + c.
#[derive(Debug, Clone)]
pub struct QuadraticObjective<T>
where
    T: Scalar,
{
    /// The quadratic form matrix (should be symmetric)
    pub a: DMatrix<T>,
    /// The linear term
    pub b: DVector<T>,
    /// The constant term
    pub c: T,
}

impl<T> QuadraticObjective<T>
where
    T: Scalar,
{
    /// Creates a new quadratic objective.
    pub fn new(a: DMatrix<T>, b: DVector<T>, c: T) -> Result<Self> {
        if !a.is_square() || a.nrows() != b.len() {
            return Err(OptimizerError::dimension_mismatch(
                format!("{0}x{0} matrix", b.len()),
                format!("{}x{} matrix", a.nrows(), a.ncols()),
            ));
        }
        Ok(Self { a, b, c })
    }

    /// Creates f(x) = ½‖x‖².
    pub fn simple(dim: usize) -> Self {
        Self {
            a: DMatrix::identity(dim, dim),
            b: DVector::zeros(dim),
            c: T::zero(),
        }
    }
}

impl<T> Objective<T> for QuadraticObjective<T>
where
    T: Scalar,
{
    fn objective(&self, x: &DVector<T>) -> Result<T> {
        check_len(x, self.b.len())?;
        let ax = &self.a * x;
        Ok(<T as Scalar>::from_f64(0.5) * x.dot(&ax) + self.b.dot(x) + self.c)
    }

    fn gradient(&self, x: &DVector<T>) -> Result<DVector<T>> {
        check_len(x, self.b.len())?;
        Ok(&self.a * x + &self.b)
    }

    fn hessian(&self, _x: &DVector<T>) -> Result<DMatrix<T>> {
        Ok(self.a.clone())
    }
}

/// Returns `gradient(x)ᵀd`, failing on non-finite values.
pub fn directional_derivative<T: Scalar>(gradient: &DVector<T>, direction: &DVector<T>) -> Result<T> {
    check_len(direction, gradient.len())?;
    let value = gradient.dot(direction);
    if Float::is_finite(value) {
        Ok(value)
    } else {
        Err(OptimizerError::numerical_error(
            "directional derivative is not finite",
        ))
    }
}
