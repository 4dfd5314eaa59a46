//! Two-dimensional valley objective.

use crate::core::{
    error::Result,
    objective::{Objective, ParametricModel},
    types::{check_len, DMatrix, DVector, Scalar},
};
use num_traits::Float;

/// f(x) = cosh(x₁) + p₁·(x₂ − 1)² + p₂.
///
/// For p₁ > 0 the unique minimizer is (0, 1). As a [`ParametricModel`] the
/// parameters enter linearly, with ∂f/∂p = ((x₂ − 1)², 1).
#[derive(Debug, Clone)]
pub struct SimpleValleyObjective<T>
where
    T: Scalar,
{
    parameters: DVector<T>,
}

impl<T> SimpleValleyObjective<T>
where
    T: Scalar,
{
    /// Creates the objective with parameters `p = (p₁, p₂)`.
    pub fn new(parameters: DVector<T>) -> Result<Self> {
        check_len(&parameters, 2)?;
        Ok(Self { parameters })
    }

    /// The current parameters.
    pub fn parameters(&self) -> &DVector<T> {
        &self.parameters
    }

    fn evaluate(x: &DVector<T>, p: &DVector<T>) -> Result<T> {
        check_len(x, 2)?;
        check_len(p, 2)?;
        let offset = x[1] - T::one();
        Ok(Float::cosh(x[0]) + p[0] * offset * offset + p[1])
    }
}

impl<T> Default for SimpleValleyObjective<T>
where
    T: Scalar,
{
    fn default() -> Self {
        Self {
            parameters: DVector::from_element(2, T::one()),
        }
    }
}

impl<T> Objective<T> for SimpleValleyObjective<T>
where
    T: Scalar,
{
    fn objective(&self, x: &DVector<T>) -> Result<T> {
        Self::evaluate(x, &self.parameters)
    }

    fn gradient(&self, x: &DVector<T>) -> Result<DVector<T>> {
        check_len(x, 2)?;
        let two = <T as Scalar>::from_f64(2.0);
        Ok(DVector::from_vec(vec![
            Float::sinh(x[0]),
            two * self.parameters[0] * (x[1] - T::one()),
        ]))
    }

    fn hessian(&self, x: &DVector<T>) -> Result<DMatrix<T>> {
        check_len(x, 2)?;
        let two = <T as Scalar>::from_f64(2.0);
        Ok(DMatrix::from_diagonal(&DVector::from_vec(vec![
            Float::cosh(x[0]),
            two * self.parameters[0],
        ])))
    }
}

impl<T> ParametricModel<T> for SimpleValleyObjective<T>
where
    T: Scalar,
{
    fn parameter_count(&self) -> usize {
        2
    }

    fn model_value(&self, x: &DVector<T>, p: &DVector<T>) -> Result<T> {
        Self::evaluate(x, p)
    }

    fn parameter_gradient(&self, x: &DVector<T>, p: &DVector<T>) -> Result<DVector<T>> {
        check_len(x, 2)?;
        check_len(p, 2)?;
        let offset = x[1] - T::one();
        Ok(DVector::from_vec(vec![offset * offset, T::one()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_valley_derivatives() {
        let f = SimpleValleyObjective::new(DVector::from_vec(vec![2.0, 3.0])).unwrap();
        let x = DVector::from_vec(vec![0.5, 2.0]);

        assert_relative_eq!(f.objective(&x).unwrap(), 0.5_f64.cosh() + 5.0);
        assert_relative_eq!(f.gradient(&x).unwrap(), f.gradient_fd(&x).unwrap(), epsilon = 1e-6);

        let h = f.hessian(&x).unwrap();
        assert_relative_eq!(h[(0, 0)], 0.5_f64.cosh());
        assert_relative_eq!(h[(1, 1)], 4.0);
        assert_relative_eq!(h[(0, 1)], 0.0);
    }

    #[test]
    fn test_valley_parameter_gradient() {
        let f = SimpleValleyObjective::<f64>::default();
        let x = DVector::from_vec(vec![1.0, 3.0]);
        let p = DVector::from_vec(vec![2.0, 3.0]);
        assert_relative_eq!(
            f.parameter_gradient(&x, &p).unwrap(),
            DVector::from_vec(vec![4.0, 1.0])
        );
        assert!(SimpleValleyObjective::new(DVector::from_vec(vec![1.0])).is_err());
    }
}
