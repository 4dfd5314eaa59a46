//! Least-squares fit of a parametric model to measurements.

use crate::core::{
    error::{OptimizerError, Result},
    objective::{ParametricModel, ResidualModel},
    types::{check_len, DMatrix, DVector, Scalar},
};

/// Residuals `r_k(p) = m(x_k; p) − f_k` of a model against `N` measurements.
///
/// Measurement points are the columns of an `n×N` matrix; the Jacobian has
/// one row per measurement holding `∂m(x_k; p)/∂p`.
#[derive(Debug, Clone)]
pub struct LeastSquaresModel<T, M>
where
    T: Scalar,
    M: ParametricModel<T>,
{
    model: M,
    x_data: DMatrix<T>,
    f_data: DVector<T>,
}

impl<T, M> LeastSquaresModel<T, M>
where
    T: Scalar,
    M: ParametricModel<T>,
{
    /// Creates the model from measurement points (columns) and values.
    pub fn new(model: M, x_data: DMatrix<T>, f_data: DVector<T>) -> Result<Self> {
        if x_data.ncols() != f_data.len() {
            return Err(OptimizerError::dimension_mismatch(
                format!("{} measurement points", f_data.len()),
                format!("{} measurement points", x_data.ncols()),
            ));
        }
        Ok(Self {
            model,
            x_data,
            f_data,
        })
    }

    /// Number of measurements `N`.
    pub fn measurement_count(&self) -> usize {
        self.f_data.len()
    }

    /// The underlying parametric model.
    pub fn model(&self) -> &M {
        &self.model
    }

    fn point(&self, k: usize) -> DVector<T> {
        self.x_data.column(k).into_owned()
    }
}

impl<T, M> ResidualModel<T> for LeastSquaresModel<T, M>
where
    T: Scalar,
    M: ParametricModel<T>,
{
    fn residual(&self, p: &DVector<T>) -> Result<DVector<T>> {
        check_len(p, self.model.parameter_count())?;
        let mut residual = DVector::zeros(self.measurement_count());
        for k in 0..self.measurement_count() {
            residual[k] = self.model.model_value(&self.point(k), p)? - self.f_data[k];
        }
        Ok(residual)
    }

    fn jacobian(&self, p: &DVector<T>) -> Result<DMatrix<T>> {
        let m = self.model.parameter_count();
        check_len(p, m)?;
        let mut jacobian = DMatrix::zeros(self.measurement_count(), m);
        for k in 0..self.measurement_count() {
            let row = self.model.parameter_gradient(&self.point(k), p)?;
            check_len(&row, m)?;
            jacobian.set_row(k, &row.transpose());
        }
        Ok(jacobian)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problems::SimpleValleyObjective;
    use approx::assert_relative_eq;

    #[test]
    fn test_residual_and_jacobian() {
        let x_data = DMatrix::from_row_slice(2, 4, &[0.0, 0.0, 1.0, 2.0, 1.0, 2.0, 3.0, 4.0]);
        let f_data = DVector::from_vec(vec![2.0, 3.0, 2.54, 4.76]);
        let model =
            LeastSquaresModel::new(SimpleValleyObjective::default(), x_data, f_data).unwrap();
        let p = DVector::from_vec(vec![2.0, 3.0]);

        let r = model.residual(&p).unwrap();
        assert_relative_eq!(r, DVector::from_vec(vec![2.0, 3.0, 10.0, 20.0]), epsilon = 1e-2);

        let j = model.jacobian(&p).unwrap();
        let expected = DMatrix::from_row_slice(4, 2, &[0.0, 1.0, 1.0, 1.0, 4.0, 1.0, 9.0, 1.0]);
        assert_relative_eq!(j, expected);
    }

    #[test]
    fn test_rejects_inconsistent_data() {
        let x_data = DMatrix::<f64>::zeros(2, 3);
        let f_data = DVector::zeros(2);
        assert!(LeastSquaresModel::new(SimpleValleyObjective::default(), x_data, f_data).is_err());
    }
}
