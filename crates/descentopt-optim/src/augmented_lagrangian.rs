//! Augmented Lagrangian objective for one equality constraint.
//!
//! For an objective f, a constraint h(x) = 0, a multiplier estimate α and a
//! penalty γ > 0 this module provides
//!
//! L(x) = f(x) + α·h(x) + ½·γ·h(x)²
//!
//! as an [`Objective`], so that any unconstrained routine can minimize it.

use descentopt_core::core::{
    error::{OptimizerError, Result},
    objective::Objective,
    types::{DMatrix, DVector, Scalar},
};

/// Augmented Lagrangian of `f` with respect to the constraint `h`.
#[derive(Debug, Clone)]
pub struct AugmentedLagrangianObjective<T, F, H>
where
    T: Scalar,
    F: Objective<T>,
    H: Objective<T>,
{
    objective: F,
    constraint: H,
    multiplier: T,
    penalty: T,
}

impl<T, F, H> AugmentedLagrangianObjective<T, F, H>
where
    T: Scalar,
    F: Objective<T>,
    H: Objective<T>,
{
    /// Creates the augmented Lagrangian with multiplier α and penalty γ.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if γ ≤ 0.
    pub fn new(objective: F, constraint: H, multiplier: T, penalty: T) -> Result<Self> {
        if penalty <= T::zero() {
            return Err(OptimizerError::invalid_configuration(
                "penalty must be positive",
                "gamma",
                penalty.to_string(),
            ));
        }
        Ok(Self {
            objective,
            constraint,
            multiplier,
            penalty,
        })
    }

    /// The multiplier estimate α.
    pub fn multiplier(&self) -> T {
        self.multiplier
    }

    /// The penalty γ.
    pub fn penalty(&self) -> T {
        self.penalty
    }

    /// Returns a copy with a new multiplier estimate.
    pub fn with_multiplier(mut self, multiplier: T) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Evaluates the constraint h(x).
    pub fn constraint_value(&self, x: &DVector<T>) -> Result<T> {
        self.constraint.objective(x)
    }

    /// First-order multiplier update α + γ·h(x).
    pub fn updated_multiplier(&self, x: &DVector<T>) -> Result<T> {
        Ok(self.multiplier + self.penalty * self.constraint.objective(x)?)
    }
}

impl<T, F, H> Objective<T> for AugmentedLagrangianObjective<T, F, H>
where
    T: Scalar,
    F: Objective<T>,
    H: Objective<T>,
{
    fn objective(&self, x: &DVector<T>) -> Result<T> {
        let h = self.constraint.objective(x)?;
        let half = <T as Scalar>::from_f64(0.5);
        Ok(self.objective.objective(x)? + self.multiplier * h + half * self.penalty * h * h)
    }

    fn gradient(&self, x: &DVector<T>) -> Result<DVector<T>> {
        let h = self.constraint.objective(x)?;
        let scale = self.multiplier + self.penalty * h;
        Ok(self.objective.gradient(x)? + self.constraint.gradient(x)? * scale)
    }

    fn hessian(&self, x: &DVector<T>) -> Result<DMatrix<T>> {
        let h = self.constraint.objective(x)?;
        let grad_h = self.constraint.gradient(x)?;
        let scale = self.multiplier + self.penalty * h;
        Ok(self.objective.hessian(x)?
            + self.constraint.hessian(x)? * scale
            + (&grad_h * grad_h.transpose()) * self.penalty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use descentopt_core::{core::objective::QuadraticObjective, problems::NoisyObjective};

    fn circle_problem() -> AugmentedLagrangianObjective<f64, QuadraticObjective<f64>, QuadraticObjective<f64>> {
        let two = DMatrix::from_diagonal_element(2, 2, 2.0);
        let f = QuadraticObjective::new(two.clone(), DVector::zeros(2), 1.0).unwrap();
        let h = QuadraticObjective::new(two, DVector::zeros(2), -1.0).unwrap();
        AugmentedLagrangianObjective::new(f, h, -1.0, 10.0).unwrap()
    }

    #[test]
    fn test_objective_and_gradient() {
        let al = circle_problem();
        let x = DVector::from_vec(vec![2.0, 2.0]);

        assert_relative_eq!(al.objective(&x).unwrap(), 247.0);
        assert_relative_eq!(al.gradient(&x).unwrap(), DVector::from_vec(vec![280.0, 280.0]));
        assert_relative_eq!(al.constraint_value(&x).unwrap(), 7.0);
        assert_relative_eq!(al.updated_multiplier(&x).unwrap(), 69.0);
    }

    #[test]
    fn test_hessian() {
        let al = circle_problem();
        let x = DVector::from_vec(vec![2.0, 2.0]);
        let expected = DMatrix::from_row_slice(2, 2, &[300.0, 160.0, 160.0, 300.0]);
        assert_relative_eq!(al.hessian(&x).unwrap(), expected);
    }

    #[test]
    fn test_gradient_matches_finite_differences() {
        let al = circle_problem().with_multiplier(0.5);
        let x = DVector::from_vec(vec![0.3, -0.7]);
        assert_relative_eq!(al.gradient(&x).unwrap(), al.gradient_fd(&x).unwrap(), epsilon = 1e-5);
    }

    #[test]
    fn test_rejects_non_positive_penalty() {
        let f = QuadraticObjective::<f64>::simple(2);
        let h = QuadraticObjective::<f64>::simple(2);
        let err = AugmentedLagrangianObjective::new(f, h, 0.0, 0.0).unwrap_err();
        assert!(matches!(err, OptimizerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_hessian_requires_both_parts() {
        let f = QuadraticObjective::<f64>::simple(8);
        let h = NoisyObjective::with_seed(1.0, 1);
        let al = AugmentedLagrangianObjective::new(f, h, 1.0, 1.0).unwrap();
        let err = al.hessian(&DVector::zeros(8)).unwrap_err();
        assert!(matches!(err, OptimizerError::NotImplemented { .. }));
    }
}
