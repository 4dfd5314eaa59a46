//! Projections onto convex feasible sets.
//!
//! A projection P maps any point to the closest feasible point. Every
//! implementation must be idempotent (`P(P(x)) = P(x)`) and non-expansive.
//! Projected methods additionally ask for the *active index set*: the
//! coordinates pinned by the constraints at a point, which they exclude from
//! second-order information.

use crate::core::{
    error::{OptimizerError, Result},
    types::{check_len, DVector, Scalar},
};
use num_traits::Float;
use std::fmt::Debug;

/// Trait for projections onto a closed convex set.
pub trait Projection<T>: Debug
where
    T: Scalar,
{
    /// Projects `x` onto the feasible set.
    fn project(&self, x: &DVector<T>) -> Result<DVector<T>>;

    /// Indices of the coordinates that are active at `x`.
    ///
    /// # Default Implementation
    ///
    /// No coordinate is ever active.
    fn active_index_set(&self, _x: &DVector<T>) -> Result<Vec<usize>> {
        Ok(Vec::new())
    }

    /// Returns true when `x` is feasible.
    fn contains(&self, x: &DVector<T>) -> Result<bool> {
        Ok(self.project(x)? == *x)
    }
}

impl<T, P> Projection<T> for &P
where
    T: Scalar,
    P: Projection<T> + ?Sized,
{
    fn project(&self, x: &DVector<T>) -> Result<DVector<T>> {
        (**self).project(x)
    }

    fn active_index_set(&self, x: &DVector<T>) -> Result<Vec<usize>> {
        (**self).active_index_set(x)
    }
}

/// Projection onto the box `{x : lower ≤ x ≤ upper}`.
#[derive(Debug, Clone)]
pub struct BoxProjection<T>
where
    T: Scalar,
{
    lower: DVector<T>,
    upper: DVector<T>,
    active_tolerance: T,
}

impl<T> BoxProjection<T>
where
    T: Scalar,
{
    /// Creates a box projection.
    ///
    /// # Errors
    ///
    /// Fails if the bounds have different lengths or `lower[i] > upper[i]`
    /// for some `i`.
    pub fn new(lower: DVector<T>, upper: DVector<T>) -> Result<Self> {
        check_len(&upper, lower.len())?;
        if let Some(i) = (0..lower.len()).find(|&i| lower[i] > upper[i]) {
            return Err(OptimizerError::invalid_configuration(
                "lower bound exceeds upper bound",
                format!("lower[{i}]"),
                lower[i].to_string(),
            ));
        }

        Ok(Self {
            lower,
            upper,
            active_tolerance: T::ACTIVE_SET_TOLERANCE,
        })
    }

    /// Lower bounds.
    pub fn lower(&self) -> &DVector<T> {
        &self.lower
    }

    /// Upper bounds.
    pub fn upper(&self) -> &DVector<T> {
        &self.upper
    }
}

impl<T> Projection<T> for BoxProjection<T>
where
    T: Scalar,
{
    fn project(&self, x: &DVector<T>) -> Result<DVector<T>> {
        check_len(x, self.lower.len())?;
        Ok(DVector::from_fn(x.len(), |i, _| {
            Float::min(Float::max(x[i], self.lower[i]), self.upper[i])
        }))
    }

    fn active_index_set(&self, x: &DVector<T>) -> Result<Vec<usize>> {
        check_len(x, self.lower.len())?;
        Ok((0..x.len())
            .filter(|&i| {
                x[i] - self.lower[i] <= self.active_tolerance
                    || self.upper[i] - x[i] <= self.active_tolerance
            })
            .collect())
    }
}

/// Projection onto the ball `{x : ‖x − origin‖ ≤ radius}`.
#[derive(Debug, Clone)]
pub struct BallProjection<T>
where
    T: Scalar,
{
    origin: DVector<T>,
    radius: T,
}

impl<T> BallProjection<T>
where
    T: Scalar,
{
    /// Creates a ball projection.
    ///
    /// # Errors
    ///
    /// Fails if the radius is not strictly positive.
    pub fn new(origin: DVector<T>, radius: T) -> Result<Self> {
        if !(radius > T::zero()) {
            return Err(OptimizerError::invalid_configuration(
                "radius must be positive",
                "radius",
                radius.to_string(),
            ));
        }
        Ok(Self { origin, radius })
    }

    /// Center of the ball.
    pub fn origin(&self) -> &DVector<T> {
        &self.origin
    }

    /// Radius of the ball.
    pub fn radius(&self) -> T {
        self.radius
    }
}

impl<T> Projection<T> for BallProjection<T>
where
    T: Scalar,
{
    fn project(&self, x: &DVector<T>) -> Result<DVector<T>> {
        check_len(x, self.origin.len())?;
        let offset = x - &self.origin;
        let distance = offset.norm();

        if distance <= self.radius {
            Ok(x.clone())
        } else {
            Ok(&self.origin + offset * (self.radius / distance))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_box_projection() {
        let lower = DVector::from_vec(vec![-2.0, 1.0]);
        let upper = DVector::from_vec(vec![2.0, 2.0]);
        let b = BoxProjection::new(lower, upper).unwrap();

        let p = b.project(&DVector::from_vec(vec![3.0, 0.0])).unwrap();
        assert_relative_eq!(p, DVector::from_vec(vec![2.0, 1.0]));
        assert_eq!(
            b.active_index_set(&DVector::from_vec(vec![0.0, 1.0])).unwrap(),
            vec![1]
        );
    }

    #[test]
    fn test_box_rejects_crossed_bounds() {
        let lower = DVector::from_vec(vec![0.0, 3.0]);
        let upper = DVector::from_vec(vec![1.0, 2.0]);
        assert!(matches!(
            BoxProjection::new(lower, upper),
            Err(OptimizerError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_ball_projection() {
        let ball = BallProjection::new(DVector::from_vec(vec![1.0, 1.0]), 2.0).unwrap();

        let outside = ball.project(&DVector::from_vec(vec![4.0, 4.0])).unwrap();
        let expected = 1.0 + 2.0 / 2.0_f64.sqrt();
        assert_relative_eq!(outside, DVector::from_vec(vec![expected, expected]), epsilon = 1e-12);

        let inside = DVector::from_vec(vec![2.2, 2.2]);
        assert_relative_eq!(ball.project(&inside).unwrap(), inside);
        assert!(ball.active_index_set(&inside).unwrap().is_empty());
    }

    #[test]
    fn test_ball_rejects_non_positive_radius() {
        assert!(BallProjection::new(DVector::<f64>::zeros(2), 0.0).is_err());
        assert!(BallProjection::new(DVector::<f64>::zeros(2), -1.0).is_err());
    }
}
