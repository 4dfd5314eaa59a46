//! Type definitions and aliases for descent optimization.
//!
//! This module provides the scalar trait shared by every routine, the dense
//! vector and matrix aliases, and numerical constants.

use nalgebra::{Dyn, OMatrix, OVector, RealField, Scalar as NalgebraScalar};
use num_traits::{Float, FromPrimitive};
use std::fmt::{Debug, Display};

/// Trait for scalar types used in optimization (f32 or f64).
///
/// This trait combines all the numeric traits required by the solvers:
/// nalgebra's `RealField` for linear algebra and `num_traits::Float` for
/// elementary functions.
pub trait Scalar:
    NalgebraScalar
    + RealField
    + Float
    + FromPrimitive
    + Display
    + Debug
    + Default
    + Copy
    + Send
    + Sync
    + 'static
{
    /// Machine epsilon for this scalar type.
    const EPSILON: Self;

    /// Default tolerance for linear solves.
    const DEFAULT_TOLERANCE: Self;

    /// Default tolerance for the outer stopping functional of descent methods.
    const DEFAULT_GRADIENT_TOLERANCE: Self;

    /// Tolerance used to decide whether an index is active for a projection.
    const ACTIVE_SET_TOLERANCE: Self;

    /// Convert from f64 (for constants).
    ///
    /// # Panics
    ///
    /// Panics if the conversion fails.
    fn from_f64(v: f64) -> Self {
        <Self as FromPrimitive>::from_f64(v).expect("Failed to convert from f64")
    }

    /// Convert to f64 (for logging and error reporting).
    ///
    /// # Panics
    ///
    /// Panics if the conversion fails.
    fn to_f64(self) -> f64 {
        num_traits::cast(self).expect("Failed to convert to f64")
    }
}

impl Scalar for f32 {
    const EPSILON: Self = f32::EPSILON;
    const DEFAULT_TOLERANCE: Self = 1e-4;
    const DEFAULT_GRADIENT_TOLERANCE: Self = 1e-3;
    const ACTIVE_SET_TOLERANCE: Self = 1e-5;
}

impl Scalar for f64 {
    const EPSILON: Self = f64::EPSILON;
    const DEFAULT_TOLERANCE: Self = 1e-6;
    const DEFAULT_GRADIENT_TOLERANCE: Self = 1e-3;
    const ACTIVE_SET_TOLERANCE: Self = 1e-6;
}

/// Type alias for a dynamically-sized matrix.
pub type DMatrix<T> = OMatrix<T, Dyn, Dyn>;

/// Type alias for a dynamically-sized vector.
pub type DVector<T> = OVector<T, Dyn>;

/// Numerical constants for different precision levels.
pub mod constants {
    use super::Scalar;

    /// Square root of machine epsilon, the usual finite-difference step.
    pub fn sqrt_epsilon<T: Scalar>() -> T {
        <T as num_traits::Float>::sqrt(T::EPSILON)
    }
}

/// Checks that a vector has the expected length.
pub fn check_len<T: Scalar>(
    v: &DVector<T>,
    expected: usize,
) -> crate::core::error::Result<()> {
    if v.len() == expected {
        Ok(())
    } else {
        Err(crate::core::error::OptimizerError::dimension_mismatch(
            expected,
            v.len(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(<f64 as Scalar>::from_f64(0.5), 0.5);
        assert_eq!(<f32 as Scalar>::from_f64(3.0), 3.0_f32);
        assert_eq!(Scalar::to_f64(2.5_f32), 2.5);
        assert!(constants::sqrt_epsilon::<f64>() < 1e-7);
    }
}
