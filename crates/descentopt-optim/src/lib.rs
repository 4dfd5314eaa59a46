//! descentopt Optimization - descent algorithms built on `descentopt-core`.
//!
//! This crate provides the outer optimization loops. Each routine validates
//! its configuration, runs until its stopping functional drops below the
//! tolerance, and reports an error when an iteration cap is hit.
//!
//! # Available Optimizers
//!
//! - **Newton**: full Newton steps with a PCG inner solve
//! - **BFGS**: inverse-Hessian quasi-Newton with Wolfe-Powell steps
//! - **Levenberg-Marquardt**: damped Gauss-Newton for least squares
//! - **Projected Newton-CG**: truncated CG on the reduced Hessian with
//!   projected backtracking
//! - **Implicit Filtering**: simplex-gradient descent for noisy objectives
//!
//! The [`AugmentedLagrangianObjective`] turns an equality-constrained problem
//! into an objective any of the unconstrained routines accepts.
//!
//! # Examples
//!
//! ```rust
//! use descentopt_core::prelude::*;
//! use descentopt_optim::{BFGSConfig, BFGS};
//!
//! let f = SimpleValleyObjective::<f64>::default();
//! let optimizer = BFGS::new(BFGSConfig::new().with_tolerance(1e-6));
//!
//! let result = optimizer.minimize(&f, &DVector::from_vec(vec![1.0, 2.0]))?;
//! assert!(result.gradient_norm <= 1e-6);
//! # Ok::<(), OptimizerError>(())
//! ```

pub mod augmented_lagrangian;
pub mod bfgs;
pub mod implicit_filtering;
pub mod levenberg_marquardt;
pub mod newton;
pub mod projected_newton_cg;

// Re-export main optimizers for convenience
pub use augmented_lagrangian::AugmentedLagrangianObjective;
pub use bfgs::{inverse_hessian_update, BFGSConfig, BFGSResult, BFGS};
pub use implicit_filtering::{ImplicitFiltering, ImplicitFilteringConfig, ScaleTermination};
pub use levenberg_marquardt::{
    LevenbergMarquardt, LevenbergMarquardtConfig, LevenbergMarquardtResult,
};
pub use newton::{Newton, NewtonConfig};
pub use projected_newton_cg::{reduced_hessian_action, ProjectedNewtonCG, ProjectedNewtonCGConfig};

#[cfg(test)]
mod tests {
    use super::*;
    use descentopt_core::optimization::Optimizer;

    #[test]
    fn test_exports() {
        assert_eq!(Newton::<f64>::default().name(), "Newton");
        assert_eq!(BFGS::<f64>::default().name(), "BFGS");
        assert_eq!(LevenbergMarquardt::<f64>::default().name(), "Levenberg-Marquardt");
        assert_eq!(ProjectedNewtonCG::<f64>::default().name(), "Projected Newton-CG");
        assert_eq!(ImplicitFiltering::<f64>::default().name(), "Implicit Filtering");
    }
}
