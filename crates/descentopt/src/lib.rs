//! # descentopt
//!
//! Descent methods for unconstrained, box- and ball-constrained optimization
//! over dense real vectors.
//!
//! This crate re-exports [`descentopt_core`] (objectives, projections, line
//! searches, the PCG solver and the simplex gradient) and
//! [`descentopt_optim`] (Newton, BFGS, Levenberg-Marquardt, projected
//! Newton-CG, implicit filtering and the augmented Lagrangian objective).
//!
//! ## Quick Start
//!
//! ```rust
//! use descentopt::prelude::*;
//!
//! // Minimize cosh(x₁) + (x₂ − 1)² + 1 over the box [1, 2]²
//! let f = SimpleValleyObjective::<f64>::default();
//! let unit_box = BoxProjection::new(
//!     DVector::from_vec(vec![1.0, 1.0]),
//!     DVector::from_vec(vec![2.0, 2.0]),
//! )?;
//!
//! let optimizer = ProjectedNewtonCG::new(ProjectedNewtonCGConfig::new());
//! let result = optimizer.minimize(&f, &unit_box, &DVector::from_vec(vec![2.0, 2.0]))?;
//!
//! assert!((result.point - DVector::from_vec(vec![1.0, 1.0])).norm() < 1e-6);
//! # Ok::<(), OptimizerError>(())
//! ```
//!
//! ## Logging
//!
//! Routines emit `tracing` events; call [`init_logger`] in binaries to
//! print them.

pub mod logger;

pub use logger::{init_logger, init_logger_with_level};

// Re-export core functionality
pub use descentopt_core::{
    core, numerical, optimization, problems, report, OptimizerError, Result,
};

// Re-export optimizers
pub use descentopt_optim::{
    augmented_lagrangian, bfgs, implicit_filtering, levenberg_marquardt, newton,
    projected_newton_cg, AugmentedLagrangianObjective, BFGSConfig, BFGSResult, ImplicitFiltering,
    ImplicitFilteringConfig, LevenbergMarquardt, LevenbergMarquardtConfig,
    LevenbergMarquardtResult, Newton, NewtonConfig, ProjectedNewtonCG, ProjectedNewtonCGConfig,
    ScaleTermination, BFGS,
};

// Re-export nalgebra for convenience
pub use nalgebra;

/// Prelude module for convenient imports
pub mod prelude {
    pub use descentopt_core::prelude::*;

    pub use descentopt_optim::{
        inverse_hessian_update, reduced_hessian_action, AugmentedLagrangianObjective, BFGSConfig,
        BFGSResult, ImplicitFiltering, ImplicitFilteringConfig, LevenbergMarquardt,
        LevenbergMarquardtConfig, LevenbergMarquardtResult, Newton, NewtonConfig,
        ProjectedNewtonCG, ProjectedNewtonCGConfig, ScaleTermination, BFGS,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_prelude_covers_every_routine() {
        let names = [
            Newton::<f64>::default().name().to_string(),
            BFGS::<f64>::default().name().to_string(),
            LevenbergMarquardt::<f64>::default().name().to_string(),
            ProjectedNewtonCG::<f64>::default().name().to_string(),
            ImplicitFiltering::<f64>::default().name().to_string(),
            WolfePowellSearch::new().name().to_string(),
            ProjectedBacktrackingSearch::new().name().to_string(),
        ];
        assert_eq!(names.len(), 7);
        assert_eq!(names[1], "BFGS");
    }
}
