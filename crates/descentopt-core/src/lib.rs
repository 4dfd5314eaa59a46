//! Core traits and building blocks for descent optimization.
//!
//! This crate provides the abstractions the descent routines in
//! `descentopt-optim` are written against, together with the inner solvers
//! and line searches they call.
//!
//! # Key Concepts
//!
//! - **Objectives**: scalar functions with gradient and optional Hessian
//! - **Projections**: maps onto closed convex feasible sets
//! - **Residual models**: residual vector and Jacobian of a least-squares fit
//! - **Line searches**: Wolfe-Powell and projected backtracking
//!
//! # Modules
//!
//! - [`core`]: error taxonomy, scalar types, objective and projection traits
//! - [`numerical`]: incomplete Cholesky, PCG solver, simplex gradient
//! - [`optimization`]: line searches, optimizer trait and result type
//! - [`problems`]: test objectives and the least-squares model
//! - [`logging`]: the [`report!`] progress macro

pub mod core;
pub mod logging;
pub mod numerical;
pub mod optimization;
pub mod problems;

// Re-exported for the `report!` macro.
pub use tracing;

// Re-export commonly used items at the crate root
pub use crate::core::error::{OptimizerError, Result};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use descentopt_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::error::{OptimizerError, Result};
    pub use crate::core::objective::{
        directional_derivative, Objective, ParametricModel, QuadraticObjective, ResidualModel,
    };
    pub use crate::core::projection::{BallProjection, BoxProjection, Projection};
    pub use crate::core::types::{constants, DMatrix, DVector, Scalar};
    pub use crate::numerical::{
        pcg_solve, simplex_gradient, stencil_failure, IdentityPreconditioner,
        IncompleteCholesky, PCGConfig, PCGResult, PCGSolver, Preconditioner,
    };
    pub use crate::optimization::{
        LineSearchParams, LineSearchResult, OptimizationResult, Optimizer,
        ProjectedBacktrackingSearch, WolfePowellSearch,
    };
    pub use crate::problems::{
        LeastSquaresModel, MultidimensionalObjective, NoisyObjective, SimpleValleyObjective,
    };
}
