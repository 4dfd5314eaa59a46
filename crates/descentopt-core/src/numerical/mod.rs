//! Linear solvers and derivative-free gradient estimates.

pub mod pcg;
pub mod preconditioner;
pub mod simplex_gradient;

// Re-export numerical utilities
pub use pcg::*;
pub use preconditioner::*;
pub use simplex_gradient::*;
