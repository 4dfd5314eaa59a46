//! Test problems: analytic objectives, a noisy objective and a least-squares
//! model built on top of them.

pub mod least_squares;
pub mod multidimensional;
pub mod valley;

pub use least_squares::LeastSquaresModel;
pub use multidimensional::{MultidimensionalObjective, NoisyObjective};
pub use valley::SimpleValleyObjective;
