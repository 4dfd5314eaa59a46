//! Core traits and types for descent optimization.

pub mod error;
pub mod objective;
pub mod projection;
pub mod types;

// Re-export core types
pub use error::*;
pub use objective::*;
pub use projection::*;
pub use types::*;
