//! hmm-bw math utilities.

pub mod math;

pub use math::matrix::{is_probability_vector, Matrix, MatrixError};
pub use math::stable::*;
