//! Mathematical utilities: diagonal Gaussian densities and small vector helpers.

pub mod stats;

pub use stats::*;
