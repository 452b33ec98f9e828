//! Data sources.
//!
//! - seeded synthetic corpora drawn from per-label Gaussian HMMs (`sample`)

pub mod sample;

pub use sample::*;
