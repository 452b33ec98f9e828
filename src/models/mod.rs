//! Sequence model implementations.
//!
//! The selectors only depend on `fit::Trainer`; this module provides the stock
//! trainer (diagonal-covariance Gaussian HMM fitted by Baum-Welch).

pub mod hmm;

pub use hmm::*;
