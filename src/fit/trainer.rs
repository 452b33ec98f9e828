//! Trainer contract.
//!
//! Selectors never know what kind of sequence model they are choosing an order
//! for. They only need to fit one at a given hidden-state count and ask it for
//! a log-likelihood. `models::GaussianHmmTrainer` is the stock implementation.

use crate::domain::SequenceSet;
use crate::error::{FitFailure, ScoreFailure};

/// A fitted sequence model that can score observations.
pub trait SequenceModel {
    fn n_components(&self) -> usize;

    /// Feature dimensionality the model was fitted on.
    fn n_features(&self) -> usize;

    /// Total log-likelihood of every sequence in `observations`.
    fn score(&self, observations: &SequenceSet) -> Result<f64, ScoreFailure>;
}

/// Fits a model with a requested number of hidden states.
///
/// Implementations must be deterministic for a given `seed`. Failing to
/// converge is not a failure; only numerically impossible fits are.
pub trait Trainer {
    type Model: SequenceModel;

    fn fit(
        &self,
        observations: &SequenceSet,
        n_components: usize,
        seed: u64,
    ) -> Result<Self::Model, FitFailure>;
}
