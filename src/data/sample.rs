//! Synthetic corpus generation.
//!
//! Every label gets its own random diagonal Gaussian HMM; its sequences are
//! drawn from that model. Generation is fully determined by `SampleSpec`, so a
//! corpus can be regenerated instead of stored.

use std::collections::BTreeMap;

use nalgebra::{DMatrix, DVector};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Uniform;

use crate::domain::{Corpus, Sequence};
use crate::error::AppError;
use crate::models::GaussianHmm;

/// Word labels used for the first generated labels.
const WORDS: [&str; 12] = [
    "BOOK", "CAR", "CHOCOLATE", "FISH", "GIVE", "GO", "JOHN", "LOVE", "MARY", "VEGETABLE", "WHO", "WRITE",
];

/// Probability mass kept on the diagonal of every generated transition matrix.
const SELF_TRANSITION: f64 = 0.7;

/// Half-width of the interval state means are drawn from.
const MEAN_SPREAD: f64 = 5.0;

/// Shape of a synthetic corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSpec {
    pub labels: usize,
    pub sequences_per_label: usize,
    pub frames_per_sequence: usize,
    pub n_features: usize,
    /// Hidden states of each generating model.
    pub n_states: usize,
    pub seed: u64,
}

impl Default for SampleSpec {
    fn default() -> Self {
        Self {
            labels: 4,
            sequences_per_label: 8,
            frames_per_sequence: 20,
            n_features: 4,
            n_states: 3,
            seed: 14,
        }
    }
}

/// Name of the `index`-th generated label.
pub fn label_name(index: usize) -> String {
    let word = WORDS[index % WORDS.len()];
    match index / WORDS.len() {
        0 => word.to_string(),
        round => format!("{word}{round}"),
    }
}

pub fn generate_corpus(spec: &SampleSpec) -> Result<Corpus, AppError> {
    if spec.labels == 0 || spec.sequences_per_label == 0 || spec.frames_per_sequence == 0 {
        return Err(AppError::new(2, "Sample corpus needs at least one label, sequence and frame."));
    }
    if spec.n_features == 0 || spec.n_states == 0 {
        return Err(AppError::new(2, "Sample models need at least one feature and one state."));
    }

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let mut sequences = BTreeMap::new();

    for index in 0..spec.labels {
        let model = random_model(&mut rng, spec.n_states, spec.n_features)?;
        let label_sequences = (0..spec.sequences_per_label)
            .map(|_| model.sample(spec.frames_per_sequence, &mut rng))
            .collect::<Result<Vec<Sequence>, _>>()
            .map_err(|e| AppError::new(4, format!("Failed to sample label {index}: {e}")))?;
        sequences.insert(label_name(index), label_sequences);
    }

    tracing::debug!(labels = spec.labels, seed = spec.seed, "generated synthetic corpus");
    Ok(Corpus::from_sequences(sequences)?)
}

fn random_model(rng: &mut StdRng, n_states: usize, n_features: usize) -> Result<GaussianHmm, AppError> {
    let means_dist = Uniform::new_inclusive(-MEAN_SPREAD, MEAN_SPREAD);
    let vars_dist = Uniform::new_inclusive(0.2, 1.0);
    let mass_dist = Uniform::new(0.1, 1.0);

    let startprob = DVector::from_fn(n_states, |_, _| mass_dist.sample(rng));
    let transmat = DMatrix::from_fn(n_states, n_states, |i, j| {
        if n_states == 1 {
            1.0
        } else if i == j {
            SELF_TRANSITION
        } else {
            (1.0 - SELF_TRANSITION) / (n_states - 1) as f64
        }
    });
    let means = DMatrix::from_fn(n_states, n_features, |_, _| means_dist.sample(rng));
    let vars = DMatrix::from_fn(n_states, n_features, |_, _| vars_dist.sample(rng));

    GaussianHmm::from_params(startprob, transmat, means, vars)
        .map_err(|e| AppError::new(4, format!("Invalid sample model: {e}")))
}
