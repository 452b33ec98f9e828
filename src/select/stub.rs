//! Scripted trainer for selector tests.
//!
//! Fit outcome and scores are plain closures of `(n_components, data)`, so a
//! test can pin every log-likelihood a selector will see.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::{Corpus, Sequence, SequenceSet};
use crate::error::{FitFailure, ScoreFailure};
use crate::fit::{SequenceModel, Trainer};

type FitFn = dyn Fn(usize, &SequenceSet) -> Result<(), FitFailure> + Send + Sync;
type ScoreFn = dyn Fn(usize, &SequenceSet) -> Result<f64, ScoreFailure> + Send + Sync;

#[derive(Clone)]
pub(crate) struct StubTrainer {
    n_features: usize,
    fit: Arc<FitFn>,
    score: Arc<ScoreFn>,
    fit_calls: Arc<AtomicUsize>,
}

impl StubTrainer {
    pub(crate) fn new(
        n_features: usize,
        fit: impl Fn(usize, &SequenceSet) -> Result<(), FitFailure> + Send + Sync + 'static,
        score: impl Fn(usize, &SequenceSet) -> Result<f64, ScoreFailure> + Send + Sync + 'static,
    ) -> Self {
        Self {
            n_features,
            fit: Arc::new(fit),
            score: Arc::new(score),
            fit_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn fit_calls(&self) -> usize {
        self.fit_calls.load(Ordering::SeqCst)
    }
}

pub(crate) struct StubModel {
    n_components: usize,
    n_features: usize,
    score: Arc<ScoreFn>,
}

impl SequenceModel for StubModel {
    fn n_components(&self) -> usize {
        self.n_components
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn score(&self, observations: &SequenceSet) -> Result<f64, ScoreFailure> {
        (self.score)(self.n_components, observations)
    }
}

impl Trainer for StubTrainer {
    type Model = StubModel;

    fn fit(&self, observations: &SequenceSet, n_components: usize, _seed: u64) -> Result<StubModel, FitFailure> {
        self.fit_calls.fetch_add(1, Ordering::SeqCst);
        (self.fit)(n_components, observations)?;
        Ok(StubModel {
            n_components,
            n_features: self.n_features,
            score: Arc::clone(&self.score),
        })
    }
}

/// Fit behavior that succeeds `limit` times and fails from then on.
///
/// With `limit` set to the number of sweep fits, only the final refit fails.
pub(crate) fn fail_after(limit: usize) -> impl Fn(usize, &SequenceSet) -> Result<(), FitFailure> + Send + Sync + 'static {
    let calls = AtomicUsize::new(0);
    move |_, _| {
        if calls.fetch_add(1, Ordering::SeqCst) < limit {
            Ok(())
        } else {
            Err(FitFailure::Degenerate("refit diverged".to_string()))
        }
    }
}

/// Sequences whose every value is `value`, one per entry of `lengths`.
pub(crate) fn constant_sequences(value: f64, lengths: &[usize], n_features: usize) -> Vec<Sequence> {
    lengths
        .iter()
        .map(|&len| vec![vec![value; n_features]; len])
        .collect()
}

pub(crate) fn corpus(labels: &[(&str, Vec<Sequence>)]) -> Corpus {
    let map: BTreeMap<String, Vec<Sequence>> = labels
        .iter()
        .map(|(label, seqs)| (label.to_string(), seqs.clone()))
        .collect();
    Corpus::from_sequences(map).expect("valid test corpus")
}

/// First value of the data, used to tell labels apart.
pub(crate) fn marker(data: &SequenceSet) -> f64 {
    data.data()[(0, 0)]
}
