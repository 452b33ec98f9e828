//! Cross-validated log-likelihood selection.
//!
//! For each candidate the label's sequences are split into K folds; a model is
//! fitted on each training partition and scored on the held-out one. The
//! candidate score is the mean of the fold scores that succeeded, or `0.0`
//! when no fold produced one. Higher is better.
//!
//! A fold whose train or test side is empty (a label with a single sample) is
//! skipped without a fit attempt. If fits were attempted during the sweep and
//! every single one failed, the outcome is `NO_VALID_CANDIDATE`.

use crate::domain::{SelectorKind, combine_sequences};
use crate::fit::{Fold, FoldSplitter, KFold, SequenceModel, Trainer};
use crate::select::{
    CandidateResult, Goal, NO_VALID_CANDIDATE, SelectionContext, SelectionOutcome, SelectionStrategy, Sweep,
};

/// Mean of the successful fold scores, `0.0` if there are none.
pub fn cv_mean(fold_scores: &[f64]) -> f64 {
    if fold_scores.is_empty() {
        return 0.0;
    }
    fold_scores.iter().sum::<f64>() / fold_scores.len() as f64
}

/// Fit bookkeeping for one candidate.
#[derive(Debug, Default, Clone, Copy)]
struct FitTally {
    attempted: usize,
    fitted: usize,
}

/// Picks the candidate with the best mean held-out log-likelihood.
#[derive(Debug, Clone, Copy)]
pub struct CrossValidationSelector<S = KFold> {
    splitter: S,
}

impl Default for CrossValidationSelector<KFold> {
    fn default() -> Self {
        Self { splitter: KFold }
    }
}

impl<S: FoldSplitter> CrossValidationSelector<S> {
    pub fn new(splitter: S) -> Self {
        Self { splitter }
    }

    fn evaluate<T: Trainer>(
        ctx: &SelectionContext<'_>,
        trainer: &T,
        folds: &[Fold],
        n: usize,
    ) -> (CandidateResult<T::Model>, FitTally) {
        let mut tally = FitTally::default();
        let mut scores = Vec::with_capacity(folds.len());

        for (k, fold) in folds.iter().enumerate() {
            if !fold.is_usable() {
                tracing::debug!(label = ctx.label(), fold = k, "skipping fold without train or test data");
                continue;
            }
            let (train, test) = match (
                combine_sequences(&fold.train, ctx.sequences()),
                combine_sequences(&fold.test, ctx.sequences()),
            ) {
                (Ok(train), Ok(test)) => (train, test),
                (Err(err), _) | (_, Err(err)) => {
                    tracing::debug!(label = ctx.label(), fold = k, error = %err, "could not build fold");
                    continue;
                }
            };

            tally.attempted += 1;
            let model = match trainer.fit(&train, n, ctx.seed()) {
                Ok(model) => model,
                Err(err) => {
                    tracing::debug!(label = ctx.label(), n_components = n, fold = k, error = %err, "CV fit failed");
                    continue;
                }
            };
            tally.fitted += 1;

            match model.score(&test) {
                Ok(ll) if ll.is_finite() => scores.push(ll),
                Ok(_) => {
                    tracing::debug!(label = ctx.label(), n_components = n, fold = k, "held-out score not finite");
                }
                Err(err) => {
                    tracing::debug!(label = ctx.label(), n_components = n, fold = k, error = %err, "held-out scoring failed");
                }
            }
        }

        let candidate = CandidateResult {
            components: n,
            score: Some(cv_mean(&scores)),
            model: None,
        };
        (candidate, tally)
    }
}

impl<S: FoldSplitter> SelectionStrategy for CrossValidationSelector<S> {
    fn kind(&self) -> SelectorKind {
        SelectorKind::Cv
    }

    fn select<T: Trainer>(&self, ctx: &SelectionContext<'_>, trainer: &T) -> SelectionOutcome<T::Model> {
        let folds = self
            .splitter
            .split(ctx.sequences().len(), ctx.config().fold_count);

        let mut sweep = Sweep::new(Goal::Maximize);
        let mut total = FitTally::default();
        for n in ctx.candidates() {
            let (candidate, tally) = Self::evaluate(ctx, trainer, &folds, n);
            total.attempted += tally.attempted;
            total.fitted += tally.fitted;
            sweep.record(ctx, candidate);
        }

        if total.attempted > 0 && total.fitted == 0 {
            tracing::debug!(label = ctx.label(), attempts = total.attempted, "no fold fit succeeded");
            return SelectionOutcome {
                best_components: NO_VALID_CANDIDATE,
                best_score: None,
                candidates: sweep.candidates,
                model: None,
            };
        }

        sweep.finish(ctx, trainer)
    }
}
