//! Discriminative Information Criterion selection.
//!
//! `DIC(n) = logL(self) − mean(logL(other labels))`, all scored with the model
//! fitted on this label at `n` states. Higher is better: a good model explains
//! its own label and explains the competition badly.

use crate::domain::SelectorKind;
use crate::fit::{SequenceModel, Trainer};
use crate::select::{CandidateResult, Goal, SelectionContext, SelectionOutcome, SelectionStrategy, Sweep};

/// Combine the self score with the scores other labels obtained.
///
/// With no successfully scored rival the penalty term is zero.
pub fn dic_score(self_log_likelihood: f64, other_log_likelihoods: &[f64]) -> f64 {
    if other_log_likelihoods.is_empty() {
        return self_log_likelihood;
    }
    let mean = other_log_likelihoods.iter().sum::<f64>() / other_log_likelihoods.len() as f64;
    self_log_likelihood - mean
}

/// Picks the candidate that best separates this label from all others.
#[derive(Debug, Clone, Copy, Default)]
pub struct DicSelector;

impl DicSelector {
    fn evaluate<T: Trainer>(ctx: &SelectionContext<'_>, trainer: &T, n: usize) -> CandidateResult<T::Model> {
        let model = match trainer.fit(ctx.observations(), n, ctx.seed()) {
            Ok(model) => model,
            Err(err) => {
                tracing::debug!(label = ctx.label(), n_components = n, error = %err, "DIC fit failed");
                return CandidateResult::invalid(n);
            }
        };
        let self_ll = match model.score(ctx.observations()) {
            Ok(ll) if ll.is_finite() => ll,
            Ok(_) => {
                tracing::debug!(label = ctx.label(), n_components = n, "DIC self score not finite");
                return CandidateResult::invalid(n);
            }
            Err(err) => {
                tracing::debug!(label = ctx.label(), n_components = n, error = %err, "DIC self scoring failed");
                return CandidateResult::invalid(n);
            }
        };

        let mut others = Vec::new();
        for (other, data) in ctx.others() {
            match model.score(data) {
                Ok(ll) if ll.is_finite() => others.push(ll),
                Ok(_) => {
                    tracing::debug!(label = ctx.label(), other, n_components = n, "rival score not finite");
                }
                Err(err) => {
                    tracing::debug!(label = ctx.label(), other, n_components = n, error = %err, "rival scoring failed");
                }
            }
        }

        let score = dic_score(self_ll, &others);
        CandidateResult {
            components: n,
            score: score.is_finite().then_some(score),
            model: Some(model),
        }
    }
}

impl SelectionStrategy for DicSelector {
    fn kind(&self) -> SelectorKind {
        SelectorKind::Dic
    }

    fn select<T: Trainer>(&self, ctx: &SelectionContext<'_>, trainer: &T) -> SelectionOutcome<T::Model> {
        let mut sweep = Sweep::new(Goal::Maximize);
        for n in ctx.candidates() {
            sweep.record(ctx, Self::evaluate(ctx, trainer, n));
        }
        sweep.finish(ctx, trainer)
    }
}
