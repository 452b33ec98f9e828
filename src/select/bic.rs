//! Bayesian Information Criterion selection.
//!
//! `BIC(n) = -2 · logL(n) + p(n) · ln(N)` where `N` is the number of
//! observation rows (frames, not sequences) and, for a diagonal Gaussian HMM
//! with `f` features,
//!
//! ```text
//! p(n) = n² + 2·f·n − 1
//! ```
//!
//! i.e. the transition entries plus per-state mean and variance parameters,
//! minus one for the row-stochastic constraint. Lower is better.

use crate::domain::SelectorKind;
use crate::fit::{SequenceModel, Trainer};
use crate::select::{CandidateResult, Goal, SelectionContext, SelectionOutcome, SelectionStrategy, Sweep};

/// Free parameters charged for `n_components` states over `n_features` features.
///
/// `n_components` must be at least 1.
pub fn parameter_count(n_components: usize, n_features: usize) -> usize {
    n_components * n_components + 2 * n_features * n_components - 1
}

pub fn bic_score(log_likelihood: f64, n_components: usize, n_features: usize, n_rows: usize) -> f64 {
    let p = parameter_count(n_components, n_features) as f64;
    -2.0 * log_likelihood + p * (n_rows as f64).ln()
}

/// Picks the candidate with the lowest BIC on the label's own data.
#[derive(Debug, Clone, Copy, Default)]
pub struct BicSelector;

impl BicSelector {
    fn evaluate<T: Trainer>(ctx: &SelectionContext<'_>, trainer: &T, n: usize) -> CandidateResult<T::Model> {
        let data = ctx.observations();
        let model = match trainer.fit(data, n, ctx.seed()) {
            Ok(model) => model,
            Err(err) => {
                tracing::debug!(label = ctx.label(), n_components = n, error = %err, "BIC fit failed");
                return CandidateResult::invalid(n);
            }
        };
        let log_likelihood = match model.score(data) {
            Ok(ll) => ll,
            Err(err) => {
                tracing::debug!(label = ctx.label(), n_components = n, error = %err, "BIC scoring failed");
                return CandidateResult::invalid(n);
            }
        };

        let score = bic_score(log_likelihood, n, model.n_features(), data.n_rows());
        CandidateResult {
            components: n,
            score: score.is_finite().then_some(score),
            model: Some(model),
        }
    }
}

impl SelectionStrategy for BicSelector {
    fn kind(&self) -> SelectorKind {
        SelectorKind::Bic
    }

    fn select<T: Trainer>(&self, ctx: &SelectionContext<'_>, trainer: &T) -> SelectionOutcome<T::Model> {
        let mut sweep = Sweep::new(Goal::Minimize);
        for n in ctx.candidates() {
            sweep.record(ctx, Self::evaluate(ctx, trainer, n));
        }
        sweep.finish(ctx, trainer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SelectionConfig;
    use crate::error::{FitFailure, ScoreFailure};
    use crate::select::stub::*;

    fn range(min: usize, max: usize) -> SelectionConfig {
        SelectionConfig {
            min_n_components: min,
            max_n_components: max,
            ..SelectionConfig::default()
        }
    }

    #[test]
    fn parameter_count_formula() {
        assert_eq!(parameter_count(2, 5), 23);
        assert_eq!(parameter_count(3, 5), 38);
        assert_eq!(parameter_count(1, 1), 2);
    }

    #[test]
    fn penalty_outweighs_small_likelihood_gain() {
        // 50 rows of 5 features; logL -100 at n=2 and -90 at n=3.
        let corpus = corpus(&[("A", constant_sequences(1.0, &[10; 5], 5))]);
        let ctx = SelectionContext::new(&corpus, "A", range(2, 4)).unwrap();
        let trainer = StubTrainer::new(5, |_, _| Ok(()), |n, _| Ok(if n == 2 { -100.0 } else { -90.0 }));

        let outcome = BicSelector.select(&ctx, &trainer);
        assert_eq!(outcome.best_components, 2);
        assert!(outcome.model.is_some());

        let ln50 = 50f64.ln();
        let s2 = outcome.candidates[0].score.unwrap();
        let s3 = outcome.candidates[1].score.unwrap();
        assert!((s2 - (200.0 + 23.0 * ln50)).abs() < 1e-9);
        assert!((s3 - (180.0 + 38.0 * ln50)).abs() < 1e-9);
        assert!((s2 - 289.98).abs() < 0.01, "{s2}");
        assert!((s3 - 328.66).abs() < 0.01, "{s3}");
        assert_eq!(outcome.best_score, Some(s2));
    }

    #[test]
    fn equal_likelihood_prefers_fewer_states() {
        let corpus = corpus(&[("A", constant_sequences(1.0, &[6, 6], 2))]);
        let ctx = SelectionContext::new(&corpus, "A", range(2, 7)).unwrap();
        let trainer = StubTrainer::new(2, |_, _| Ok(()), |_, _| Ok(-42.0));

        let outcome = BicSelector.select(&ctx, &trainer);
        assert_eq!(outcome.best_components, 2);
        let scores: Vec<f64> = outcome.candidates.iter().map(|c| c.score.unwrap()).collect();
        assert!(scores.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn failed_candidates_never_win() {
        let corpus = corpus(&[("A", constant_sequences(1.0, &[8], 1))]);
        let ctx = SelectionContext::new(&corpus, "A", range(2, 5)).unwrap();
        let trainer = StubTrainer::new(
            1,
            |n, _| {
                if n == 2 {
                    Err(FitFailure::Degenerate("singular covariance".into()))
                } else {
                    Ok(())
                }
            },
            |n, _| {
                if n == 3 {
                    Err(ScoreFailure::NonFinite)
                } else {
                    Ok(-10.0)
                }
            },
        );

        let outcome = BicSelector.select(&ctx, &trainer);
        assert_eq!(outcome.best_components, 4);
        assert_eq!(outcome.candidates[0].score, None);
        assert_eq!(outcome.candidates[1].score, None);
        assert!(outcome.candidates[2].score.is_some());
    }

    #[test]
    fn nothing_fits_means_no_refit() {
        let corpus = corpus(&[("A", constant_sequences(1.0, &[2], 1))]);
        let ctx = SelectionContext::new(&corpus, "A", range(2, 6)).unwrap();
        let trainer = StubTrainer::new(
            1,
            |n, data| {
                Err(FitFailure::InsufficientData {
                    rows: data.n_rows(),
                    n_components: n,
                })
            },
            |_, _| Ok(0.0),
        );

        let outcome = BicSelector.select(&ctx, &trainer);
        assert!(outcome.is_no_valid_candidate());
        assert!(outcome.model.is_none());
        // One attempt per candidate, no final refit.
        assert_eq!(trainer.fit_calls(), 4);
    }

    #[test]
    fn failed_refit_keeps_winner() {
        let corpus = corpus(&[("A", constant_sequences(1.0, &[6, 6], 2))]);
        let ctx = SelectionContext::new(&corpus, "A", range(2, 5)).unwrap();
        let trainer = StubTrainer::new(2, fail_after(3), |_, _| Ok(-42.0));

        let outcome = BicSelector.select(&ctx, &trainer);
        assert_eq!(outcome.best_components, 2);
        assert!(outcome.best_score.is_some());
        assert!(outcome.model.is_none());
        assert!(!outcome.is_no_valid_candidate());
        assert_eq!(trainer.fit_calls(), 4);
    }
}
