//! Batch selection over a corpus.
//!
//! Every requested label gets its own `SelectionContext`; the contexts are all
//! validated before any fitting starts, then swept in parallel. A label ending
//! in `NO_VALID_CANDIDATE` is just another result.

use rayon::prelude::*;

use crate::domain::{Corpus, SelectionConfig, SelectorKind};
use crate::error::{AppError, ContextError};
use crate::fit::Trainer;
use crate::models::GaussianHmmTrainer;
use crate::report::SelectionReport;
use crate::select::{SelectionContext, SelectionOutcome};

/// Selection result for one label.
#[derive(Debug, Clone)]
pub struct LabelSelection<M> {
    pub label: String,
    pub n_sequences: usize,
    pub n_frames: usize,
    pub outcome: SelectionOutcome<M>,
}

/// All computed outputs of a single `hmmsel select` run.
#[derive(Debug, Clone)]
pub struct RunOutput<M> {
    pub results: Vec<LabelSelection<M>>,
    pub report: SelectionReport,
}

/// Run `selector` for each of `labels` (every corpus label when empty).
///
/// Fails only when a context cannot be built, and then before any fit.
pub fn run_batch<T>(
    corpus: &Corpus,
    labels: &[String],
    selector: SelectorKind,
    config: SelectionConfig,
    trainer: &T,
) -> Result<Vec<LabelSelection<T::Model>>, ContextError>
where
    T: Trainer + Sync,
    T::Model: Send,
{
    let requested: Vec<&str> = if labels.is_empty() {
        corpus.labels().collect()
    } else {
        labels.iter().map(String::as_str).collect()
    };

    let contexts = requested
        .into_iter()
        .map(|label| SelectionContext::new(corpus, label, config))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(
        labels = contexts.len(),
        selector = selector.display_name(),
        "starting selection"
    );

    let results = contexts
        .par_iter()
        .map(|ctx| {
            let outcome = selector.select(ctx, trainer);
            if outcome.is_no_valid_candidate() {
                tracing::warn!(label = ctx.label(), "no valid candidate");
            }
            LabelSelection {
                label: ctx.label().to_string(),
                n_sequences: ctx.sequences().len(),
                n_frames: ctx.observations().n_rows(),
                outcome,
            }
        })
        .collect();

    Ok(results)
}

/// Execute the batch with the stock Gaussian HMM trainer and build the report.
pub fn run_selection(
    corpus: &Corpus,
    labels: &[String],
    selector: SelectorKind,
    config: SelectionConfig,
) -> Result<RunOutput<crate::models::GaussianHmm>, AppError> {
    if corpus.is_empty() {
        return Err(AppError::new(2, "Corpus has no labels."));
    }
    let trainer = GaussianHmmTrainer::default();
    let results = run_batch(corpus, labels, selector, config, &trainer)?;
    let report = SelectionReport::new(selector, config, &results);
    Ok(RunOutput { results, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FitFailure;
    use crate::select::stub::*;

    fn three_labels() -> Corpus {
        corpus(&[
            ("A", constant_sequences(1.0, &[4, 4, 4], 1)),
            ("B", constant_sequences(2.0, &[4, 4], 1)),
            ("C", constant_sequences(3.0, &[4, 4, 4], 1)),
        ])
    }

    #[test]
    fn batch_continues_past_label_without_valid_candidate() {
        let corpus = three_labels();
        let trainer = StubTrainer::new(
            1,
            |_, data| {
                if marker(data) == 2.0 {
                    Err(FitFailure::Degenerate("collapsed".into()))
                } else {
                    Ok(())
                }
            },
            |n, _| Ok(-10.0 * n as f64),
        );

        let results = run_batch(&corpus, &[], SelectorKind::Bic, SelectionConfig::default(), &trainer).unwrap();
        let labels: Vec<&str> = results.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["A", "B", "C"]);

        assert!(!results[0].outcome.is_no_valid_candidate());
        assert!(results[1].outcome.is_no_valid_candidate());
        assert!(results[1].outcome.model.is_none());
        assert!(!results[2].outcome.is_no_valid_candidate());
        assert!(results[2].outcome.model.is_some());
        assert_eq!(results[0].n_frames, 12);
        assert_eq!(results[1].n_sequences, 2);
    }

    #[test]
    fn bad_label_fails_before_fitting() {
        let corpus = three_labels();
        let trainer = StubTrainer::new(1, |_, _| Ok(()), |_, _| Ok(0.0));
        let labels = vec!["A".to_string(), "Z".to_string()];

        let Err(err) = run_batch(&corpus, &labels, SelectorKind::Cv, SelectionConfig::default(), &trainer) else {
            panic!("unknown label was accepted");
        };
        assert_eq!(err, ContextError::UnknownLabel("Z".to_string()));
        assert_eq!(trainer.fit_calls(), 0);
    }

    #[test]
    fn selected_labels_only() {
        let corpus = three_labels();
        let trainer = StubTrainer::new(1, |_, _| Ok(()), |_, _| Ok(-1.0));
        let labels = vec!["C".to_string()];

        let results =
            run_batch(&corpus, &labels, SelectorKind::Constant, SelectionConfig::default(), &trainer).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].outcome.best_components, 3);
    }

    #[test]
    fn generated_corpus_end_to_end() {
        let corpus = crate::data::generate_corpus(&crate::data::SampleSpec {
            labels: 2,
            sequences_per_label: 4,
            frames_per_sequence: 15,
            n_features: 2,
            n_states: 2,
            seed: 5,
        })
        .unwrap();
        let config = SelectionConfig {
            min_n_components: 2,
            max_n_components: 4,
            ..SelectionConfig::default()
        };

        let run = run_selection(&corpus, &[], SelectorKind::Bic, config).unwrap();
        assert_eq!(run.report.labels.len(), 2);
        for label in &run.report.labels {
            assert!((2..4).contains(&label.best_components), "{label:?}");
            assert!(label.refit_ok);
            assert_eq!(label.candidates.len(), 2);
        }
    }

    #[test]
    fn empty_corpus_is_rejected() {
        let err = run_selection(&Corpus::default(), &[], SelectorKind::Bic, SelectionConfig::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
