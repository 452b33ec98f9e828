//! Per-label selection context.

use std::ops::Range;

use crate::domain::{Corpus, Sequence, SelectionConfig, SequenceSet};
use crate::error::ContextError;

/// Everything a selector reads while choosing a hidden-state count for one label.
///
/// Borrowed from a [`Corpus`] and never mutated, so independent contexts can be
/// handed to independent threads.
#[derive(Debug, Clone)]
pub struct SelectionContext<'a> {
    label: String,
    corpus: &'a Corpus,
    sequences: &'a [Sequence],
    observations: &'a SequenceSet,
    config: SelectionConfig,
}

impl<'a> SelectionContext<'a> {
    /// Validate the invariants every selector relies on.
    pub fn new(corpus: &'a Corpus, label: &str, config: SelectionConfig) -> Result<Self, ContextError> {
        let sequences = corpus
            .sequences(label)
            .ok_or_else(|| ContextError::UnknownLabel(label.to_string()))?;
        let observations = corpus
            .observations(label)
            .filter(|_| !sequences.is_empty())
            .ok_or_else(|| ContextError::EmptyLabel(label.to_string()))?;

        if config.min_n_components == 0 {
            return Err(ContextError::ZeroComponents(config.min_n_components));
        }
        if config.min_n_components >= config.max_n_components {
            return Err(ContextError::EmptyRange {
                min: config.min_n_components,
                max: config.max_n_components,
            });
        }
        if config.n_constant == 0 {
            return Err(ContextError::InvalidConstant);
        }
        if config.fold_count < 2 {
            return Err(ContextError::InvalidFoldCount(config.fold_count));
        }

        Ok(Self {
            label: label.to_string(),
            corpus,
            sequences,
            observations,
            config,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// This label's samples, one entry per sequence.
    pub fn sequences(&self) -> &'a [Sequence] {
        self.sequences
    }

    /// This label's samples stacked for the trainer.
    pub fn observations(&self) -> &'a SequenceSet {
        self.observations
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Hidden-state counts to sweep, upper bound exclusive.
    pub fn candidates(&self) -> Range<usize> {
        self.config.min_n_components..self.config.max_n_components
    }

    pub fn seed(&self) -> u64 {
        self.config.seed
    }

    pub fn verbose(&self) -> bool {
        self.config.verbose
    }

    /// Concatenated observations of every other non-empty label, in label order.
    pub fn others(&self) -> impl Iterator<Item = (&'a str, &'a SequenceSet)> {
        let me = self.label.clone();
        self.corpus
            .concatenated()
            .iter()
            .filter(move |(label, _)| **label != me)
            .map(|(label, set)| (label.as_str(), set))
    }
}
