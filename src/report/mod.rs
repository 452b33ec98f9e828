//! Per-label selection results in reportable form.
//!
//! Fitted models are never written out; a report only carries what was chosen
//! and how every candidate scored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::pipeline::LabelSelection;
use crate::domain::{SelectionConfig, SelectorKind};
use crate::select::CandidateScore;

pub mod format;

pub use format::*;

/// Outcome of one label, without the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelReport {
    pub label: String,
    pub n_sequences: usize,
    pub n_frames: usize,
    /// `0` when no candidate produced a valid score.
    pub best_components: usize,
    pub best_score: Option<f64>,
    /// Whether the final refit produced a model.
    pub refit_ok: bool,
    pub candidates: Vec<CandidateScore>,
}

/// A whole batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionReport {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub selector: SelectorKind,
    pub config: SelectionConfig,
    pub labels: Vec<LabelReport>,
}

impl SelectionReport {
    pub fn new<M>(selector: SelectorKind, config: SelectionConfig, results: &[LabelSelection<M>]) -> Self {
        Self {
            tool: "hmmsel".to_string(),
            generated_at: Utc::now(),
            selector,
            config,
            labels: results.iter().map(LabelReport::from).collect(),
        }
    }

    /// Labels where nothing could be fitted.
    pub fn no_valid_candidate_count(&self) -> usize {
        self.labels.iter().filter(|l| l.best_components == 0).count()
    }
}

impl<M> From<&LabelSelection<M>> for LabelReport {
    fn from(result: &LabelSelection<M>) -> Self {
        Self {
            label: result.label.clone(),
            n_sequences: result.n_sequences,
            n_frames: result.n_frames,
            best_components: result.outcome.best_components,
            best_score: result.outcome.best_score,
            refit_ok: result.outcome.model.is_some(),
            candidates: result.outcome.candidates.clone(),
        }
    }
}
