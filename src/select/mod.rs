//! Model-order selection.
//!
//! Each selector sweeps the context's candidate hidden-state counts, asks the
//! trainer to fit and score, and keeps the best candidate:
//!
//! - `ConstantSelector`: no sweep, always the configured constant
//! - `BicSelector`: minimum `-2·logL + p·ln(N)`
//! - `DicSelector`: maximum `logL(self) - mean(logL(others))`
//! - `CrossValidationSelector`: maximum mean held-out log-likelihood
//!
//! Whatever was fitted while scoring is thrown away. The returned model always
//! comes from one final refit on the label's full data at the winning count.
//! Fit and score failures only ever invalidate a candidate (or a fold, or one
//! other label); a sweep where nothing fits yields `best_components == 0`.

pub mod bic;
pub mod constant;
pub mod context;
pub mod cv;
pub mod dic;

#[cfg(test)]
pub(crate) mod stub;

pub use bic::*;
pub use constant::*;
pub use context::*;
pub use cv::*;
pub use dic::*;

use serde::{Deserialize, Serialize};

use crate::domain::SelectorKind;
use crate::fit::{KFold, Trainer};

/// `best_components` value meaning "no candidate produced a valid score".
pub const NO_VALID_CANDIDATE: usize = 0;

/// A model-order selection strategy.
pub trait SelectionStrategy {
    fn kind(&self) -> SelectorKind;

    /// Choose a hidden-state count for `ctx.label()` and refit at it.
    ///
    /// Never fails: numerical trouble shows up as invalid candidates or as a
    /// `NO_VALID_CANDIDATE` outcome.
    fn select<T: Trainer>(&self, ctx: &SelectionContext<'_>, trainer: &T) -> SelectionOutcome<T::Model>;
}

impl SelectorKind {
    /// Run the stock selector for this kind.
    pub fn select<T: Trainer>(self, ctx: &SelectionContext<'_>, trainer: &T) -> SelectionOutcome<T::Model> {
        match self {
            SelectorKind::Constant => ConstantSelector.select(ctx, trainer),
            SelectorKind::Bic => BicSelector.select(ctx, trainer),
            SelectorKind::Dic => DicSelector.select(ctx, trainer),
            SelectorKind::Cv => CrossValidationSelector::<KFold>::default().select(ctx, trainer),
        }
    }
}

/// Score of one swept candidate, kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub components: usize,
    /// `None` when the candidate could not be fitted or scored.
    pub score: Option<f64>,
}

/// One sweep iteration: the candidate's score and the model it was scored with.
#[derive(Debug)]
pub struct CandidateResult<M> {
    pub components: usize,
    pub score: Option<f64>,
    pub model: Option<M>,
}

impl<M> CandidateResult<M> {
    fn invalid(components: usize) -> Self {
        Self {
            components,
            score: None,
            model: None,
        }
    }
}

/// Result of [`SelectionStrategy::select`].
#[derive(Debug, Clone)]
pub struct SelectionOutcome<M> {
    /// Winning hidden-state count, or [`NO_VALID_CANDIDATE`].
    pub best_components: usize,
    pub best_score: Option<f64>,
    pub candidates: Vec<CandidateScore>,
    /// Final refit at `best_components`; `None` if skipped or if it failed.
    pub model: Option<M>,
}

impl<M> SelectionOutcome<M> {
    pub fn is_no_valid_candidate(&self) -> bool {
        self.best_components == NO_VALID_CANDIDATE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Goal {
    Minimize,
    Maximize,
}

/// Running best of a sweep. Ties keep the earliest candidate.
#[derive(Debug)]
struct Sweep {
    goal: Goal,
    best: Option<(usize, f64)>,
    candidates: Vec<CandidateScore>,
}

impl Sweep {
    fn new(goal: Goal) -> Self {
        Self {
            goal,
            best: None,
            candidates: Vec::new(),
        }
    }

    fn record<M>(&mut self, ctx: &SelectionContext<'_>, candidate: CandidateResult<M>) {
        let CandidateResult {
            components, score, ..
        } = candidate;
        self.candidates.push(CandidateScore { components, score });

        if ctx.verbose() {
            match score {
                Some(score) => tracing::info!(label = ctx.label(), components, score, "candidate scored"),
                None => tracing::info!(label = ctx.label(), components, "candidate invalid"),
            }
        }

        let Some(score) = score.filter(|s| s.is_finite()) else {
            return;
        };
        let better = match self.best {
            None => true,
            Some((_, best)) => match self.goal {
                Goal::Minimize => score < best,
                Goal::Maximize => score > best,
            },
        };
        if better {
            self.best = Some((components, score));
        }
    }

    fn finish<T: Trainer>(self, ctx: &SelectionContext<'_>, trainer: &T) -> SelectionOutcome<T::Model> {
        let (best_components, best_score) = match self.best {
            Some((n, score)) => (n, Some(score)),
            None => (NO_VALID_CANDIDATE, None),
        };
        SelectionOutcome {
            best_components,
            best_score,
            candidates: self.candidates,
            model: refit(ctx, trainer, best_components),
        }
    }
}

/// Fit the label's full data at `n_components`.
///
/// Skipped for [`NO_VALID_CANDIDATE`]. A failure here keeps the winning count
/// but yields no model.
pub fn refit<T: Trainer>(ctx: &SelectionContext<'_>, trainer: &T, n_components: usize) -> Option<T::Model> {
    if n_components == NO_VALID_CANDIDATE {
        tracing::debug!(label = ctx.label(), "no valid candidate, skipping refit");
        return None;
    }
    match trainer.fit(ctx.observations(), n_components, ctx.seed()) {
        Ok(model) => {
            if ctx.verbose() {
                tracing::info!(label = ctx.label(), n_components, "model created");
            }
            Some(model)
        }
        Err(err) => {
            tracing::debug!(label = ctx.label(), n_components, error = %err, "final refit failed");
            None
        }
    }
}
