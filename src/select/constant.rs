//! Fixed-complexity baseline.

use crate::domain::SelectorKind;
use crate::fit::Trainer;
use crate::select::{SelectionContext, SelectionOutcome, SelectionStrategy, refit};

/// Always keeps `n_constant` hidden states; used as a control.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantSelector;

impl SelectionStrategy for ConstantSelector {
    fn kind(&self) -> SelectorKind {
        SelectorKind::Constant
    }

    fn select<T: Trainer>(&self, ctx: &SelectionContext<'_>, trainer: &T) -> SelectionOutcome<T::Model> {
        let n = ctx.config().n_constant;
        SelectionOutcome {
            best_components: n,
            best_score: None,
            candidates: Vec::new(),
            model: refit(ctx, trainer, n),
        }
    }
}
