//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during selection
//! - embedded into exported reports

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Default lower bound (inclusive) of the hidden-state sweep.
pub const DEFAULT_MIN_COMPONENTS: usize = 2;
/// Default upper bound (exclusive) of the hidden-state sweep.
pub const DEFAULT_MAX_COMPONENTS: usize = 10;
/// Default hidden-state count used by the constant selector.
pub const DEFAULT_CONSTANT_COMPONENTS: usize = 3;
/// Default number of cross-validation folds.
pub const DEFAULT_FOLD_COUNT: usize = 4;
/// Default seed handed to every fit.
pub const DEFAULT_SEED: u64 = 14;

/// Which model-order selection strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SelectorKind {
    /// Always keep the configured constant hidden-state count.
    Constant,
    /// Minimize the Bayesian Information Criterion.
    Bic,
    /// Maximize the Discriminative Information Criterion.
    Dic,
    /// Maximize the mean held-out log-likelihood over K folds.
    Cv,
}

impl SelectorKind {
    pub const ALL: [SelectorKind; 4] = [
        SelectorKind::Constant,
        SelectorKind::Bic,
        SelectorKind::Dic,
        SelectorKind::Cv,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            SelectorKind::Constant => "Constant",
            SelectorKind::Bic => "BIC",
            SelectorKind::Dic => "DIC",
            SelectorKind::Cv => "CV",
        }
    }
}

/// Knobs shared by every selector.
///
/// The candidate sweep covers `min_n_components..max_n_components`
/// (upper bound exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionConfig {
    pub min_n_components: usize,
    pub max_n_components: usize,
    /// Hidden-state count used by the constant selector.
    pub n_constant: usize,
    pub fold_count: usize,
    pub seed: u64,
    /// Emit per-candidate progress events.
    pub verbose: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_n_components: DEFAULT_MIN_COMPONENTS,
            max_n_components: DEFAULT_MAX_COMPONENTS,
            n_constant: DEFAULT_CONSTANT_COMPONENTS,
            fold_count: DEFAULT_FOLD_COUNT,
            seed: DEFAULT_SEED,
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_values() {
        let config = SelectionConfig::default();
        assert_eq!(config.min_n_components, 2);
        assert_eq!(config.max_n_components, 10);
        assert_eq!(config.n_constant, 3);
        assert_eq!(config.fold_count, 4);
        assert!(!config.verbose);
    }

    #[test]
    fn selector_kind_serializes_lowercase() {
        let json = serde_json::to_string(&SelectorKind::Dic).unwrap();
        assert_eq!(json, "\"dic\"");
    }
}
