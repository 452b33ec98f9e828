//! Command-line parsing for `hmmsel`.
//!
//! Argument parsing and command dispatch stay separate from the selection
//! code. Every option can also be set through an `HMMSEL_*` environment
//! variable (a `.env` file in the working directory is loaded first).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::data::SampleSpec;
use crate::domain::{
    DEFAULT_CONSTANT_COMPONENTS, DEFAULT_FOLD_COUNT, DEFAULT_MAX_COMPONENTS, DEFAULT_MIN_COMPONENTS, DEFAULT_SEED,
    SelectionConfig, SelectorKind,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "hmmsel", version, about = "Hidden-state count selection for per-label HMMs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Select a hidden-state count for every label of a corpus.
    Select(SelectArgs),
    /// Write a synthetic corpus drawn from random Gaussian HMMs.
    Generate(GenerateArgs),
}

/// Options for `hmmsel select`.
#[derive(Debug, Parser, Clone)]
pub struct SelectArgs {
    /// Corpus JSON file (`{label: [[[f64]]]}`).
    #[arg(long, value_name = "JSON", env = "HMMSEL_CORPUS")]
    pub corpus: PathBuf,

    /// Selection strategy.
    #[arg(short = 's', long, value_enum, default_value_t = SelectorKind::Cv, env = "HMMSEL_SELECTOR")]
    pub selector: SelectorKind,

    /// Smallest hidden-state count tried.
    #[arg(long, default_value_t = DEFAULT_MIN_COMPONENTS, env = "HMMSEL_MIN_COMPONENTS")]
    pub min_components: usize,

    /// Upper bound (exclusive) of the hidden-state sweep.
    #[arg(long, default_value_t = DEFAULT_MAX_COMPONENTS, env = "HMMSEL_MAX_COMPONENTS")]
    pub max_components: usize,

    /// Hidden-state count used by the constant selector.
    #[arg(long, default_value_t = DEFAULT_CONSTANT_COMPONENTS, env = "HMMSEL_CONSTANT")]
    pub constant: usize,

    /// Cross-validation folds.
    #[arg(short = 'k', long, default_value_t = DEFAULT_FOLD_COUNT, env = "HMMSEL_FOLDS")]
    pub folds: usize,

    /// Seed passed to every fit.
    #[arg(long, default_value_t = DEFAULT_SEED, env = "HMMSEL_SEED")]
    pub seed: u64,

    /// Log per-candidate scores and print them after the summary.
    #[arg(short, long, env = "HMMSEL_VERBOSE")]
    pub verbose: bool,

    /// Only these labels (repeatable). Defaults to every label.
    #[arg(short = 'l', long = "label", value_name = "LABEL")]
    pub labels: Vec<String>,

    /// Export the selection report to JSON.
    #[arg(long, value_name = "JSON", env = "HMMSEL_EXPORT")]
    pub export: Option<PathBuf>,
}

impl SelectArgs {
    pub fn selection_config(&self) -> SelectionConfig {
        SelectionConfig {
            min_n_components: self.min_components,
            max_n_components: self.max_components,
            n_constant: self.constant,
            fold_count: self.folds,
            seed: self.seed,
            verbose: self.verbose,
        }
    }
}

/// Options for `hmmsel generate`.
#[derive(Debug, Parser, Clone)]
pub struct GenerateArgs {
    /// Output corpus JSON file.
    #[arg(long, value_name = "JSON")]
    pub out: PathBuf,

    #[arg(long, default_value_t = 4)]
    pub labels: usize,

    /// Sequences per label.
    #[arg(long, default_value_t = 8)]
    pub sequences: usize,

    /// Frames per sequence.
    #[arg(long, default_value_t = 20)]
    pub frames: usize,

    #[arg(long, default_value_t = 4)]
    pub features: usize,

    /// Hidden states of each generating model.
    #[arg(long, default_value_t = 3)]
    pub states: usize,

    #[arg(long, default_value_t = DEFAULT_SEED, env = "HMMSEL_SEED")]
    pub seed: u64,
}

impl GenerateArgs {
    pub fn sample_spec(&self) -> SampleSpec {
        SampleSpec {
            labels: self.labels,
            sequences_per_label: self.sequences,
            frames_per_sequence: self.frames,
            n_features: self.features,
            n_states: self.states,
            seed: self.seed,
        }
    }
}
