//! Error types.
//!
//! Library code returns the typed errors below. Only the binary boundary turns
//! them into an [`AppError`] carrying a process exit code.

use thiserror::Error;

/// A trainer could not fit a model at the requested complexity.
///
/// Always recovered by the selectors: the candidate (or fold) is dropped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitFailure {
    #[error("invalid hidden-state count {0}")]
    InvalidComponents(usize),
    #[error("{rows} observation rows cannot support {n_components} hidden states")]
    InsufficientData { rows: usize, n_components: usize },
    #[error("observations contain non-finite values")]
    NonFinite,
    #[error("degenerate parameters: {0}")]
    Degenerate(String),
}

/// A fitted model could not score a set of sequences.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreFailure {
    #[error("feature dimension mismatch: model has {expected}, data has {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("no observations to score")]
    Empty,
    #[error("log-likelihood is not finite")]
    NonFinite,
}

/// A selection context violates its invariants (caller bug, never data).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("label '{0}' is not in the corpus")]
    UnknownLabel(String),
    #[error("label '{0}' has no sequences")]
    EmptyLabel(String),
    #[error("empty candidate range [{min}, {max})")]
    EmptyRange { min: usize, max: usize },
    #[error("candidate range must start at 1 or more, got {0}")]
    ZeroComponents(usize),
    #[error("constant component count must be at least 1")]
    InvalidConstant,
    #[error("fold count must be at least 2, got {0}")]
    InvalidFoldCount(usize),
}

/// Malformed observation data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("no sequences to combine")]
    Empty,
    #[error("sequence {index} has no frames")]
    EmptySequence { index: usize },
    #[error("frame has {got} features, expected {expected}")]
    Ragged { expected: usize, got: usize },
    #[error("frames have zero features")]
    NoFeatures,
    #[error("sample index {index} out of range for {len} sequences")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<ContextError> for AppError {
    fn from(err: ContextError) -> Self {
        AppError::new(3, format!("Invalid selection context: {err}"))
    }
}

impl From<DataError> for AppError {
    fn from(err: DataError) -> Self {
        AppError::new(2, format!("Invalid corpus: {err}"))
    }
}
