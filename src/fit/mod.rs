//! Fitting seams consumed by the selectors.
//!
//! Responsibilities:
//!
//! - the trainer/model contract (`Trainer`, `SequenceModel`)
//! - cross-validation fold splitting (`FoldSplitter`, `KFold`)

pub mod folds;
pub mod trainer;

pub use folds::*;
pub use trainer::*;
