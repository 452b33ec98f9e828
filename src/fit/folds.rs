//! Cross-validation fold generation.
//!
//! Folds are over *samples* (whole sequences), never over feature rows, so a
//! sequence is never split between train and test.

/// One train/test partition of sample indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl Fold {
    /// A fold can only be evaluated when both sides have data.
    pub fn is_usable(&self) -> bool {
        !self.train.is_empty() && !self.test.is_empty()
    }
}

/// Deterministic partitioning of `sample_count` samples into folds.
pub trait FoldSplitter {
    fn split(&self, sample_count: usize, fold_count: usize) -> Vec<Fold>;
}

/// Contiguous, unshuffled K-fold.
///
/// The first `sample_count % fold_count` folds hold one extra test sample.
/// At most `sample_count` folds are built: with fewer samples than folds each
/// sample is held out once and the extra folds would have nothing to test.
/// A single sample still yields one fold, with an empty train side.
#[derive(Debug, Clone, Copy, Default)]
pub struct KFold;

impl FoldSplitter for KFold {
    fn split(&self, sample_count: usize, fold_count: usize) -> Vec<Fold> {
        let fold_count = fold_count.min(sample_count);
        if fold_count == 0 {
            return Vec::new();
        }
        let base = sample_count / fold_count;
        let extra = sample_count % fold_count;

        let mut folds = Vec::with_capacity(fold_count);
        let mut start = 0;
        for k in 0..fold_count {
            let size = base + usize::from(k < extra);
            let end = start + size;
            let test: Vec<usize> = (start..end).collect();
            let train: Vec<usize> = (0..start).chain(end..sample_count).collect();
            folds.push(Fold { train, test });
            start = end;
        }
        folds
    }
}
