//! Observation containers.
//!
//! A *sequence* is one recorded sample of a label: an ordered list of feature
//! frames. Trainers never see individual sequences; they consume a
//! [`SequenceSet`], i.e. all frames stacked into one matrix plus the length of
//! each sequence so recursions restart at sequence boundaries.

use std::collections::BTreeMap;

use nalgebra::DMatrix;

use crate::error::DataError;

/// One observation sequence: `frames × features`.
pub type Sequence = Vec<Vec<f64>>;

/// Concatenated observations plus per-sequence lengths.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceSet {
    data: DMatrix<f64>,
    lengths: Vec<usize>,
}

impl SequenceSet {
    /// Stack `sequences` into a single observation matrix.
    pub fn from_sequences(sequences: &[Sequence]) -> Result<Self, DataError> {
        let refs: Vec<&Sequence> = sequences.iter().collect();
        Self::stack(&refs)
    }

    /// Build a set from an already concatenated matrix.
    ///
    /// `lengths` must be non-empty, positive, and sum to `data.nrows()`.
    pub fn from_parts(data: DMatrix<f64>, lengths: Vec<usize>) -> Result<Self, DataError> {
        if lengths.is_empty() {
            return Err(DataError::Empty);
        }
        if data.ncols() == 0 {
            return Err(DataError::NoFeatures);
        }
        if let Some(index) = lengths.iter().position(|&len| len == 0) {
            return Err(DataError::EmptySequence { index });
        }
        let total: usize = lengths.iter().sum();
        if total != data.nrows() {
            return Err(DataError::Ragged {
                expected: data.nrows(),
                got: total,
            });
        }
        Ok(Self { data, lengths })
    }

    fn stack(sequences: &[&Sequence]) -> Result<Self, DataError> {
        let Some(first) = sequences.first() else {
            return Err(DataError::Empty);
        };
        let n_features = first.first().map(|frame| frame.len()).unwrap_or(0);
        if n_features == 0 {
            return Err(if first.is_empty() {
                DataError::EmptySequence { index: 0 }
            } else {
                DataError::NoFeatures
            });
        }

        let mut lengths = Vec::with_capacity(sequences.len());
        let mut flat = Vec::new();
        for (index, seq) in sequences.iter().enumerate() {
            if seq.is_empty() {
                return Err(DataError::EmptySequence { index });
            }
            for frame in seq.iter() {
                if frame.len() != n_features {
                    return Err(DataError::Ragged {
                        expected: n_features,
                        got: frame.len(),
                    });
                }
                flat.extend_from_slice(frame);
            }
            lengths.push(seq.len());
        }

        let n_rows = flat.len() / n_features;
        Ok(Self {
            data: DMatrix::from_row_slice(n_rows, n_features, &flat),
            lengths,
        })
    }

    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// Number of observation rows (frames), not sequences.
    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.data.ncols()
    }

    pub fn n_sequences(&self) -> usize {
        self.lengths.len()
    }

    /// `(start_row, length)` of every sequence, in order.
    pub fn spans(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.lengths.iter().scan(0usize, |start, &len| {
            let span = (*start, len);
            *start += len;
            Some(span)
        })
    }
}

/// Concatenate the sequences at `indices` (in the given order).
///
/// This is how cross-validation folds are materialized: fold boundaries are
/// over samples, and each partition is re-stacked for the trainer.
pub fn combine_sequences(indices: &[usize], sequences: &[Sequence]) -> Result<SequenceSet, DataError> {
    let mut picked = Vec::with_capacity(indices.len());
    for &index in indices {
        let seq = sequences.get(index).ok_or(DataError::IndexOutOfRange {
            index,
            len: sequences.len(),
        })?;
        picked.push(seq);
    }
    SequenceSet::stack(&picked)
}

/// All labels' training data, in list form and in concatenated form.
///
/// Labels are kept in sorted order so every sweep over "other labels" visits
/// them deterministically. A label may be present with zero sequences; it then
/// has no concatenated entry.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    sequences: BTreeMap<String, Vec<Sequence>>,
    concatenated: BTreeMap<String, SequenceSet>,
}

impl Corpus {
    pub fn from_sequences(sequences: BTreeMap<String, Vec<Sequence>>) -> Result<Self, DataError> {
        let mut concatenated = BTreeMap::new();
        for (label, seqs) in &sequences {
            if seqs.is_empty() {
                continue;
            }
            concatenated.insert(label.clone(), SequenceSet::from_sequences(seqs)?);
        }
        Ok(Self {
            sequences,
            concatenated,
        })
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.sequences.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn sequences(&self, label: &str) -> Option<&[Sequence]> {
        self.sequences.get(label).map(Vec::as_slice)
    }

    pub fn observations(&self, label: &str) -> Option<&SequenceSet> {
        self.concatenated.get(label)
    }

    /// Concatenated observations of every non-empty label.
    pub fn concatenated(&self) -> &BTreeMap<String, SequenceSet> {
        &self.concatenated
    }

    pub fn raw(&self) -> &BTreeMap<String, Vec<Sequence>> {
        &self.sequences
    }
}
