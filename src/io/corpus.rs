//! Read/write corpus JSON files.
//!
//! A corpus file maps each label to its sequences, each sequence being a list
//! of frames and each frame a list of feature values:
//!
//! ```json
//! { "FISH": [ [[0.1, 2.0], [0.3, 1.8]], [[0.0, 2.2]] ] }
//! ```
//!
//! Shape checks happen when the `Corpus` is built, not while parsing.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::domain::{Corpus, Sequence};
use crate::error::AppError;

/// Write a corpus JSON file.
pub fn write_corpus_json(path: &Path, corpus: &Corpus) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create corpus JSON '{}': {e}", path.display())))?;
    serde_json::to_writer(BufWriter::new(file), corpus.raw())
        .map_err(|e| AppError::new(2, format!("Failed to write corpus JSON: {e}")))?;
    Ok(())
}

/// Read and validate a corpus JSON file.
pub fn read_corpus_json(path: &Path) -> Result<Corpus, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open corpus JSON '{}': {e}", path.display())))?;
    let raw: BTreeMap<String, Vec<Sequence>> = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::new(2, format!("Invalid corpus JSON: {e}")))?;
    tracing::debug!(path = %path.display(), labels = raw.len(), "read corpus");
    Ok(Corpus::from_sequences(raw)?)
}
