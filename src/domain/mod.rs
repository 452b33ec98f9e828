//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - selection configuration and selector choice (`SelectionConfig`, `SelectorKind`)
//! - observation containers (`Sequence`, `SequenceSet`)
//! - the per-label corpus (`Corpus`) and fold materialization (`combine_sequences`)

pub mod corpus;
pub mod types;

pub use corpus::*;
pub use types::*;
