//! `hmm-select` library crate.
//!
//! The binary (`hmmsel`) is a thin wrapper around this library so that:
//!
//! - selection logic is testable without spawning processes
//! - selectors can be embedded in a larger recognition pipeline with any
//!   `Trainer` implementation

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
pub mod select;
