//! Input/output helpers.
//!
//! - corpus JSON read/write (`corpus`)
//! - selection report export (`export`)

pub mod corpus;
pub mod export;

pub use corpus::*;
pub use export::*;
