//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input tables (`Series`, `SeriesTable`) and test observations (`TestPoint`)
//! - stage outputs (`DeviationRecord`, `BestMatch`, `ClassifiedPoint`)
//! - run settings (`MatchConfig`)

pub mod types;

pub use types::*;
