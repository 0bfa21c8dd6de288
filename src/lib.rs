//! `curve-matcher` library crate.
//!
//! Matches training curves against a library of candidate curves by least
//! squared deviation, then classifies held-out test points against the chosen
//! candidates with a tolerance band derived from the training fit.
//!
//! Reading the source tables and persisting the outputs are left to the caller:
//! every stage here is a pure function over in-memory values.

pub mod domain;
pub mod error;
pub mod math;
pub mod matching;
pub mod pipeline;
pub mod report;

pub use domain::{
    BestMatch, ClassifiedPoint, DeviationRecord, MatchConfig, Series, SeriesTable, TestPoint,
};
pub use error::{MatchError, Result};
pub use matching::{
    DeviationMatrix, classify_points, compute_deviations, compute_deviations_with,
    parse_deviation_records, select_best_matches, tolerance_for,
};
pub use pipeline::{RunOutput, run_matching};
