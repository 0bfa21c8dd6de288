//! Curve matching stages.
//!
//! Responsibilities:
//!
//! - score every training/candidate pair by sum of squared deviations (parallel)
//! - select the minimum-deviation candidate per training series
//! - classify test points against the selected candidates by tolerance band

pub mod classify;
pub mod deviation;
pub mod selection;

pub use classify::*;
pub use deviation::*;
pub use selection::*;
