//! Mathematical utilities: residual measures between aligned series.

pub mod residual;

pub use residual::*;
