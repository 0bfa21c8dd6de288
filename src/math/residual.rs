//! Point-wise residual measures between two equally sized series.
//!
//! Both measures work on the difference vector `d = a - b`:
//!
//! - sum of squares: `Σ d_i²` (the selection score)
//! - max absolute: `max |d_i|` (the classification tolerance base)
//!
//! The max is not recoverable from the sum of squares, so it is always computed
//! from the raw vectors.

use nalgebra::DVector;

/// Difference vector `a - b`, or `None` if the lengths disagree.
pub fn difference(a: &[f64], b: &[f64]) -> Option<DVector<f64>> {
    if a.len() != b.len() {
        return None;
    }
    Some(DVector::from_column_slice(a) - DVector::from_column_slice(b))
}

/// `Σ (a_i - b_i)²`.
pub fn sum_squared_deviation(a: &[f64], b: &[f64]) -> Option<f64> {
    difference(a, b).map(|d| d.norm_squared())
}

/// `max |a_i - b_i|`; zero for empty series.
pub fn max_abs_deviation(a: &[f64], b: &[f64]) -> Option<f64> {
    let d = difference(a, b)?;
    if d.is_empty() {
        return Some(0.0);
    }
    Some(d.amax())
}
