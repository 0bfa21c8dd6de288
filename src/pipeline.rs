//! The full matching workflow in one call.
//!
//! deviations -> best-match selection -> test point classification
//!
//! Loading tables and persisting the outputs belong to the caller; this module
//! only chains the pure stages and hands back every intermediate result.

use log::info;
use serde::Serialize;

use crate::domain::{
    BestMatch, ClassifiedPoint, DeviationRecord, MatchConfig, SeriesTable, TestPoint,
};
use crate::error::Result;
use crate::matching::{classify_points, compute_deviations_with, select_best_matches};

/// All computed outputs of a single matching run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutput {
    pub deviations: Vec<DeviationRecord>,
    pub best_matches: Vec<BestMatch>,
    pub classified: Vec<ClassifiedPoint>,
    /// Number of test points fed to the classifier.
    pub test_points: usize,
}

/// Execute the matching pipeline.
///
/// Fails on the first stage error; no partial output is returned.
pub fn run_matching(
    train: &SeriesTable,
    candidates: &SeriesTable,
    points: &[TestPoint],
    config: &MatchConfig,
) -> Result<RunOutput> {
    // 1) Score every pair.
    let deviations = compute_deviations_with(train, candidates, config)?;

    // 2) Pick one candidate per training series.
    let best_matches = select_best_matches(&deviations, train, candidates)?;

    // 3) Assign test points.
    let classified = classify_points(candidates, train, &best_matches, points, config)?;

    info!(
        "Matching run complete: {} matches, {}/{} points classified",
        best_matches.len(),
        classified.len(),
        points.len()
    );

    Ok(RunOutput {
        deviations,
        best_matches,
        classified,
        test_points: points.len(),
    })
}
