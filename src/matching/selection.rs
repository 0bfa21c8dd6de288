//! Best-candidate selection per training series.
//!
//! Selection rules:
//! 1. Reject malformed record sets up front (`KeyLookup`), including records that
//!    name a series absent from the live tables, whether or not they would win
//! 2. Per training series, choose the candidate with minimum sum of squares
//! 3. Exact ties go to the candidate listed first in the candidate table
//! 4. Resolve every winner against the live tables (`MissingColumn` if absent)
//! 5. Recompute the winner's max absolute deviation from the raw columns

use std::collections::HashSet;

use log::{debug, info};

use crate::domain::{BestMatch, DeviationRecord, SeriesTable};
use crate::error::{MatchError, Result};
use crate::math::max_abs_deviation;

#[derive(Debug, Clone)]
struct Winner<'a> {
    train_name: &'a str,
    candidate_name: &'a str,
    candidate_rank: usize,
    sum_sq: f64,
}

/// Select one `BestMatch` per training series present in `records`.
///
/// Output is ordered by the training table's column order.
pub fn select_best_matches(
    records: &[DeviationRecord],
    train: &SeriesTable,
    candidates: &SeriesTable,
) -> Result<Vec<BestMatch>> {
    validate_records(records, train, candidates)?;

    // Group in first-appearance order; candidate rank drives the tie-break.
    let mut winners: Vec<Winner<'_>> = Vec::new();
    for r in records {
        let rank = candidates.column_index(&r.candidate_name).unwrap_or(usize::MAX);
        let challenger = Winner {
            train_name: &r.train_name,
            candidate_name: &r.candidate_name,
            candidate_rank: rank,
            sum_sq: r.sum_sq_deviation,
        };

        match winners.iter_mut().find(|w| w.train_name == r.train_name) {
            Some(current) => {
                let better = challenger.sum_sq < current.sum_sq
                    || (challenger.sum_sq == current.sum_sq
                        && challenger.candidate_rank < current.candidate_rank);
                if better {
                    *current = challenger;
                }
            }
            None => winners.push(challenger),
        }
    }

    let mut matches = Vec::with_capacity(winners.len());
    for w in &winners {
        let train_series = train
            .column(w.train_name)
            .ok_or_else(|| MatchError::missing("training", w.train_name))?;
        let cand_series = candidates
            .column(w.candidate_name)
            .ok_or_else(|| MatchError::missing("candidate", w.candidate_name))?;

        let max_abs = max_abs_deviation(&train_series.values, &cand_series.values).ok_or_else(|| {
            MatchError::schema(
                "selection",
                format!(
                    "'{}' has {} rows but '{}' has {}",
                    w.train_name,
                    train_series.values.len(),
                    w.candidate_name,
                    cand_series.values.len()
                ),
            )
        })?;

        debug!(
            "Selected '{}' for '{}' (sse={:.6}, max_abs={:.6})",
            w.candidate_name, w.train_name, w.sum_sq, max_abs
        );

        matches.push(BestMatch {
            train_name: w.train_name.to_string(),
            candidate_name: w.candidate_name.to_string(),
            sum_sq_deviation: w.sum_sq,
            max_abs_deviation: max_abs,
        });
    }

    // Every train name was resolved above, so the index lookup cannot miss.
    matches.sort_by_key(|m| train.column_index(&m.train_name).unwrap_or(usize::MAX));

    info!("Selected {} best matches from {} deviation records", matches.len(), records.len());
    Ok(matches)
}

/// Parse an externally supplied deviation set.
///
/// Missing fields or wrong types surface as `KeyLookup`, straight from the
/// deserializer.
pub fn parse_deviation_records(json: &str) -> Result<Vec<DeviationRecord>> {
    serde_json::from_str(json)
        .map_err(|e| MatchError::KeyLookup(format!("malformed deviation set: {e}")))
}

fn validate_records(
    records: &[DeviationRecord],
    train: &SeriesTable,
    candidates: &SeriesTable,
) -> Result<()> {
    // Duplicate pairs make the minimum ambiguous.
    let mut seen: HashSet<(&str, &str)> = HashSet::with_capacity(records.len());

    for (i, r) in records.iter().enumerate() {
        if r.train_name.is_empty() || r.candidate_name.is_empty() {
            return Err(MatchError::KeyLookup(format!("record {i} has an empty series name")));
        }
        if !(r.sum_sq_deviation.is_finite() && r.sum_sq_deviation >= 0.0) {
            return Err(MatchError::KeyLookup(format!(
                "record {i} ('{}', '{}') has invalid deviation {}",
                r.train_name, r.candidate_name, r.sum_sq_deviation
            )));
        }
        if !train.contains(&r.train_name) {
            return Err(MatchError::KeyLookup(format!(
                "record {i} names unknown training series '{}'",
                r.train_name
            )));
        }
        if !candidates.contains(&r.candidate_name) {
            return Err(MatchError::KeyLookup(format!(
                "record {i} names unknown candidate series '{}'",
                r.candidate_name
            )));
        }
        if !seen.insert((r.train_name.as_str(), r.candidate_name.as_str())) {
            return Err(MatchError::KeyLookup(format!(
                "duplicate deviation record for ('{}', '{}')",
                r.train_name, r.candidate_name
            )));
        }
    }

    Ok(())
}
