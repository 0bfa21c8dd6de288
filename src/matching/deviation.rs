//! Deviation scores between every training series and every candidate series.
//!
//! For a pair `(t, c)` the score is `Σ_i (t_i - c_i)²` with rows aligned by
//! position. Positional alignment only makes sense on a shared grid, so both
//! tables must have the same row count *and* value-identical `x` columns; any
//! disagreement fails with `SchemaMismatch` before a single score is computed.

use std::collections::HashMap;

use log::{debug, info};
use rayon::prelude::*;

use crate::domain::{DeviationRecord, MatchConfig, SeriesTable};
use crate::error::{MatchError, Result};
use crate::math::sum_squared_deviation;

/// Score every `(training, candidate)` column pair with the default config.
pub fn compute_deviations(
    train: &SeriesTable,
    candidates: &SeriesTable,
) -> Result<Vec<DeviationRecord>> {
    compute_deviations_with(train, candidates, &MatchConfig::default())
}

/// Score every `(training, candidate)` column pair.
///
/// Records come back sorted by `train_name`, then `candidate_name`, whether or
/// not the pairs ran in parallel. A score that overflows to infinity fails with
/// `SchemaMismatch` naming the pair.
pub fn compute_deviations_with(
    train: &SeriesTable,
    candidates: &SeriesTable,
    config: &MatchConfig,
) -> Result<Vec<DeviationRecord>> {
    ensure_shared_grid(train, candidates)?;

    let n_cand = candidates.columns().len();
    let pairs: Vec<(usize, usize)> = (0..train.columns().len())
        .flat_map(|t| (0..n_cand).map(move |c| (t, c)))
        .collect();

    let score = |&(t, c): &(usize, usize)| -> Result<DeviationRecord> {
        let train_series = &train.columns()[t];
        let cand_series = &candidates.columns()[c];
        let sum_sq = sum_squared_deviation(&train_series.values, &cand_series.values)
            .ok_or_else(|| {
                MatchError::schema(
                    "deviation",
                    format!(
                        "'{}' and '{}' differ in length",
                        train_series.name, cand_series.name
                    ),
                )
            })?;
        if !sum_sq.is_finite() {
            return Err(MatchError::schema(
                "deviation",
                format!(
                    "deviation between '{}' and '{}' is not finite",
                    train_series.name, cand_series.name
                ),
            ));
        }
        Ok(DeviationRecord {
            train_name: train_series.name.clone(),
            candidate_name: cand_series.name.clone(),
            sum_sq_deviation: sum_sq,
        })
    };

    let mut records: Vec<DeviationRecord> = if config.parallel {
        pairs.par_iter().map(&score).collect::<Result<_>>()?
    } else {
        pairs.iter().map(&score).collect::<Result<_>>()?
    };
    records.sort_by(|a, b| {
        (a.train_name.as_str(), a.candidate_name.as_str())
            .cmp(&(b.train_name.as_str(), b.candidate_name.as_str()))
    });

    info!(
        "Computed {} deviations ({} training x {} candidate series, {} rows)",
        records.len(),
        train.columns().len(),
        n_cand,
        train.len()
    );
    Ok(records)
}

/// Check that two tables share one grid: same row count and identical `x` values.
pub fn ensure_shared_grid(train: &SeriesTable, candidates: &SeriesTable) -> Result<()> {
    if train.len() != candidates.len() {
        return Err(MatchError::schema(
            "deviation",
            format!(
                "training table has {} rows but candidate table has {}",
                train.len(),
                candidates.len()
            ),
        ));
    }

    let mismatch = train
        .x()
        .iter()
        .zip(candidates.x())
        .position(|(a, b)| a != b);
    if let Some(row) = mismatch {
        debug!(
            "Grid mismatch at row {row}: train x={} candidate x={}",
            train.x()[row],
            candidates.x()[row]
        );
        return Err(MatchError::schema(
            "deviation",
            format!(
                "x grids differ at row {row} ({} vs {})",
                train.x()[row],
                candidates.x()[row]
            ),
        ));
    }

    Ok(())
}

/// Dense `(train_name, candidate_name) -> score` view over a deviation set.
#[derive(Debug, Clone)]
pub struct DeviationMatrix {
    records: Vec<DeviationRecord>,
    index: HashMap<(String, String), usize>,
}

impl DeviationMatrix {
    /// Index a record set; a repeated `(train, candidate)` pair is a `KeyLookup` error.
    pub fn from_records(records: Vec<DeviationRecord>) -> Result<Self> {
        let mut index = HashMap::with_capacity(records.len());
        for (i, r) in records.iter().enumerate() {
            let key = (r.train_name.clone(), r.candidate_name.clone());
            if index.insert(key, i).is_some() {
                return Err(MatchError::KeyLookup(format!(
                    "duplicate deviation record for ('{}', '{}')",
                    r.train_name, r.candidate_name
                )));
            }
        }
        Ok(Self { records, index })
    }

    pub fn get(&self, train_name: &str, candidate_name: &str) -> Option<f64> {
        self.index
            .get(&(train_name.to_string(), candidate_name.to_string()))
            .map(|&i| self.records[i].sum_sq_deviation)
    }

    /// All records for one training series, in record order.
    pub fn row<'a>(
        &'a self,
        train_name: &'a str,
    ) -> impl Iterator<Item = &'a DeviationRecord> + 'a {
        self.records.iter().filter(move |r| r.train_name == train_name)
    }

    pub fn records(&self) -> &[DeviationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
