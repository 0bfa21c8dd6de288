//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - built in memory by whatever loads the source tables
//! - passed between the deviation, selection and classification stages
//! - persisted verbatim by a downstream storage layer

use serde::{Deserialize, Serialize};

use crate::error::{MatchError, Result};

/// Name reserved for the shared grid column.
pub const X_COLUMN: &str = "x";

/// One named y-column aligned to its table's `x` grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// A shared `x` grid plus an ordered set of named y-columns.
///
/// Column order is preserved exactly as given: it decides tie-breaks during
/// selection and the order candidates are tried during classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesTable {
    x: Vec<f64>,
    columns: Vec<Series>,
}

impl SeriesTable {
    /// Build a table, validating its shape.
    ///
    /// Fails with `SchemaMismatch` if a column's length differs from the grid or a
    /// value is non-finite, and with `KeyLookup` if a name is empty, duplicated, or
    /// collides with the `x` column.
    pub fn new(x: Vec<f64>, columns: Vec<Series>) -> Result<Self> {
        if let Some(i) = x.iter().position(|v| !v.is_finite()) {
            return Err(MatchError::schema(
                "series table",
                format!("non-finite x value at row {i}"),
            ));
        }

        for (idx, series) in columns.iter().enumerate() {
            if series.name.trim().is_empty() {
                return Err(MatchError::KeyLookup(format!("column {idx} has an empty name")));
            }
            if series.name == X_COLUMN {
                return Err(MatchError::KeyLookup(format!(
                    "column {idx} uses the reserved name '{X_COLUMN}'"
                )));
            }
            if columns[..idx].iter().any(|s| s.name == series.name) {
                return Err(MatchError::KeyLookup(format!(
                    "duplicate column name '{}'",
                    series.name
                )));
            }
            if series.values.len() != x.len() {
                return Err(MatchError::schema(
                    "series table",
                    format!(
                        "column '{}' has {} rows but the x grid has {}",
                        series.name,
                        series.values.len(),
                        x.len()
                    ),
                ));
            }
            if let Some(i) = series.values.iter().position(|v| !v.is_finite()) {
                return Err(MatchError::schema(
                    "series table",
                    format!("column '{}' has a non-finite value at row {i}", series.name),
                ));
            }
        }

        Ok(Self { x, columns })
    }

    /// Convenience constructor from `(name, values)` pairs.
    pub fn from_columns<I, S>(x: Vec<f64>, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let columns = columns
            .into_iter()
            .map(|(name, values)| Series::new(name, values))
            .collect();
        Self::new(x, columns)
    }

    /// The shared grid.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Number of grid rows.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn columns(&self) -> &[Series] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|s| s.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&Series> {
        self.columns.iter().find(|s| s.name == name)
    }

    /// Position of a column in the table's original ordering.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// First row whose grid value equals `x` exactly.
    pub fn row_of(&self, x: f64) -> Option<usize> {
        self.x.iter().position(|&grid_x| grid_x == x)
    }

    /// Value of column `name` at `row_of(x)`.
    ///
    /// Returns `None` if the column or the grid value is absent.
    pub fn value_at(&self, name: &str, x: f64) -> Option<f64> {
        let series = self.column(name)?;
        series.values.get(self.row_of(x)?).copied()
    }
}

/// Sum of squared deviations between one training and one candidate series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationRecord {
    pub train_name: String,
    pub candidate_name: String,
    pub sum_sq_deviation: f64,
}

/// The candidate selected for one training series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestMatch {
    pub train_name: String,
    pub candidate_name: String,
    pub sum_sq_deviation: f64,
    /// Largest point-wise `|train - candidate|` over the training grid.
    pub max_abs_deviation: f64,
}

/// A held-out observation; its `x` need not lie on the training grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestPoint {
    pub x: f64,
    pub y: f64,
}

impl TestPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A test point accepted by a selected candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedPoint {
    pub x: f64,
    pub y: f64,
    /// `y - candidate_y(x)`.
    pub delta: f64,
    pub candidate_name: String,
    pub train_name: String,
}

/// Run settings for the matching pipeline.
///
/// The `require_*` flags turn an empty input or output into `EmptyInput`;
/// by default an empty result is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Fan per-pair and per-point work out over Rayon.
    pub parallel: bool,
    pub require_matches: bool,
    pub require_points: bool,
    pub require_classified: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            require_matches: false,
            require_points: false,
            require_classified: false,
        }
    }
}
