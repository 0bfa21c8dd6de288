//! Tolerance-based assignment of test points to selected candidates.
//!
//! A test point `(x, y)` is accepted by a match when
//!
//! ```text
//! |y - candidate(x)| <= max_abs_deviation * √2
//! ```
//!
//! Matches are tried in selection order (training column order) and the first
//! one that accepts the point wins; later matches are not examined even if
//! they would fit more tightly. A point no match accepts is dropped.
//!
//! `candidate(x)` is an exact grid lookup. Test points live on their own grid, so
//! an `x` that is not on the candidate grid simply skips the candidate.

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::domain::{BestMatch, ClassifiedPoint, MatchConfig, Series, SeriesTable, TestPoint};
use crate::error::{MatchError, Result};

/// Scale applied to the training error bound: independent training and test
/// errors of equal variance combine to `√(1² + 1²)`.
pub const TOLERANCE_FACTOR: f64 = std::f64::consts::SQRT_2;

/// Acceptance half-width for a match.
pub fn tolerance_for(best: &BestMatch) -> f64 {
    best.max_abs_deviation * TOLERANCE_FACTOR
}

struct Resolved<'a> {
    best: &'a BestMatch,
    candidate: &'a Series,
    tolerance: f64,
}

/// Assign each test point to the first match whose tolerance band contains it.
///
/// Output preserves test point order and contains only accepted points.
pub fn classify_points(
    candidates: &SeriesTable,
    train: &SeriesTable,
    best: &[BestMatch],
    points: &[TestPoint],
    config: &MatchConfig,
) -> Result<Vec<ClassifiedPoint>> {
    if config.require_matches && best.is_empty() {
        return Err(MatchError::EmptyInput("no best matches to classify against"));
    }
    if config.require_points && points.is_empty() {
        return Err(MatchError::EmptyInput("no test points to classify"));
    }

    let resolved = resolve_matches(candidates, train, best)?;

    let classify_one = |p: &TestPoint| -> Option<ClassifiedPoint> {
        // Candidates share one grid; once x is missing no candidate can accept.
        let row = candidates.row_of(p.x)?;

        resolved.iter().find_map(|r| {
            let cand_y = *r.candidate.values.get(row)?;
            let delta = p.y - cand_y;
            (delta.abs() <= r.tolerance).then(|| ClassifiedPoint {
                x: p.x,
                y: p.y,
                delta,
                candidate_name: r.best.candidate_name.clone(),
                train_name: r.best.train_name.clone(),
            })
        })
    };

    // Points are independent; candidates within a point stay sequential.
    let outcomes: Vec<Option<ClassifiedPoint>> = if config.parallel {
        points.par_iter().map(&classify_one).collect()
    } else {
        points.iter().map(&classify_one).collect()
    };
    let classified: Vec<ClassifiedPoint> = outcomes.into_iter().flatten().collect();

    let dropped = points.len() - classified.len();
    info!(
        "Classified {} of {} test points ({dropped} dropped)",
        classified.len(),
        points.len()
    );
    if classified.is_empty() && !points.is_empty() {
        warn!("No test point fell inside any candidate tolerance band");
    }

    if config.require_classified && classified.is_empty() {
        return Err(MatchError::EmptyInput("no test point was classified"));
    }

    Ok(classified)
}

fn resolve_matches<'a>(
    candidates: &'a SeriesTable,
    train: &SeriesTable,
    best: &'a [BestMatch],
) -> Result<Vec<Resolved<'a>>> {
    best.iter()
        .map(|m| {
            if !train.contains(&m.train_name) {
                return Err(MatchError::schema(
                    "classification",
                    format!("training column '{}' not found", m.train_name),
                ));
            }
            let candidate = candidates.column(&m.candidate_name).ok_or_else(|| {
                MatchError::schema(
                    "classification",
                    format!("candidate column '{}' not found", m.candidate_name),
                )
            })?;

            let tolerance = tolerance_for(m);
            debug!(
                "'{}' -> '{}': tolerance {:.6}",
                m.train_name, m.candidate_name, tolerance
            );
            Ok(Resolved {
                best: m,
                candidate,
                tolerance,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ideal() -> SeriesTable {
        SeriesTable::from_columns(
            vec![1.0, 2.0, 3.0],
            [
                ("y1", vec![2.0, 4.0, 6.0]),
                ("y2", vec![1.0, 2.0, 3.0]),
                ("y3", vec![0.0, 1.0, 2.0]),
            ],
        )
        .unwrap()
    }

    fn train() -> SeriesTable {
        ideal()
    }

    fn best(train: &str, cand: &str, max_abs: f64) -> BestMatch {
        BestMatch {
            train_name: train.into(),
            candidate_name: cand.into(),
            sum_sq_deviation: 0.0,
            max_abs_deviation: max_abs,
        }
    }

    #[test]
    fn exact_hit_with_zero_tolerance() {
        let out = classify_points(
            &ideal(),
            &train(),
            &[best("y1", "y1", 0.0)],
            &[TestPoint::new(1.0, 2.0)],
            &MatchConfig::default(),
        )
        .unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].delta, 0.0);
        assert_eq!(out[0].candidate_name, "y1");
        assert_eq!(out[0].train_name, "y1");
    }

    #[test]
    fn first_match_wins_over_tighter_fit() {
        // (2, 2.0): y1 gives delta -2 (within 2·√2), y2 gives delta 0.
        let matches = [best("y1", "y1", 2.0), best("y2", "y2", 1.0)];
        let out = classify_points(
            &ideal(),
            &train(),
            &matches,
            &[TestPoint::new(2.0, 2.0)],
            &MatchConfig::default(),
        )
        .unwrap();
        assert_eq!(out[0].candidate_name, "y1");
        assert!((out[0].delta + 2.0).abs() < 1e-12);
    }

    #[test]
    fn falls_through_to_later_match() {
        let matches = [best("y1", "y1", 0.1), best("y2", "y2", 0.1)];
        let out = classify_points(
            &ideal(),
            &train(),
            &matches,
            &[TestPoint::new(3.0, 3.05)],
            &MatchConfig::default(),
        )
        .unwrap();
        assert_eq!(out[0].candidate_name, "y2");
    }

    #[test]
    fn tolerance_is_scaled_by_sqrt_two() {
        let m = best("y1", "y1", 1.0);
        assert!((tolerance_for(&m) - 2f64.sqrt()).abs() < 1e-15);

        let cfg = MatchConfig::default();
        // 1.4 < √2 ≈ 1.41421 < 1.42
        let inside = classify_points(
            &ideal(),
            &train(),
            &[m.clone()],
            &[TestPoint::new(1.0, 3.4)],
            &cfg,
        )
        .unwrap();
        assert_eq!(inside.len(), 1);
        let outside = classify_points(
            &ideal(),
            &train(),
            &[m],
            &[TestPoint::new(1.0, 3.42)],
            &cfg,
        )
        .unwrap();
        assert!(outside.is_empty());
    }

    #[test]
    fn off_grid_point_is_dropped_without_error() {
        let out = classify_points(
            &ideal(),
            &train(),
            &[best("y1", "y1", 10.0)],
            &[TestPoint::new(7.5, 2.0)],
            &MatchConfig::default(),
        )
        .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn preserves_point_order() {
        let points = [
            TestPoint::new(3.0, 6.0),
            TestPoint::new(9.0, 0.0),
            TestPoint::new(1.0, 2.0),
            TestPoint::new(2.0, 4.0),
        ];
        let out = classify_points(
            &ideal(),
            &train(),
            &[best("y1", "y1", 0.0)],
            &points,
            &MatchConfig::default(),
        )
        .unwrap();
        let xs: Vec<f64> = out.iter().map(|p| p.x).collect();
        assert_eq!(xs, [3.0, 1.0, 2.0]);
    }

    #[test]
    fn unknown_columns_are_schema_errors() {
        let cfg = MatchConfig::default();
        let pts = [TestPoint::new(1.0, 2.0)];

        let err = classify_points(&ideal(), &train(), &[best("y1", "nope", 0.0)], &pts, &cfg)
            .unwrap_err();
        assert!(matches!(err, MatchError::SchemaMismatch { .. }));

        let err = classify_points(&ideal(), &train(), &[best("nope", "y1", 0.0)], &pts, &cfg)
            .unwrap_err();
        assert!(matches!(err, MatchError::SchemaMismatch { .. }));
    }

    #[test]
    fn empty_inputs_are_valid_unless_required() {
        let lenient = MatchConfig::default();
        assert!(classify_points(&ideal(), &train(), &[], &[TestPoint::new(1.0, 2.0)], &lenient)
            .unwrap()
            .is_empty());
        assert!(classify_points(&ideal(), &train(), &[best("y1", "y1", 0.0)], &[], &lenient)
            .unwrap()
            .is_empty());

        let strict = MatchConfig {
            require_matches: true,
            require_points: true,
            require_classified: true,
            ..MatchConfig::default()
        };
        let err = classify_points(&ideal(), &train(), &[], &[TestPoint::new(1.0, 2.0)], &strict)
            .unwrap_err();
        assert!(matches!(err, MatchError::EmptyInput(_)));
        let err = classify_points(&ideal(), &train(), &[best("y1", "y1", 0.0)], &[], &strict)
            .unwrap_err();
        assert!(matches!(err, MatchError::EmptyInput(_)));
        let err = classify_points(
            &ideal(),
            &train(),
            &[best("y1", "y1", 0.0)],
            &[TestPoint::new(1.0, 100.0)],
            &strict,
        )
        .unwrap_err();
        assert!(matches!(err, MatchError::EmptyInput(_)));
    }

    #[test]
    fn sequential_matches_parallel() {
        let matches = [best("y1", "y1", 0.5), best("y2", "y2", 0.5), best("y3", "y3", 0.5)];
        let points: Vec<TestPoint> = (0..60)
            .map(|i| TestPoint::new((i % 4) as f64, (i as f64) * 0.1))
            .collect();
        let par = classify_points(&ideal(), &train(), &matches, &points, &MatchConfig::default())
            .unwrap();
        let seq_cfg = MatchConfig {
            parallel: false,
            ..MatchConfig::default()
        };
        let seq = classify_points(&ideal(), &train(), &matches, &points, &seq_cfg).unwrap();
        assert_eq!(par, seq);
        for p in &par {
            assert!(p.delta.abs() <= 0.5 * TOLERANCE_FACTOR);
        }
    }
}
