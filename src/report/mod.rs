//! Reporting utilities: read-only views over a run's outputs.
//!
//! Nothing here reorders or mutates the pipeline outputs; downstream consumers
//! (plotting, storage) rely on the classified point order.

use serde::Serialize;

use crate::domain::ClassifiedPoint;
use crate::pipeline::RunOutput;

/// Classified points that share a candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateGroup<'a> {
    pub candidate_name: &'a str,
    pub train_name: &'a str,
    pub points: Vec<&'a ClassifiedPoint>,
}

/// Headline counts for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub deviations: usize,
    pub best_matches: usize,
    pub test_points: usize,
    pub classified: usize,
    pub dropped: usize,
}

/// Group classified points by candidate.
///
/// Groups appear in order of each candidate's first point; points keep their
/// original relative order within a group.
pub fn group_by_candidate(points: &[ClassifiedPoint]) -> Vec<CandidateGroup<'_>> {
    let mut groups: Vec<CandidateGroup<'_>> = Vec::new();
    for p in points {
        match groups.iter_mut().find(|g| g.candidate_name == p.candidate_name) {
            Some(g) => g.points.push(p),
            None => groups.push(CandidateGroup {
                candidate_name: &p.candidate_name,
                train_name: &p.train_name,
                points: vec![p],
            }),
        }
    }
    groups
}

pub fn summarize(run: &RunOutput) -> RunSummary {
    RunSummary {
        deviations: run.deviations.len(),
        best_matches: run.best_matches.len(),
        test_points: run.test_points,
        classified: run.classified.len(),
        dropped: run.test_points.saturating_sub(run.classified.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cp(x: f64, cand: &str) -> ClassifiedPoint {
        ClassifiedPoint {
            x,
            y: 0.0,
            delta: 0.0,
            candidate_name: cand.into(),
            train_name: format!("t_{cand}"),
        }
    }

    #[test]
    fn groups_keep_first_appearance_and_point_order() {
        let points = vec![cp(1.0, "b"), cp(2.0, "a"), cp(3.0, "b"), cp(4.0, "a")];
        let groups = group_by_candidate(&points);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].candidate_name, "b");
        assert_eq!(groups[0].train_name, "t_b");
        let xs: Vec<f64> = groups[0].points.iter().map(|p| p.x).collect();
        assert_eq!(xs, [1.0, 3.0]);
        assert_eq!(groups[1].candidate_name, "a");
    }

    #[test]
    fn summary_counts_dropped_points() {
        let run = RunOutput {
            deviations: Vec::new(),
            best_matches: Vec::new(),
            classified: vec![cp(1.0, "a")],
            test_points: 4,
        };
        let s = summarize(&run);
        assert_eq!(s.classified, 1);
        assert_eq!(s.dropped, 3);
    }
}
