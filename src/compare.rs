// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Consumer Harm Simulation Suite - Scenario Comparator

//! Deltas of every scenario against a baseline, and a ranking by mean harm.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::warn;

use crate::error::{Result, SimulationError};
use crate::stats::ScenarioStatistics;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Relative change against the baseline mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeChange {
    Defined(f64),
    /// The baseline mean is exactly zero.
    Undefined,
}

impl RelativeChange {
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Defined(v) => Some(*v),
            Self::Undefined => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioDelta {
    pub scenario: String,
    pub mean: f64,
    pub baseline_mean: f64,
    /// `mean - baseline_mean`.
    pub absolute_change: f64,
    /// `(mean - baseline_mean) / baseline_mean`.
    pub relative_change: RelativeChange,
    /// Difference of the 95th percentiles, when both sides report one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p95_change: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankEntry {
    /// 1 = least harmful.
    pub rank: usize,
    pub scenario: String,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub baseline: String,
    /// One entry per summarized scenario (the baseline included), in input
    /// order.
    pub deltas: Vec<ScenarioDelta>,
    /// Ascending by mean total harm; ties broken by scenario name.
    pub ranking: Vec<RankEntry>,
    /// Scenarios whose relative change could not be computed.
    pub undefined_ratios: Vec<String>,
}

impl ComparisonResult {
    pub fn delta(&self, scenario: &str) -> Option<&ScenarioDelta> {
        self.deltas.iter().find(|d| d.scenario == scenario)
    }
}

// ---------------------------------------------------------------------------
// Comparator
// ---------------------------------------------------------------------------

/// Compare every scenario against `baseline`.
///
/// A zero baseline mean does not abort the comparison: affected deltas carry
/// [`RelativeChange::Undefined`] and are listed in `undefined_ratios`.
pub fn compare(statistics: &[ScenarioStatistics], baseline: &str) -> Result<ComparisonResult> {
    let base = statistics
        .iter()
        .find(|s| s.scenario == baseline)
        .ok_or_else(|| SimulationError::UnknownBaseline(baseline.to_string()))?;
    let base_p95 = base.percentile(95.0);

    let mut undefined_ratios = Vec::new();
    let deltas = statistics
        .iter()
        .map(|s| {
            let absolute_change = s.mean - base.mean;
            let relative_change = if base.mean == 0.0 {
                warn!(
                    scenario = %s.scenario,
                    baseline,
                    "baseline mean harm is zero; relative change undefined"
                );
                undefined_ratios.push(s.scenario.clone());
                RelativeChange::Undefined
            } else {
                RelativeChange::Defined(absolute_change / base.mean)
            };
            ScenarioDelta {
                scenario: s.scenario.clone(),
                mean: s.mean,
                baseline_mean: base.mean,
                absolute_change,
                relative_change,
                p95_change: s.percentile(95.0).zip(base_p95).map(|(a, b)| a - b),
            }
        })
        .collect();

    Ok(ComparisonResult {
        baseline: baseline.to_string(),
        deltas,
        ranking: rank(statistics),
        undefined_ratios,
    })
}

/// Ascending by mean; equal means order by name.
pub fn rank(statistics: &[ScenarioStatistics]) -> Vec<RankEntry> {
    let mut order: Vec<&ScenarioStatistics> = statistics.iter().collect();
    order.sort_by(|a, b| match a.mean.total_cmp(&b.mean) {
        Ordering::Equal => a.scenario.cmp(&b.scenario),
        other => other,
    });
    order
        .into_iter()
        .enumerate()
        .map(|(i, s)| RankEntry {
            rank: i + 1,
            scenario: s.scenario.clone(),
            mean: s.mean,
        })
        .collect()
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{CorrelationMatrix, PercentileValue};

    fn stat(name: &str, mean: f64) -> ScenarioStatistics {
        ScenarioStatistics {
            scenario: name.to_string(),
            count: 10,
            mean,
            std_dev: 1.0,
            min: mean - 1.0,
            max: mean + 1.0,
            ci_lower: mean,
            ci_upper: mean,
            median: mean,
            percentiles: vec![PercentileValue { level: 95.0, value: mean + 0.5 }],
            zero_harm: 0,
            exceedances: Vec::new(),
            components: Vec::new(),
            correlation: CorrelationMatrix { labels: Vec::new(), values: Vec::new() },
            annual_impact: None,
        }
    }

    #[test]
    fn relative_and_absolute_change() {
        let stats = vec![stat("baseline", 10.0), stat("policy_A", 12.0), stat("policy_B", 5.0)];
        let result = compare(&stats, "baseline").unwrap();
        let a = result.delta("policy_A").unwrap();
        assert_eq!(a.absolute_change, 2.0);
        assert_eq!(a.relative_change, RelativeChange::Defined(0.2));
        assert_eq!(a.p95_change, Some(2.0));
        let b = result.delta("policy_B").unwrap();
        assert_eq!(b.relative_change, RelativeChange::Defined(-0.5));
        let base = result.delta("baseline").unwrap();
        assert_eq!(base.relative_change, RelativeChange::Defined(0.0));
        assert!(result.undefined_ratios.is_empty());
    }

    #[test]
    fn unknown_baseline() {
        let stats = vec![stat("baseline", 10.0)];
        assert_eq!(
            compare(&stats, "status_quo"),
            Err(SimulationError::UnknownBaseline("status_quo".into()))
        );
    }

    #[test]
    fn zero_baseline_marks_undefined_without_aborting() {
        let stats = vec![stat("baseline", 0.0), stat("policy_A", 3.0)];
        let result = compare(&stats, "baseline").unwrap();
        let a = result.delta("policy_A").unwrap();
        assert_eq!(a.absolute_change, 3.0);
        assert_eq!(a.relative_change, RelativeChange::Undefined);
        assert_eq!(a.relative_change.value(), None);
        assert_eq!(result.undefined_ratios, vec!["baseline", "policy_A"]);
        assert_eq!(result.ranking[0].scenario, "baseline");
    }

    #[test]
    fn ranking_ascending_with_name_tiebreak() {
        let stats = vec![
            stat("zeta", 5.0),
            stat("alpha", 5.0),
            stat("mid", 3.0),
            stat("high", 9.0),
        ];
        let ranking = rank(&stats);
        let names: Vec<_> = ranking.iter().map(|r| r.scenario.as_str()).collect();
        assert_eq!(names, vec!["mid", "alpha", "zeta", "high"]);
        assert_eq!(ranking.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3, 4]);

        let mut reversed = stats.clone();
        reversed.reverse();
        assert_eq!(rank(&reversed), ranking);
    }

    #[test]
    fn relative_change_serializes_with_marker() {
        assert_eq!(
            serde_json::to_string(&RelativeChange::Undefined).unwrap(),
            "\"undefined\""
        );
        assert_eq!(
            serde_json::to_string(&RelativeChange::Defined(0.5)).unwrap(),
            "{\"defined\":0.5}"
        );
    }
}
