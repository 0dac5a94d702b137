// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Consumer Harm Simulation Suite - Aggregator

//! Reduces a scenario's trial records to summary statistics.
//!
//! Records are treated as an unordered multiset: trial order has no effect
//! on any figure produced here.
//!
//! # Percentiles
//!
//! Every percentile uses linear interpolation between order statistics
//! (Hyndman & Fan type 7). For sorted values `x[0..n]` and level `q` in
//! `[0, 1]`, the rank is `h = (n - 1) * q` and the result is
//! `x[⌊h⌋] + (h - ⌊h⌋) * (x[⌊h⌋ + 1] - x[⌊h⌋])`.

use serde::Serialize;
use tracing::debug;

use crate::engine::TrialRecord;
use crate::error::{Result, SimulationError};
use crate::params::{SimulationParameters, DEFAULT_HARM_THRESHOLDS};

/// Percentile levels (in percent) reported for every scenario.
pub const PERCENTILE_LEVELS: [f64; 11] =
    [1.0, 5.0, 10.0, 25.0, 50.0, 75.0, 80.0, 85.0, 90.0, 95.0, 99.0];

/// z-score of the two-sided 95% confidence interval.
const Z_95: f64 = 1.96;

// ─── Basic Statistics ───────────────────────────────────────────────────────

/// Moments and range of one sample set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator); 0 for a single value.
    pub std_dev: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self { mean: 0.0, std_dev: 0.0, ci_lower: 0.0, ci_upper: 0.0, min: 0.0, max: 0.0, n: 0 };
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        let std_dev = variance.sqrt();
        let stderr = std_dev / (n as f64).sqrt();
        Self {
            mean,
            std_dev,
            ci_lower: mean - Z_95 * stderr,
            ci_upper: mean + Z_95 * stderr,
            min: samples.iter().cloned().fold(f64::INFINITY, f64::min),
            max: samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            n,
        }
    }
}

/// Percentile of already-sorted values, `q` in `[0, 1]`. `None` when empty.
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let h = (n - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = (h.floor() as usize).min(n - 1);
    let hi = (lo + 1).min(n - 1);
    let frac = h - lo as f64;
    let (a, b) = (sorted[lo], sorted[hi]);
    // Rounding in the interpolation may overshoot its segment by an ulp.
    Some((a + frac * (b - a)).max(a).min(b))
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Pearson correlation; `None` when either side has zero variance.
fn pearson(x: &[f64], y: &[f64], x_mean: f64, y_mean: f64) -> Option<f64> {
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

// ─── Summary Types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentileValue {
    /// Level in percent, e.g. `95.0`.
    pub level: f64,
    pub value: f64,
}

/// Trials whose total harm is strictly above a threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exceedance {
    pub threshold: f64,
    pub count: usize,
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentBreakdown {
    pub name: String,
    pub weight: f64,
    /// Moments of the sampled component value.
    pub stats: Stats,
    pub median: f64,
    /// `weight * mean`: the component's mean contribution to total harm.
    pub contribution: f64,
    /// Contribution as a fraction of mean total harm. `None` when mean total
    /// harm is zero.
    pub share_of_total: Option<f64>,
    /// Trials in which the component value was positive.
    pub affected: usize,
}

impl ComponentBreakdown {
    pub fn mean(&self) -> f64 {
        self.stats.mean
    }
}

/// Pearson correlations between component values and total harm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == a)?;
        let j = self.labels.iter().position(|l| l == b)?;
        self.values[i][j]
    }
}

/// Per-trial harm scaled to a yearly, industry-wide figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualImpact {
    pub volume: f64,
    pub mean: f64,
    pub p95: f64,
}

/// Summary of one scenario's trial records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioStatistics {
    pub scenario: String,
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// 95% confidence interval of the mean.
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub median: f64,
    pub percentiles: Vec<PercentileValue>,
    pub zero_harm: usize,
    pub exceedances: Vec<Exceedance>,
    pub components: Vec<ComponentBreakdown>,
    pub correlation: CorrelationMatrix,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_impact: Option<AnnualImpact>,
}

impl ScenarioStatistics {
    /// Value at one of [`PERCENTILE_LEVELS`].
    pub fn percentile(&self, level: f64) -> Option<f64> {
        self.percentiles
            .iter()
            .find(|p| p.level == level)
            .map(|p| p.value)
    }

    pub fn component(&self, name: &str) -> Option<&ComponentBreakdown> {
        self.components.iter().find(|c| c.name == name)
    }
}

// ─── Aggregator ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOptions {
    pub harm_thresholds: Vec<f64>,
    pub annual_volume: Option<f64>,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            harm_thresholds: DEFAULT_HARM_THRESHOLDS.to_vec(),
            annual_volume: None,
        }
    }
}

impl SummaryOptions {
    pub fn from_params(params: &SimulationParameters) -> Self {
        Self {
            harm_thresholds: params.harm_thresholds().to_vec(),
            annual_volume: params.annual_volume(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    options: SummaryOptions,
}

impl Aggregator {
    pub fn new(options: SummaryOptions) -> Self {
        Self { options }
    }

    pub fn for_params(params: &SimulationParameters) -> Self {
        Self::new(SummaryOptions::from_params(params))
    }

    /// Summarize one scenario's records.
    ///
    /// Fails with `EmptyInput` on zero records and `InvalidParameter` when
    /// the records do not all share one scenario and one column layout.
    pub fn summarize(&self, records: &[TrialRecord]) -> Result<ScenarioStatistics> {
        let first = records.first().ok_or(SimulationError::EmptyInput)?;
        if let Some(stray) = records
            .iter()
            .find(|r| {
                r.scenario() != first.scenario()
                    || r.columns() != first.columns()
                    || r.weights() != first.weights()
            })
        {
            return Err(SimulationError::invalid(
                "records",
                format!(
                    "trial {} of `{}` does not belong with `{}`",
                    stray.trial(),
                    stray.scenario(),
                    first.scenario()
                ),
            ));
        }

        let n = records.len();
        let totals: Vec<f64> = records.iter().map(TrialRecord::total_harm).collect();
        let total_stats = Stats::from_samples(&totals);
        let sorted_totals = sorted_copy(&totals);
        let pct = |q: f64| percentile(&sorted_totals, q).unwrap_or(0.0);

        let percentiles = PERCENTILE_LEVELS
            .iter()
            .map(|&level| PercentileValue { level, value: pct(level / 100.0) })
            .collect();

        let exceedances = self
            .options
            .harm_thresholds
            .iter()
            .map(|&threshold| {
                let count = totals.iter().filter(|&&t| t > threshold).count();
                Exceedance { threshold, count, fraction: count as f64 / n as f64 }
            })
            .collect();

        let columns = first.columns();
        let component_values: Vec<Vec<f64>> = (0..columns.len())
            .map(|j| records.iter().map(|r| r.values()[j]).collect())
            .collect();

        let components = columns
            .iter()
            .zip(first.weights())
            .zip(&component_values)
            .map(|((name, &weight), values)| {
                let stats = Stats::from_samples(values);
                let contribution = weight * stats.mean;
                ComponentBreakdown {
                    name: name.clone(),
                    weight,
                    median: percentile(&sorted_copy(values), 0.5).unwrap_or(0.0),
                    contribution,
                    share_of_total: (total_stats.mean != 0.0)
                        .then(|| contribution / total_stats.mean),
                    affected: values.iter().filter(|&&v| v > 0.0).count(),
                    stats,
                }
            })
            .collect::<Vec<_>>();

        let correlation = {
            let mut labels: Vec<String> = columns.to_vec();
            labels.push("total_harm".to_string());
            let mut series: Vec<(&[f64], f64)> = component_values
                .iter()
                .zip(&components)
                .map(|(v, c)| (v.as_slice(), c.stats.mean))
                .collect();
            series.push((&totals, total_stats.mean));
            let values = series
                .iter()
                .map(|(x, xm)| {
                    series
                        .iter()
                        .map(|(y, ym)| pearson(x, y, *xm, *ym))
                        .collect()
                })
                .collect();
            CorrelationMatrix { labels, values }
        };

        let annual_impact = self.options.annual_volume.map(|volume| AnnualImpact {
            volume,
            mean: total_stats.mean * volume,
            p95: pct(0.95) * volume,
        });

        let stats = ScenarioStatistics {
            scenario: first.scenario().to_string(),
            count: n,
            mean: total_stats.mean,
            std_dev: total_stats.std_dev,
            min: total_stats.min,
            max: total_stats.max,
            ci_lower: total_stats.ci_lower,
            ci_upper: total_stats.ci_upper,
            median: pct(0.5),
            percentiles,
            zero_harm: totals.iter().filter(|&&t| t == 0.0).count(),
            exceedances,
            components,
            correlation,
            annual_impact,
        };
        debug!(
            scenario = %stats.scenario,
            count = stats.count,
            mean = stats.mean,
            p95 = pct(0.95),
            "summarized scenario"
        );
        Ok(stats)
    }
}

/// Summarize with default options: default exceedance thresholds, no
/// annual scaling. Component weights travel with the records.
pub fn summarize(records: &[TrialRecord]) -> Result<ScenarioStatistics> {
    Aggregator::default().summarize(records)
}
