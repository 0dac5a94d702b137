// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Consumer Harm Simulation Suite - Cost-Benefit Analysis

//! Annual consumer benefit of each policy against its implementation cost.
//!
//! Harm statistics are computed in `f64`; money leaves this module as
//! `rust_decimal::Decimal` rounded to cents.

use std::collections::BTreeMap;

use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use crate::error::{Result, SimulationError};
use crate::stats::ScenarioStatistics;

/// Decimal places kept for money.
const MONEY_DP: u32 = 2;
/// Decimal places kept for ROI ratios.
const RATIO_DP: u32 = 6;

/// Convert an `f64` amount to money, failing on NaN/infinite/out-of-range.
pub fn to_money(field: &str, v: f64) -> Result<Decimal> {
    Decimal::from_f64(v)
        .map(|d| d.round_dp(MONEY_DP))
        .ok_or_else(|| SimulationError::invalid(field, format!("{v} is not representable as money")))
}

/// Convert money back to `f64` for display or charting.
pub fn from_money(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// One scenario's money figures. A figure is `None` when it falls outside
/// the `Decimal` range; the rest of the row and the run are unaffected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBenefit {
    pub scenario: String,
    /// Mean harm per transaction times annual volume.
    pub annual_impact: Option<Decimal>,
    /// Baseline annual impact minus this scenario's. Zero for the baseline.
    pub annual_benefit: Option<Decimal>,
    pub implementation_cost: Decimal,
    /// `annual_benefit - implementation_cost`.
    pub net_benefit: Option<Decimal>,
    /// `annual_benefit / implementation_cost - 1`; absent for a zero cost.
    pub roi: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

fn annual_impact(scenario: &str, mean: f64, annual_volume: f64) -> Option<Decimal> {
    match to_money("annual_impact", mean * annual_volume) {
        Ok(d) => Some(d),
        Err(e) => {
            warn!(scenario, error = %e, "annual impact left unset");
            None
        }
    }
}

/// Cost-benefit row for every summarized scenario, in input order.
///
/// Scenarios missing from `costs` are treated as costless. Only an unknown
/// baseline is an error.
pub fn evaluate(
    statistics: &[ScenarioStatistics],
    baseline: &str,
    costs: &BTreeMap<String, Decimal>,
    annual_volume: f64,
) -> Result<Vec<CostBenefit>> {
    let base = statistics
        .iter()
        .find(|s| s.scenario == baseline)
        .ok_or_else(|| SimulationError::UnknownBaseline(baseline.to_string()))?;
    let base_impact = annual_impact(&base.scenario, base.mean, annual_volume);

    Ok(statistics
        .iter()
        .map(|s| {
            let impact = if s.scenario == baseline {
                base_impact
            } else {
                annual_impact(&s.scenario, s.mean, annual_volume)
            };
            let annual_benefit = if s.scenario == baseline {
                Some(Decimal::ZERO)
            } else {
                base_impact
                    .zip(impact)
                    .and_then(|(b, i)| b.checked_sub(i))
            };
            let implementation_cost = costs.get(&s.scenario).copied().unwrap_or(Decimal::ZERO);
            let roi = if implementation_cost > Decimal::ZERO {
                annual_benefit
                    .and_then(|b| b.checked_div(implementation_cost))
                    .and_then(|r| r.checked_sub(Decimal::ONE))
                    .map(|r| r.round_dp(RATIO_DP))
            } else {
                None
            };
            CostBenefit {
                scenario: s.scenario.clone(),
                annual_impact: impact,
                annual_benefit,
                implementation_cost,
                net_benefit: annual_benefit.and_then(|b| b.checked_sub(implementation_cost)),
                roi,
            }
        })
        .collect())
}
