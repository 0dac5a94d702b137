// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Consumer Harm Simulation Suite - Distribution Specifications

//! Distribution families and their parameter domains.
//!
//! Callers describe a distribution with a tag-based [`DistributionSpec`]
//! (the shape found in JSON parameter files). Parsing it yields a typed
//! [`Distribution`] whose parameters have been checked against the family's
//! domain, so nothing downstream of parsing needs to re-validate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

// ─── Family Tags ────────────────────────────────────────────────────────────

/// Recognized distribution family tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Normal,
    Uniform,
    Triangular,
    LogNormal,
    Constant,
    Event,
}

impl Family {
    pub const ALL: [Family; 6] = [
        Family::Normal,
        Family::Uniform,
        Family::Triangular,
        Family::LogNormal,
        Family::Constant,
        Family::Event,
    ];

    /// Resolve a tag. Matching ignores ASCII case and surrounding whitespace.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.tag().eq_ignore_ascii_case(tag))
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Uniform => "uniform",
            Self::Triangular => "triangular",
            Self::LogNormal => "lognormal",
            Self::Constant => "constant",
            Self::Event => "event",
        }
    }

    /// Numeric parameter names, in the order they are documented.
    pub fn param_names(&self) -> &'static [&'static str] {
        match self {
            Self::Normal => &["mean", "std_dev"],
            Self::Uniform => &["low", "high"],
            Self::Triangular => &["low", "mode", "high"],
            Self::LogNormal => &["mu", "sigma"],
            Self::Constant => &["value"],
            Self::Event => &[],
        }
    }
}

// ─── Raw Specification ──────────────────────────────────────────────────────

/// Caller-supplied, unvalidated description of a distribution.
///
/// ```json
/// { "family": "triangular", "params": { "low": 0, "mode": 375, "high": 1100 } }
/// { "family": "event",
///   "triggers": [ { "family": "triangular", "params": { "low": 0.15, "mode": 0.3, "high": 0.45 } } ],
///   "severity": { "family": "constant", "params": { "value": 1000 } } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSpec {
    pub family: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<DistributionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Box<DistributionSpec>>,
}

impl DistributionSpec {
    fn with_params(family: Family, values: &[f64]) -> Self {
        let params = family
            .param_names()
            .iter()
            .zip(values)
            .map(|(name, v)| (name.to_string(), *v))
            .collect();
        Self {
            family: family.tag().to_string(),
            params,
            triggers: Vec::new(),
            severity: None,
        }
    }

    pub fn normal(mean: f64, std_dev: f64) -> Self {
        Self::with_params(Family::Normal, &[mean, std_dev])
    }

    pub fn uniform(low: f64, high: f64) -> Self {
        Self::with_params(Family::Uniform, &[low, high])
    }

    pub fn triangular(low: f64, mode: f64, high: f64) -> Self {
        Self::with_params(Family::Triangular, &[low, mode, high])
    }

    pub fn lognormal(mu: f64, sigma: f64) -> Self {
        Self::with_params(Family::LogNormal, &[mu, sigma])
    }

    pub fn constant(value: f64) -> Self {
        Self::with_params(Family::Constant, &[value])
    }

    pub fn event(triggers: Vec<DistributionSpec>, severity: DistributionSpec) -> Self {
        Self {
            family: Family::Event.tag().to_string(),
            params: BTreeMap::new(),
            triggers,
            severity: Some(Box::new(severity)),
        }
    }

    /// Parse and validate. `owner` names the component (or scenario
    /// override) for error reporting.
    pub fn parse(&self, owner: &str) -> Result<Distribution> {
        let family = Family::from_tag(&self.family).ok_or_else(|| {
            SimulationError::UnsupportedDistribution {
                component: owner.to_string(),
                family: self.family.clone(),
            }
        })?;

        if let Some(unknown) = self
            .params
            .keys()
            .find(|k| !family.param_names().contains(&k.as_str()))
        {
            return Err(SimulationError::invalid(
                format!("{owner}.{unknown}"),
                format!("not a parameter of the {} family", family.tag()),
            ));
        }
        if family != Family::Event && (!self.triggers.is_empty() || self.severity.is_some()) {
            return Err(SimulationError::invalid(
                owner,
                format!("the {} family takes no triggers or severity", family.tag()),
            ));
        }

        let get = |name: &str| -> Result<f64> {
            let v = self.params.get(name).copied().ok_or_else(|| {
                SimulationError::invalid(format!("{owner}.{name}"), "missing")
            })?;
            if !v.is_finite() {
                return Err(SimulationError::invalid(
                    format!("{owner}.{name}"),
                    "must be finite",
                ));
            }
            Ok(v)
        };

        let dist = match family {
            Family::Normal => Distribution::Normal {
                mean: get("mean")?,
                std_dev: get("std_dev")?,
            },
            Family::Uniform => Distribution::Uniform {
                low: get("low")?,
                high: get("high")?,
            },
            Family::Triangular => Distribution::Triangular {
                low: get("low")?,
                mode: get("mode")?,
                high: get("high")?,
            },
            Family::LogNormal => Distribution::LogNormal {
                mu: get("mu")?,
                sigma: get("sigma")?,
            },
            Family::Constant => Distribution::Constant {
                value: get("value")?,
            },
            Family::Event => {
                let triggers = self
                    .triggers
                    .iter()
                    .enumerate()
                    .map(|(i, t)| t.parse(&format!("{owner}.triggers[{i}]")))
                    .collect::<Result<Vec<_>>>()?;
                let severity = self
                    .severity
                    .as_ref()
                    .ok_or_else(|| {
                        SimulationError::invalid(format!("{owner}.severity"), "missing")
                    })?
                    .parse(&format!("{owner}.severity"))?;
                Distribution::Event {
                    triggers,
                    severity: Box::new(severity),
                }
            }
        };
        dist.validate(owner)?;
        Ok(dist)
    }
}

// ─── Typed Distribution ─────────────────────────────────────────────────────

/// A distribution whose parameters satisfy its family's domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Distribution {
    Normal { mean: f64, std_dev: f64 },
    Uniform { low: f64, high: f64 },
    /// Requires `low <= mode <= high` and `low < high`.
    Triangular { low: f64, mode: f64, high: f64 },
    /// `mu` and `sigma` parameterize the underlying normal.
    #[serde(rename = "lognormal")]
    LogNormal { mu: f64, sigma: f64 },
    Constant { value: f64 },
    /// Yields `severity` when every trigger fires, otherwise zero. Each
    /// trigger is a distribution over a probability.
    Event {
        triggers: Vec<Distribution>,
        severity: Box<Distribution>,
    },
}

impl Distribution {
    pub fn family(&self) -> Family {
        match self {
            Self::Normal { .. } => Family::Normal,
            Self::Uniform { .. } => Family::Uniform,
            Self::Triangular { .. } => Family::Triangular,
            Self::LogNormal { .. } => Family::LogNormal,
            Self::Constant { .. } => Family::Constant,
            Self::Event { .. } => Family::Event,
        }
    }

    /// Check parameters against the family's domain.
    pub fn validate(&self, owner: &str) -> Result<()> {
        match self {
            Self::Normal { std_dev, .. } => {
                if *std_dev < 0.0 {
                    return Err(SimulationError::invalid(
                        format!("{owner}.std_dev"),
                        format!("must be >= 0, got {std_dev}"),
                    ));
                }
            }
            Self::Uniform { low, high } => {
                if low >= high {
                    return Err(SimulationError::invalid(
                        owner,
                        format!("uniform requires low < high, got low={low} high={high}"),
                    ));
                }
                check_width(owner, "uniform", *low, *high)?;
            }
            Self::Triangular { low, mode, high } => {
                if low >= high {
                    return Err(SimulationError::invalid(
                        owner,
                        format!("triangular requires low < high, got low={low} high={high}"),
                    ));
                }
                check_width(owner, "triangular", *low, *high)?;
                if mode < low || mode > high {
                    return Err(SimulationError::invalid(
                        format!("{owner}.mode"),
                        format!("must lie in [{low}, {high}], got {mode}"),
                    ));
                }
            }
            Self::LogNormal { sigma, .. } => {
                if *sigma < 0.0 {
                    return Err(SimulationError::invalid(
                        format!("{owner}.sigma"),
                        format!("must be >= 0, got {sigma}"),
                    ));
                }
            }
            Self::Constant { .. } => {}
            Self::Event { triggers, severity } => {
                if triggers.is_empty() {
                    return Err(SimulationError::invalid(
                        format!("{owner}.triggers"),
                        "an event needs at least one trigger",
                    ));
                }
                for (i, trigger) in triggers.iter().enumerate() {
                    let field = format!("{owner}.triggers[{i}]");
                    trigger.validate(&field)?;
                    let (lo, hi) = trigger.support();
                    if lo < 0.0 || hi > 1.0 {
                        return Err(SimulationError::invalid(
                            field,
                            format!("trigger probability support [{lo}, {hi}] leaves [0, 1]"),
                        ));
                    }
                }
                severity.validate(&format!("{owner}.severity"))?;
            }
        }
        Ok(())
    }

    /// Closed interval containing every value the distribution can produce.
    pub fn support(&self) -> (f64, f64) {
        match self {
            Self::Normal { mean, std_dev } => {
                if *std_dev == 0.0 {
                    (*mean, *mean)
                } else {
                    (f64::NEG_INFINITY, f64::INFINITY)
                }
            }
            Self::Uniform { low, high } => (*low, *high),
            Self::Triangular { low, high, .. } => (*low, *high),
            Self::LogNormal { mu, sigma } => {
                if *sigma == 0.0 {
                    (mu.exp(), mu.exp())
                } else {
                    (0.0, f64::INFINITY)
                }
            }
            Self::Constant { value } => (*value, *value),
            Self::Event { severity, .. } => {
                let (lo, hi) = severity.support();
                (lo.min(0.0), hi.max(0.0))
            }
        }
    }

    /// Analytic expectation.
    pub fn expected_value(&self) -> f64 {
        match self {
            Self::Normal { mean, .. } => *mean,
            Self::Uniform { low, high } => (low + high) / 2.0,
            Self::Triangular { low, mode, high } => (low + mode + high) / 3.0,
            Self::LogNormal { mu, sigma } => (mu + sigma * sigma / 2.0).exp(),
            Self::Constant { value } => *value,
            Self::Event { triggers, severity } => {
                triggers.iter().map(|t| t.expected_value()).product::<f64>()
                    * severity.expected_value()
            }
        }
    }
}

/// `high - low` must itself be finite or the bounded samplers overflow.
fn check_width(owner: &str, family: &str, low: f64, high: f64) -> Result<()> {
    if (high - low).is_finite() {
        Ok(())
    } else {
        Err(SimulationError::invalid(
            owner,
            format!("{family} range [{low}, {high}] is too wide to sample"),
        ))
    }
}

// ===========================================================================
// Tests
// ===========================================================================
