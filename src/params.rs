// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Consumer Harm Simulation Suite - Parameter Model

//! Simulation inputs and their validation.
//!
//! [`ParameterConfig`] is the raw, serde-facing configuration surface.
//! [`SimulationParameters`] is the validated, immutable value every other
//! module consumes. Construction either succeeds completely or fails with
//! the first violation found; no randomness is touched on either path.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::distribution::{Distribution, DistributionSpec};
use crate::error::{Result, SimulationError};

/// Exceedance thresholds used when a configuration names none.
pub const DEFAULT_HARM_THRESHOLDS: [f64; 2] = [1000.0, 5000.0];

/// Column names of the raw trial feed that components may not take.
pub const RESERVED_COLUMNS: [&str; 3] = ["scenario", "trial", "total_harm"];

fn default_weight() -> f64 {
    1.0
}

fn default_thresholds() -> Vec<f64> {
    DEFAULT_HARM_THRESHOLDS.to_vec()
}

// ---------------------------------------------------------------------------
// Raw configuration
// ---------------------------------------------------------------------------

/// One harm component as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmComponentSpec {
    pub name: String,
    pub distribution: DistributionSpec,
    /// Multiplier applied when combining into total harm. A weight of zero
    /// records the component as an observed covariate only.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl HarmComponentSpec {
    pub fn new(name: impl Into<String>, distribution: DistributionSpec) -> Self {
        Self {
            name: name.into(),
            distribution,
            weight: default_weight(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// A named policy alternative. Components without an override keep their
/// declared distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, DistributionSpec>,
    /// One-off cost of putting the policy in place.
    #[serde(default)]
    pub implementation_cost: Decimal,
}

impl ScenarioSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            overrides: BTreeMap::new(),
            implementation_cost: Decimal::ZERO,
        }
    }

    pub fn with_override(mut self, component: impl Into<String>, dist: DistributionSpec) -> Self {
        self.overrides.insert(component.into(), dist);
        self
    }

    pub fn with_implementation_cost(mut self, cost: Decimal) -> Self {
        self.implementation_cost = cost;
        self
    }
}

/// Raw configuration surface (the JSON parameter file shape).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterConfig {
    /// Trials per scenario. Signed so that non-positive requests can be
    /// reported instead of failing to deserialize.
    pub trials: i64,
    /// `None` draws a fresh seed per run.
    #[serde(default)]
    pub seed: Option<u64>,
    pub components: Vec<HarmComponentSpec>,
    pub scenarios: Vec<ScenarioSpec>,
    /// Reference scenario for comparisons. Defaults to the first scenario.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<String>,
    /// Transactions per year, used to scale mean harm to an industry-wide
    /// annual figure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_volume: Option<f64>,
    #[serde(default = "default_thresholds")]
    pub harm_thresholds: Vec<f64>,
}

impl ParameterConfig {
    pub fn new(trials: i64) -> Self {
        Self {
            trials,
            seed: None,
            components: Vec::new(),
            scenarios: Vec::new(),
            baseline: None,
            annual_volume: None,
            harm_thresholds: default_thresholds(),
        }
    }

    pub fn validate(self) -> Result<SimulationParameters> {
        SimulationParameters::new(self)
    }
}

// ---------------------------------------------------------------------------
// Validated parameters
// ---------------------------------------------------------------------------

/// A validated harm component.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    name: String,
    weight: f64,
    distribution: Distribution,
}

impl Component {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }
}

/// A validated scenario: one effective distribution per declared component.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    name: String,
    distributions: Vec<Distribution>,
    implementation_cost: Decimal,
}

impl Scenario {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Effective distributions, in component declaration order.
    pub fn distributions(&self) -> &[Distribution] {
        &self.distributions
    }

    pub fn implementation_cost(&self) -> Decimal {
        self.implementation_cost
    }
}

/// Immutable, validated simulation inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParameters {
    trials: usize,
    seed: Option<u64>,
    components: Vec<Component>,
    scenarios: Vec<Scenario>,
    baseline: String,
    annual_volume: Option<f64>,
    harm_thresholds: Vec<f64>,
    config: ParameterConfig,
}

impl SimulationParameters {
    pub fn new(config: ParameterConfig) -> Result<Self> {
        let trials = usize::try_from(config.trials)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| {
                SimulationError::invalid(
                    "trials",
                    format!("must be at least 1, got {}", config.trials),
                )
            })?;

        if config.components.is_empty() {
            return Err(SimulationError::invalid(
                "components",
                "at least one harm component is required",
            ));
        }
        if config.scenarios.is_empty() {
            return Err(SimulationError::invalid(
                "scenarios",
                "at least one scenario is required",
            ));
        }

        let mut seen = HashSet::new();
        let mut components = Vec::with_capacity(config.components.len());
        for spec in &config.components {
            check_name("components", &spec.name, &mut seen)?;
            if RESERVED_COLUMNS.contains(&spec.name.as_str()) {
                return Err(SimulationError::invalid(
                    "components",
                    format!("`{}` is reserved for the raw trial feed", spec.name),
                ));
            }
            if !spec.weight.is_finite() {
                return Err(SimulationError::invalid(
                    format!("{}.weight", spec.name),
                    "must be finite",
                ));
            }
            components.push(Component {
                name: spec.name.clone(),
                weight: spec.weight,
                distribution: spec.distribution.parse(&spec.name)?,
            });
        }

        let mut seen = HashSet::new();
        let mut scenarios = Vec::with_capacity(config.scenarios.len());
        for spec in &config.scenarios {
            check_name("scenarios", &spec.name, &mut seen)?;
            scenarios.push(resolve_scenario(spec, &components)?);
        }

        let baseline = match &config.baseline {
            Some(name) if seen.contains(name.as_str()) => name.clone(),
            Some(name) => {
                return Err(SimulationError::invalid(
                    "baseline",
                    format!("`{name}` is not a declared scenario"),
                ))
            }
            None => config.scenarios[0].name.clone(),
        };

        if let Some(volume) = config.annual_volume {
            if !volume.is_finite() || volume <= 0.0 {
                return Err(SimulationError::invalid(
                    "annual_volume",
                    format!("must be a positive finite number, got {volume}"),
                ));
            }
        }
        if let Some(t) = config.harm_thresholds.iter().find(|t| !t.is_finite()) {
            return Err(SimulationError::invalid(
                "harm_thresholds",
                format!("must be finite, got {t}"),
            ));
        }

        Ok(Self {
            trials,
            seed: config.seed,
            components,
            scenarios,
            baseline,
            annual_volume: config.annual_volume,
            harm_thresholds: config.harm_thresholds.clone(),
            config,
        })
    }

    /// Parse and validate a JSON parameter document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ParameterConfig = serde_json::from_str(json)
            .map_err(|e| SimulationError::invalid("config", e.to_string()))?;
        Self::new(config)
    }

    pub fn trials(&self) -> usize {
        self.trials
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component_names(&self) -> Vec<String> {
        self.components.iter().map(|c| c.name.clone()).collect()
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn scenario(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    pub fn baseline(&self) -> &str {
        &self.baseline
    }

    pub fn annual_volume(&self) -> Option<f64> {
        self.annual_volume
    }

    pub fn harm_thresholds(&self) -> &[f64] {
        &self.harm_thresholds
    }

    /// Implementation cost per scenario name.
    pub fn implementation_costs(&self) -> BTreeMap<String, Decimal> {
        self.scenarios
            .iter()
            .map(|s| (s.name.clone(), s.implementation_cost))
            .collect()
    }

    /// The configuration these parameters were validated from.
    pub fn config(&self) -> &ParameterConfig {
        &self.config
    }
}

fn check_name<'a>(list: &str, name: &'a str, seen: &mut HashSet<&'a str>) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SimulationError::invalid(list, "names must not be empty"));
    }
    if !seen.insert(name) {
        return Err(SimulationError::invalid(
            list,
            format!("duplicate name `{name}`"),
        ));
    }
    Ok(())
}

fn resolve_scenario(spec: &ScenarioSpec, components: &[Component]) -> Result<Scenario> {
    if let Some(unknown) = spec
        .overrides
        .keys()
        .find(|k| !components.iter().any(|c| &c.name == *k))
    {
        return Err(SimulationError::invalid(
            format!("scenarios.{}.overrides", spec.name),
            format!("references undefined component `{unknown}`"),
        ));
    }
    if spec.implementation_cost.is_sign_negative() && !spec.implementation_cost.is_zero() {
        return Err(SimulationError::invalid(
            format!("scenarios.{}.implementation_cost", spec.name),
            "must not be negative",
        ));
    }

    let distributions = components
        .iter()
        .map(|c| match spec.overrides.get(&c.name) {
            Some(o) => o.parse(&format!("{}.{}", spec.name, c.name)),
            None => Ok(c.distribution.clone()),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Scenario {
        name: spec.name.clone(),
        distributions,
        implementation_cost: spec.implementation_cost,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
