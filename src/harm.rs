// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Consumer Harm Simulation Suite - Harm Component Models

//! Per-component harm and the rule that combines components into total harm.
//!
//! Each component's harm is exactly one [`Sampler`] draw from its effective
//! distribution for the scenario. Components are sampled independently of
//! each other within a trial; there is no cross-component correlation. This
//! is a fixed simplifying assumption of the model.

use rand::Rng;

use crate::error::Result;
use crate::params::{Scenario, SimulationParameters};
use crate::sampler::Sampler;

/// One component ready to draw.
#[derive(Debug, Clone)]
pub struct ComponentModel {
    pub name: String,
    pub weight: f64,
    sampler: Sampler,
}

impl ComponentModel {
    pub fn harm<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.sampler.sample(rng)
    }
}

/// All components of one scenario, in declaration order.
#[derive(Debug, Clone)]
pub struct HarmModel {
    scenario: String,
    components: Vec<ComponentModel>,
}

impl HarmModel {
    pub fn for_scenario(params: &SimulationParameters, scenario: &Scenario) -> Result<Self> {
        let components = params
            .components()
            .iter()
            .zip(scenario.distributions())
            .map(|(component, dist)| {
                Ok(ComponentModel {
                    name: component.name().to_string(),
                    weight: component.weight(),
                    sampler: Sampler::new(dist)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            scenario: scenario.name().to_string(),
            components,
        })
    }

    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    pub fn components(&self) -> &[ComponentModel] {
        &self.components
    }

    /// Draw every component once, in declaration order.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        self.components.iter().map(|c| c.harm(rng)).collect()
    }

    /// Weighted sum of component values. The rule is the same for every
    /// scenario and every trial of a run.
    pub fn combine(&self, values: &[f64]) -> f64 {
        self.components
            .iter()
            .zip(values)
            .map(|(c, v)| c.weight * v)
            .sum()
    }
}
