// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Consumer Harm Simulation Suite - Sampler
//
// Draws variates from validated distributions. The generator is always
// supplied by the caller; nothing here seeds or stores randomness.

use std::collections::BTreeMap;

use rand::Rng;
use rand_distr::{LogNormal, Normal, Triangular, Uniform};

use crate::distribution::{Distribution, DistributionSpec};
use crate::error::{Result, SimulationError};

// ─── Sampler ────────────────────────────────────────────────────────────────

/// A [`Distribution`] compiled into ready-to-draw `rand_distr` samplers.
#[derive(Debug, Clone)]
pub enum Sampler {
    Normal(Normal<f64>),
    Uniform(Uniform<f64>),
    Triangular(Triangular<f64>),
    LogNormal(LogNormal<f64>),
    Constant(f64),
    Event {
        triggers: Vec<Sampler>,
        severity: Box<Sampler>,
    },
}

impl Sampler {
    pub fn new(dist: &Distribution) -> Result<Self> {
        let rejected = |e: &dyn std::fmt::Display| {
            SimulationError::invalid(dist.family().tag(), e.to_string())
        };
        Ok(match dist {
            Distribution::Normal { mean, std_dev } => {
                Self::Normal(Normal::new(*mean, *std_dev).map_err(|e| rejected(&e))?)
            }
            Distribution::Uniform { low, high } => {
                // Uniform::new panics on an empty or overflowing range.
                if !(low < high) || !(high - low).is_finite() {
                    return Err(rejected(&"uniform requires low < high with a finite width"));
                }
                Self::Uniform(Uniform::new(*low, *high))
            }
            Distribution::Triangular { low, mode, high } => Self::Triangular(
                Triangular::new(*low, *high, *mode).map_err(|e| rejected(&e))?,
            ),
            Distribution::LogNormal { mu, sigma } => {
                Self::LogNormal(LogNormal::new(*mu, *sigma).map_err(|e| rejected(&e))?)
            }
            Distribution::Constant { value } => Self::Constant(*value),
            Distribution::Event { triggers, severity } => Self::Event {
                triggers: triggers.iter().map(Sampler::new).collect::<Result<_>>()?,
                severity: Box::new(Sampler::new(severity)?),
            },
        })
    }

    /// Draw one variate.
    ///
    /// An event always draws every trigger probability, one uniform per
    /// trigger and the severity, whether or not it fires, so the number of
    /// generator draws per sample does not depend on the outcome.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Self::Normal(d) => rng.sample(d),
            Self::Uniform(d) => rng.sample(d),
            Self::Triangular(d) => rng.sample(d),
            Self::LogNormal(d) => rng.sample(d),
            Self::Constant(v) => *v,
            Self::Event { triggers, severity } => {
                let mut fired = true;
                for trigger in triggers {
                    let p = trigger.sample(rng);
                    let u: f64 = rng.gen();
                    fired &= u < p;
                }
                let magnitude = severity.sample(rng);
                if fired {
                    magnitude
                } else {
                    0.0
                }
            }
        }
    }
}

impl rand_distr::Distribution<f64> for Sampler {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        Sampler::sample(self, rng)
    }
}

/// One-shot draw from a family tag and its named parameters.
pub fn sample<R: Rng + ?Sized>(
    family: &str,
    params: &BTreeMap<String, f64>,
    rng: &mut R,
) -> Result<f64> {
    let spec = DistributionSpec {
        family: family.to_string(),
        params: params.clone(),
        triggers: Vec::new(),
        severity: None,
    };
    let dist = spec.parse(family)?;
    Ok(Sampler::new(&dist)?.sample(rng))
}
