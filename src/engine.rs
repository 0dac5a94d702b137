// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Consumer Harm Simulation Suite - Trial Engine
//
// Runs one scenario for N trials. Sequential runs pull from a caller-owned
// generator and are bit-reproducible for a given seed. Parallel runs split
// trials into fixed-size blocks, each with its own ChaCha8 stream derived
// from the scenario seed, so the output does not depend on worker count or
// scheduling.

use std::iter::FusedIterator;
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use crate::error::{Result, SimulationError};
use crate::harm::HarmModel;
use crate::params::SimulationParameters;

/// Trials per block in parallel mode unless the caller picks another size.
pub const DEFAULT_BLOCK_SIZE: usize = 256;

// ─── Trial Record ───────────────────────────────────────────────────────────

/// One simulated outcome. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    scenario: Arc<str>,
    trial: usize,
    columns: Arc<[String]>,
    weights: Arc<[f64]>,
    values: Vec<f64>,
    total_harm: f64,
}

impl TrialRecord {
    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    /// 0-based trial index within the scenario.
    pub fn trial(&self) -> usize {
        self.trial
    }

    /// Component names, in declaration order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Combination weights, aligned with [`columns`](Self::columns).
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Component values, aligned with [`columns`](Self::columns).
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn component(&self, name: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.values[i])
    }

    pub fn components(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn total_harm(&self) -> f64 {
        self.total_harm
    }
}

/// Serializes as one flat row: `scenario`, `trial`, a key per component,
/// `total_harm`.
impl Serialize for TrialRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 3))?;
        map.serialize_entry("scenario", &*self.scenario)?;
        map.serialize_entry("trial", &self.trial)?;
        for (name, value) in self.components() {
            map.serialize_entry(name, &value)?;
        }
        map.serialize_entry("total_harm", &self.total_harm)?;
        map.end()
    }
}

// ─── Record Production ──────────────────────────────────────────────────────

struct RecordFactory {
    model: HarmModel,
    scenario: Arc<str>,
    columns: Arc<[String]>,
    weights: Arc<[f64]>,
}

impl RecordFactory {
    fn new(scenario: &str, params: &SimulationParameters) -> Result<Self> {
        let spec = params
            .scenario(scenario)
            .ok_or_else(|| SimulationError::UnknownScenario(scenario.to_string()))?;
        Ok(Self {
            model: HarmModel::for_scenario(params, spec)?,
            scenario: Arc::from(scenario),
            columns: params.component_names().into(),
            weights: params.components().iter().map(|c| c.weight()).collect(),
        })
    }

    fn produce<R: Rng + ?Sized>(&self, trial: usize, rng: &mut R) -> TrialRecord {
        let values = self.model.draw(rng);
        let total_harm = self.model.combine(&values);
        TrialRecord {
            scenario: Arc::clone(&self.scenario),
            trial,
            columns: Arc::clone(&self.columns),
            weights: Arc::clone(&self.weights),
            values,
            total_harm,
        }
    }
}

/// Lazy, single-pass sequence of exactly N trial records.
///
/// Restarting requires calling [`run`] again with an identically seeded
/// generator. Dropping it early abandons the run between trials.
pub struct Trials<'r, R: Rng + ?Sized> {
    factory: RecordFactory,
    rng: &'r mut R,
    next: usize,
    trials: usize,
}

impl<R: Rng + ?Sized> Iterator for Trials<'_, R> {
    type Item = TrialRecord;

    fn next(&mut self) -> Option<TrialRecord> {
        if self.next >= self.trials {
            return None;
        }
        let record = self.factory.produce(self.next, &mut *self.rng);
        self.next += 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.trials - self.next;
        (remaining, Some(remaining))
    }
}

impl<R: Rng + ?Sized> ExactSizeIterator for Trials<'_, R> {}

impl<R: Rng + ?Sized> FusedIterator for Trials<'_, R> {}

// ─── Entry Points ───────────────────────────────────────────────────────────

/// Run `scenario` for `params.trials()` trials, drawing from `rng`.
///
/// Each trial draws every component exactly once, in declaration order.
pub fn run<'r, R: Rng + ?Sized>(
    scenario: &str,
    params: &SimulationParameters,
    rng: &'r mut R,
) -> Result<Trials<'r, R>> {
    let factory = RecordFactory::new(scenario, params)?;
    debug!(scenario, trials = params.trials(), "starting sequential run");
    Ok(Trials {
        factory,
        rng,
        next: 0,
        trials: params.trials(),
    })
}

/// Generator for one scenario of a run. Every scenario of a run starts from
/// the same seed, so scenarios differ only where their parameters differ.
pub fn scenario_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Generator for trial block `block` in parallel mode. Stream 0 is left to
/// sequential runs.
pub fn block_rng(seed: u64, block: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(block as u64 + 1);
    rng
}

/// Run `scenario` across the rayon pool in blocks of `block_size` trials.
///
/// Records come back in trial order. The result depends on `seed` and
/// `block_size` only. It differs from a sequential run with the same seed.
pub fn run_parallel(
    scenario: &str,
    params: &SimulationParameters,
    seed: u64,
    block_size: usize,
) -> Result<Vec<TrialRecord>> {
    let factory = RecordFactory::new(scenario, params)?;
    let trials = params.trials();
    let block_size = block_size.max(1);
    let blocks = trials.div_ceil(block_size);
    debug!(scenario, trials, blocks, block_size, "starting parallel run");

    let chunks: Vec<Vec<TrialRecord>> = (0..blocks)
        .into_par_iter()
        .map(|block| {
            let mut rng = block_rng(seed, block);
            let start = block * block_size;
            let end = (start + block_size).min(trials);
            (start..end)
                .map(|trial| factory.produce(trial, &mut rng))
                .collect()
        })
        .collect();

    Ok(chunks.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::DistributionSpec;
    use crate::params::{HarmComponentSpec, ParameterConfig, ScenarioSpec};

    fn params(trials: i64) -> SimulationParameters {
        let mut cfg = ParameterConfig::new(trials);
        cfg.seed = Some(42);
        cfg.components = vec![
            HarmComponentSpec::new("price", DistributionSpec::normal(10.0, 2.0)),
            HarmComponentSpec::new("quality", DistributionSpec::uniform(0.0, 5.0)),
        ];
        cfg.scenarios = vec![
            ScenarioSpec::new("baseline"),
            ScenarioSpec::new("policy_A").with_override("price", DistributionSpec::normal(12.0, 2.0)),
        ];
        cfg.validate().unwrap()
    }

    #[test]
    fn test_yields_exactly_n_in_order() {
        for n in [1, 7, 1000] {
            let p = params(n);
            let mut rng = scenario_rng(3);
            let trials = run("baseline", &p, &mut rng).unwrap();
            assert_eq!(trials.len(), n as usize);
            let records: Vec<_> = trials.collect();
            assert_eq!(records.len(), n as usize);
            for (i, r) in records.iter().enumerate() {
                assert_eq!(r.trial(), i);
                assert_eq!(r.scenario(), "baseline");
            }
        }
    }

    #[test]
    fn test_total_is_sum_of_components() {
        let p = params(200);
        let mut rng = scenario_rng(8);
        for r in run("policy_A", &p, &mut rng).unwrap() {
            let sum: f64 = r.values().iter().sum();
            assert!((r.total_harm() - sum).abs() < 1e-9);
            assert_eq!(r.component("price"), Some(r.values()[0]));
            assert_eq!(r.component("missing"), None);
        }
    }

    #[test]
    fn test_unknown_scenario() {
        let p = params(5);
        let mut rng = scenario_rng(0);
        assert!(matches!(
            run("policy_Z", &p, &mut rng),
            Err(SimulationError::UnknownScenario(ref s)) if s == "policy_Z"
        ));
    }

    #[test]
    fn test_early_stop_leaves_no_partial_trial() {
        let p = params(100);
        let mut rng = scenario_rng(1);
        let mut trials = run("baseline", &p, &mut rng).unwrap();
        let first: Vec<_> = trials.by_ref().take(10).collect();
        assert_eq!(first.len(), 10);
        assert_eq!(trials.len(), 90);
        drop(trials);
    }

    #[test]
    fn test_parallel_matches_across_pool_sizes() {
        let p = params(1000);
        let one = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .build()
            .unwrap()
            .install(|| run_parallel("baseline", &p, 42, 64).unwrap());
        let four = rayon::ThreadPoolBuilder::new()
            .num_threads(4)
            .build()
            .unwrap()
            .install(|| run_parallel("baseline", &p, 42, 64).unwrap());
        assert_eq!(one.len(), 1000);
        assert_eq!(one, four);
        for (i, r) in one.iter().enumerate() {
            assert_eq!(r.trial(), i);
        }
    }

    #[test]
    fn test_record_serializes_as_flat_row() {
        let p = params(1);
        let mut rng = scenario_rng(0);
        let record = run("baseline", &p, &mut rng).unwrap().next().unwrap();
        let row = serde_json::to_value(&record).unwrap();
        assert_eq!(row["scenario"], "baseline");
        assert_eq!(row["trial"], 0);
        assert_eq!(row["price"].as_f64(), record.component("price"));
        assert_eq!(row["total_harm"].as_f64(), Some(record.total_harm()));
    }
}
