// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Consumer Harm Simulation Suite - Simulation Runner

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::compare::{compare, ComparisonResult};
use crate::cost_benefit::{self, CostBenefit};
use crate::engine::{self, TrialRecord, DEFAULT_BLOCK_SIZE};
use crate::error::Result;
use crate::params::{ParameterConfig, SimulationParameters};
use crate::sink::ResultSink;
use crate::stats::{Aggregator, ScenarioStatistics};

// ─── Execution Mode ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One generator per scenario, trials in order. Bit-reproducible.
    #[default]
    Sequential,
    /// Scenarios and trial blocks spread across the rayon pool. Reproducible
    /// for a given seed and block size, independent of thread count.
    Parallel { block_size: usize },
}

impl ExecutionMode {
    pub fn parallel() -> Self {
        Self::Parallel { block_size: DEFAULT_BLOCK_SIZE }
    }
}

// ─── Report ─────────────────────────────────────────────────────────────────

/// Terminal artifacts of one run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// Seed actually used; drawn from entropy when the parameters had none.
    pub seed: u64,
    pub trials: usize,
    pub execution: ExecutionMode,
    pub parameters: ParameterConfig,
    pub statistics: Vec<ScenarioStatistics>,
    pub comparison: ComparisonResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_benefit: Option<Vec<CostBenefit>>,
}

impl SimulationReport {
    pub fn scenario(&self, name: &str) -> Option<&ScenarioStatistics> {
        self.statistics.iter().find(|s| s.scenario == name)
    }
}

// ─── Simulation ─────────────────────────────────────────────────────────────

/// Runs every scenario of a parameter set, summarizes and compares them.
#[derive(Debug, Clone)]
pub struct Simulation {
    params: SimulationParameters,
    mode: ExecutionMode,
}

impl Simulation {
    pub fn new(params: SimulationParameters) -> Self {
        Self { params, mode: ExecutionMode::default() }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// The configured seed, or a fresh one from OS entropy.
    pub fn resolve_seed(&self) -> u64 {
        self.params.seed().unwrap_or_else(rand::random)
    }

    /// Materialize one scenario's records.
    pub fn run_scenario(&self, scenario: &str, seed: u64) -> Result<Vec<TrialRecord>> {
        match self.mode {
            ExecutionMode::Sequential => {
                let mut rng = engine::scenario_rng(seed);
                Ok(engine::run(scenario, &self.params, &mut rng)?.collect())
            }
            ExecutionMode::Parallel { block_size } => {
                engine::run_parallel(scenario, &self.params, seed, block_size)
            }
        }
    }

    pub fn run(&self) -> Result<SimulationReport> {
        self.execute(self.resolve_seed(), None)
    }

    /// Run and stream every record, scenario by scenario in declaration
    /// order, into `sink`.
    pub fn run_with_sink(&self, sink: &mut dyn ResultSink) -> Result<SimulationReport> {
        self.execute(self.resolve_seed(), Some(sink))
    }

    /// Run with an explicit seed, ignoring the one in the parameters.
    pub fn run_seeded(&self, seed: u64, sink: Option<&mut dyn ResultSink>) -> Result<SimulationReport> {
        self.execute(seed, sink)
    }

    fn execute(&self, seed: u64, mut sink: Option<&mut dyn ResultSink>) -> Result<SimulationReport> {
        let params = &self.params;
        info!(
            seed,
            trials = params.trials(),
            scenarios = params.scenarios().len(),
            execution = ?self.mode,
            "starting simulation"
        );

        let names: Vec<&str> = params.scenarios().iter().map(|s| s.name()).collect();
        let per_scenario: Vec<Vec<TrialRecord>> = match self.mode {
            ExecutionMode::Sequential => names
                .iter()
                .map(|name| self.run_scenario(name, seed))
                .collect::<Result<_>>()?,
            ExecutionMode::Parallel { .. } => names
                .par_iter()
                .map(|name| self.run_scenario(name, seed))
                .collect::<Result<_>>()?,
        };

        if let Some(sink) = sink.as_deref_mut() {
            sink.begin(&params.component_names())?;
            for record in per_scenario.iter().flatten() {
                sink.record(record)?;
            }
            sink.finish()?;
        }

        let aggregator = Aggregator::for_params(params);
        let statistics = per_scenario
            .iter()
            .map(|records| aggregator.summarize(records))
            .collect::<Result<Vec<_>>>()?;
        drop(per_scenario);

        let comparison = compare(&statistics, params.baseline())?;
        let cost_benefit = params
            .annual_volume()
            .map(|volume| {
                cost_benefit::evaluate(
                    &statistics,
                    params.baseline(),
                    &params.implementation_costs(),
                    volume,
                )
            })
            .transpose()?;

        for entry in &comparison.ranking {
            debug!(rank = entry.rank, scenario = %entry.scenario, mean = entry.mean, "ranked");
        }
        info!(
            baseline = params.baseline(),
            undefined_ratios = comparison.undefined_ratios.len(),
            "simulation complete"
        );

        Ok(SimulationReport {
            seed,
            trials: params.trials(),
            execution: self.mode,
            parameters: params.config().clone(),
            statistics,
            comparison,
            cost_benefit,
        })
    }
}
