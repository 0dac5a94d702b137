// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Consumer Harm Simulation Suite

//! Monte Carlo estimation of consumer harm under competing policy scenarios.
//!
//! A run validates a [`ParameterConfig`], samples every scenario's harm
//! components for N trials from a seeded ChaCha8 stream, reduces the trials
//! to [`ScenarioStatistics`], and compares each scenario against a baseline.

pub mod error;
pub mod distribution;
pub mod params;
pub mod sampler;
pub mod harm;
pub mod engine;
pub mod stats;
pub mod compare;
pub mod cost_benefit;
pub mod sink;
pub mod simulation;
pub mod presets;

pub use compare::{compare, ComparisonResult, RankEntry, RelativeChange, ScenarioDelta};
pub use cost_benefit::CostBenefit;
pub use distribution::{Distribution, DistributionSpec, Family};
pub use engine::{run, run_parallel, TrialRecord, Trials};
pub use error::{Result, SimulationError};
pub use harm::HarmModel;
pub use params::{HarmComponentSpec, ParameterConfig, ScenarioSpec, SimulationParameters};
pub use sampler::Sampler;
pub use simulation::{ExecutionMode, Simulation, SimulationReport};
pub use sink::{CollectSink, CsvSink, JsonlSink, ResultSink};
pub use stats::{summarize, Aggregator, ScenarioStatistics};
