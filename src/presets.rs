// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Consumer Harm Simulation Suite - Preset Parameter Sets
//
// Ready-made configurations. `consumer_harm` is the three-policy household
// services model; `price_quality` is the two-scenario toy model used in the
// documentation and tests.

use rust_decimal_macros::dec;

use crate::distribution::DistributionSpec;
use crate::error::Result;
use crate::params::{HarmComponentSpec, ParameterConfig, ScenarioSpec, SimulationParameters};

pub const NAMES: [&str; 2] = ["consumer-harm", "price-quality"];

/// Transactions per year in the consumer-harm market.
pub const ANNUAL_TRANSACTIONS: f64 = 1_730_000.0;
/// Flat cost borne by the consumer when a service visit fails.
pub const SERVICE_FAILURE_PENALTY: f64 = 1000.0;

pub const DEFAULT_TRIALS: i64 = 10_000;
pub const DEFAULT_SEED: u64 = 42;

/// Look a preset up by its CLI name.
pub fn by_name(name: &str) -> Option<ParameterConfig> {
    match name {
        "consumer-harm" => Some(consumer_harm_config()),
        "price-quality" => Some(price_quality_config()),
        _ => None,
    }
}

// ─── Consumer Harm ──────────────────────────────────────────────────────────

fn service_failure(failure: DistributionSpec) -> DistributionSpec {
    DistributionSpec::event(vec![failure], DistributionSpec::constant(SERVICE_FAILURE_PENALTY))
}

/// Damage that occurs and whose claim is then denied is borne in full.
fn uncompensated_damage(occurrence: DistributionSpec, denial: DistributionSpec) -> DistributionSpec {
    DistributionSpec::event(
        vec![occurrence, denial],
        DistributionSpec::triangular(500.0, 2500.0, 10_000.0),
    )
}

pub fn consumer_harm_config() -> ParameterConfig {
    let occurrence = DistributionSpec::triangular(0.05, 0.12, 0.25);

    let mut cfg = ParameterConfig::new(DEFAULT_TRIALS);
    cfg.seed = Some(DEFAULT_SEED);
    cfg.components = vec![
        // Sampled for the correlation matrix; not itself a harm.
        HarmComponentSpec::new("base_service_cost", DistributionSpec::triangular(2500.0, 3200.0, 4000.0))
            .with_weight(0.0),
        HarmComponentSpec::new("hidden_fees", DistributionSpec::triangular(0.0, 375.0, 1100.0)),
        HarmComponentSpec::new(
            "service_failure",
            service_failure(DistributionSpec::triangular(0.15, 0.30, 0.45)),
        ),
        HarmComponentSpec::new(
            "uncompensated_damage",
            uncompensated_damage(occurrence.clone(), DistributionSpec::triangular(0.60, 0.85, 0.95)),
        ),
    ];
    cfg.scenarios = vec![
        ScenarioSpec::new("Status Quo"),
        ScenarioSpec::new("Moderate Reform")
            .with_override("hidden_fees", DistributionSpec::triangular(0.0, 150.0, 500.0))
            .with_override(
                "service_failure",
                service_failure(DistributionSpec::triangular(0.10, 0.20, 0.30)),
            )
            .with_override(
                "uncompensated_damage",
                uncompensated_damage(occurrence, DistributionSpec::triangular(0.40, 0.60, 0.80)),
            )
            .with_implementation_cost(dec!(191_000_000)),
        ScenarioSpec::new("Strong Reform")
            .with_override("hidden_fees", DistributionSpec::triangular(0.0, 50.0, 200.0))
            .with_override(
                "service_failure",
                service_failure(DistributionSpec::triangular(0.05, 0.10, 0.15)),
            )
            .with_override(
                "uncompensated_damage",
                uncompensated_damage(
                    DistributionSpec::triangular(0.03, 0.08, 0.15),
                    DistributionSpec::triangular(0.20, 0.35, 0.50),
                ),
            )
            .with_implementation_cost(dec!(297_000_000)),
    ];
    cfg.baseline = Some("Status Quo".to_string());
    cfg.annual_volume = Some(ANNUAL_TRANSACTIONS);
    cfg
}

pub fn consumer_harm(trials: i64, seed: Option<u64>) -> Result<SimulationParameters> {
    let mut cfg = consumer_harm_config();
    cfg.trials = trials;
    cfg.seed = seed;
    cfg.validate()
}

// ─── Price / Quality ────────────────────────────────────────────────────────

pub fn price_quality_config() -> ParameterConfig {
    let mut cfg = ParameterConfig::new(1000);
    cfg.seed = Some(DEFAULT_SEED);
    cfg.components = vec![
        HarmComponentSpec::new("price", DistributionSpec::normal(10.0, 2.0)),
        HarmComponentSpec::new("quality", DistributionSpec::uniform(0.0, 5.0)),
    ];
    cfg.scenarios = vec![
        ScenarioSpec::new("baseline"),
        ScenarioSpec::new("policy_A").with_override("price", DistributionSpec::normal(12.0, 2.0)),
    ];
    cfg
}

pub fn price_quality(trials: i64, seed: Option<u64>) -> Result<SimulationParameters> {
    let mut cfg = price_quality_config();
    cfg.trials = trials;
    cfg.seed = seed;
    cfg.validate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_named_preset_validates() {
        for name in NAMES {
            let cfg = by_name(name).unwrap();
            assert!(cfg.validate().is_ok(), "{name}");
        }
        assert!(by_name("nope").is_none());
    }

    #[test]
    fn consumer_harm_shape() {
        let params = consumer_harm(10, Some(1)).unwrap();
        assert_eq!(params.baseline(), "Status Quo");
        assert_eq!(params.scenarios().len(), 3);
        assert_eq!(params.components()[0].weight(), 0.0);
        assert_eq!(params.annual_volume(), Some(ANNUAL_TRANSACTIONS));
        assert_eq!(
            params.implementation_costs().get("Strong Reform"),
            Some(&dec!(297_000_000))
        );
    }

    #[test]
    fn reforms_lower_expected_harm() {
        let params = consumer_harm(1, None).unwrap();
        let expected: Vec<f64> = params
            .scenarios()
            .iter()
            .map(|s| {
                s.distributions()
                    .iter()
                    .zip(params.components())
                    .map(|(d, c)| c.weight() * d.expected_value())
                    .sum()
            })
            .collect();
        assert!(expected[0] > expected[1]);
        assert!(expected[1] > expected[2]);
    }

    #[test]
    fn price_quality_defaults() {
        let params = price_quality_config().validate().unwrap();
        assert_eq!(params.trials(), 1000);
        assert_eq!(params.seed(), Some(42));
        assert_eq!(params.baseline(), "baseline");
        assert_eq!(params.component_names(), vec!["price", "quality"]);
    }
}
