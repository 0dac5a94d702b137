#[cfg(test)]
mod tests {
    use harm_sim::engine::{run, run_parallel, scenario_rng};
    use harm_sim::{
        presets, summarize, CollectSink, CsvSink, DistributionSpec, ExecutionMode,
        HarmComponentSpec, ParameterConfig, RelativeChange, ScenarioSpec, Simulation,
        SimulationError, SimulationParameters,
    };

    fn example() -> SimulationParameters {
        presets::price_quality_config().validate().unwrap()
    }

    fn field_of(err: SimulationError) -> String {
        match err {
            SimulationError::InvalidParameter { field, .. } => field,
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    // ========== Reproducibility ==========

    #[test]
    fn test_same_seed_is_bit_identical() {
        let params = example();
        let a: Vec<_> = run("baseline", &params, &mut scenario_rng(42)).unwrap().collect();
        let b: Vec<_> = run("baseline", &params, &mut scenario_rng(42)).unwrap().collect();
        assert_eq!(a.len(), 1000);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.total_harm().to_bits(), y.total_harm().to_bits());
            assert_eq!(x.values(), y.values());
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let params = example();
        let a = summarize(&run("baseline", &params, &mut scenario_rng(1)).unwrap().collect::<Vec<_>>()).unwrap();
        let b = summarize(&run("baseline", &params, &mut scenario_rng(2)).unwrap().collect::<Vec<_>>()).unwrap();
        assert_ne!(a.mean, b.mean);
    }

    #[test]
    fn test_report_is_reproducible_end_to_end() {
        let sim = Simulation::new(example());
        let a = sim.run().unwrap();
        let b = sim.run().unwrap();
        assert_eq!(a.seed, 42);
        assert_eq!(a.statistics, b.statistics);
        assert_eq!(a.comparison, b.comparison);
    }

    // ========== Trial Count & Additivity ==========

    #[test]
    fn test_exactly_n_records_with_contiguous_indices() {
        for n in [1, 7, 256, 257, 1000] {
            let params = presets::price_quality(n, Some(3)).unwrap();
            let records: Vec<_> = run("policy_A", &params, &mut scenario_rng(3)).unwrap().collect();
            assert_eq!(records.len(), n as usize);
            assert!(records.iter().enumerate().all(|(i, r)| r.trial() == i));

            let par = run_parallel("policy_A", &params, 3, 64).unwrap();
            assert_eq!(par.len(), n as usize);
            assert!(par.iter().enumerate().all(|(i, r)| r.trial() == i));
        }
    }

    #[test]
    fn test_total_harm_is_sum_of_components() {
        let params = example();
        for r in run("baseline", &params, &mut scenario_rng(9)).unwrap() {
            let sum = r.component("price").unwrap() + r.component("quality").unwrap();
            assert!((r.total_harm() - sum).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_weight_component_is_observed_not_counted() {
        let params = presets::consumer_harm(200, Some(5)).unwrap();
        for r in run("Status Quo", &params, &mut scenario_rng(5)).unwrap() {
            let cost = r.component("base_service_cost").unwrap();
            assert!((2500.0..=4000.0).contains(&cost));
            let harm: f64 = r
                .components()
                .filter(|(name, _)| *name != "base_service_cost")
                .map(|(_, v)| v)
                .sum();
            assert!((r.total_harm() - harm).abs() < 1e-6);
        }
    }

    // ========== Example Scenario ==========

    #[test]
    fn test_policy_a_raises_mean_harm() {
        let report = Simulation::new(example()).run().unwrap();
        let base = report.scenario("baseline").unwrap();
        let policy = report.scenario("policy_A").unwrap();
        assert!(policy.mean > base.mean);
        assert!((base.mean - 12.5).abs() < 0.5, "baseline mean {}", base.mean);
        assert!((policy.mean - 14.5).abs() < 0.5, "policy mean {}", policy.mean);

        let delta = report.comparison.delta("policy_A").unwrap();
        match delta.relative_change {
            RelativeChange::Defined(v) => assert!(v > 0.0),
            RelativeChange::Undefined => panic!("baseline mean is not zero"),
        }
        assert_eq!(report.comparison.ranking[0].scenario, "baseline");
    }

    #[test]
    fn test_scenarios_share_random_numbers() {
        let params = example();
        let base: Vec<_> = run("baseline", &params, &mut scenario_rng(42)).unwrap().collect();
        let policy: Vec<_> = run("policy_A", &params, &mut scenario_rng(42)).unwrap().collect();
        for (b, p) in base.iter().zip(&policy) {
            assert_eq!(b.component("quality"), p.component("quality"));
            assert!((p.total_harm() - b.total_harm() - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_consumer_harm_reforms_rank_below_status_quo() {
        let params = presets::consumer_harm(2000, Some(42)).unwrap();
        let report = Simulation::new(params).run().unwrap();
        let names: Vec<_> = report.comparison.ranking.iter().map(|r| r.scenario.as_str()).collect();
        assert_eq!(names, vec!["Strong Reform", "Moderate Reform", "Status Quo"]);

        let rows = report.cost_benefit.as_ref().unwrap();
        assert_eq!(rows.len(), 3);
        let benefit = |i: usize| rows[i].annual_benefit.unwrap();
        assert!(benefit(1) > benefit(0));
        assert!(benefit(2) > benefit(1));
        assert!(rows[1].roi.is_some());

        let sq = report.scenario("Status Quo").unwrap();
        assert!(sq.annual_impact.is_some());
        assert!(sq.correlation.get("hidden_fees", "total_harm").unwrap() > 0.0);
    }

    #[test]
    fn test_money_overflow_keeps_the_report() {
        let mut cfg = ParameterConfig::new(200);
        cfg.seed = Some(4);
        cfg.components = vec![HarmComponentSpec::new("fees", DistributionSpec::uniform(0.0, 10.0))];
        cfg.scenarios = vec![
            ScenarioSpec::new("Status Quo"),
            ScenarioSpec::new("runaway").with_override("fees", DistributionSpec::uniform(0.0, 1e30)),
        ];
        cfg.annual_volume = Some(1.73e6);
        let report = Simulation::new(cfg.validate().unwrap()).run().unwrap();

        assert_eq!(report.statistics.len(), 2);
        assert!(report.scenario("runaway").unwrap().mean > 1e28);
        assert_eq!(report.comparison.ranking[0].scenario, "Status Quo");

        let rows = report.cost_benefit.as_ref().unwrap();
        assert!(rows[0].annual_impact.is_some());
        assert_eq!(rows[1].annual_impact, None);
        assert_eq!(rows[1].annual_benefit, None);
    }

    // ========== Comparator ==========

    #[test]
    fn test_comparison_is_order_independent() {
        let report = Simulation::new(example()).run().unwrap();
        let mut reversed = report.statistics.clone();
        reversed.reverse();
        let again = harm_sim::compare(&reversed, "baseline").unwrap();
        assert_eq!(again.ranking, report.comparison.ranking);
        assert_eq!(again.delta("policy_A"), report.comparison.delta("policy_A"));
    }

    #[test]
    fn test_zero_baseline_leaves_siblings_defined_in_absolute_terms() {
        let mut cfg = ParameterConfig::new(20);
        cfg.seed = Some(1);
        cfg.components = vec![HarmComponentSpec::new("fees", DistributionSpec::constant(0.0))];
        cfg.scenarios = vec![
            ScenarioSpec::new("free"),
            ScenarioSpec::new("charged").with_override("fees", DistributionSpec::constant(4.0)),
        ];
        let report = Simulation::new(cfg.validate().unwrap()).run().unwrap();
        let charged = report.comparison.delta("charged").unwrap();
        assert_eq!(charged.absolute_change, 4.0);
        assert_eq!(charged.relative_change, RelativeChange::Undefined);
        assert_eq!(report.comparison.undefined_ratios.len(), 2);
        assert_eq!(report.scenario("free").unwrap().zero_harm, 20);
    }

    // ========== Validation ==========

    fn rejected_field(mutate: impl FnOnce(&mut ParameterConfig)) -> String {
        let mut cfg = presets::price_quality_config();
        mutate(&mut cfg);
        field_of(cfg.validate().unwrap_err())
    }

    #[test]
    fn test_validation_names_the_offending_field() {
        assert_eq!(rejected_field(|c| c.trials = 0), "trials");
        assert_eq!(rejected_field(|c| c.trials = -5), "trials");
        assert_eq!(rejected_field(|c| c.components.clear()), "components");
        assert_eq!(rejected_field(|c| c.scenarios.clear()), "scenarios");
        assert_eq!(
            rejected_field(|c| c.components[1].distribution = DistributionSpec::uniform(5.0, 5.0)),
            "quality"
        );
        assert_eq!(
            rejected_field(|c| c.components[0].distribution = DistributionSpec::normal(10.0, -1.0)),
            "price.std_dev"
        );
        assert_eq!(rejected_field(|c| c.baseline = Some("policy_B".into())), "baseline");
        assert_eq!(
            rejected_field(|c| c.components[1].distribution = DistributionSpec::uniform(-1e308, 1e308)),
            "quality"
        );
        assert_eq!(
            rejected_field(|c| {
                c.scenarios[1]
                    .overrides
                    .insert("delivery".into(), DistributionSpec::constant(1.0));
            }),
            "scenarios.policy_A.overrides"
        );
        assert_eq!(
            rejected_field(|c| {
                let name = c.components[0].name.clone();
                c.components.push(HarmComponentSpec::new(name, DistributionSpec::constant(1.0)));
            }),
            "components"
        );
    }

    #[test]
    fn test_unknown_family_is_unsupported() {
        let json = r#"{
            "trials": 10,
            "components": [{ "name": "price", "distribution": { "family": "poisson", "params": { "lambda": 3 } } }],
            "scenarios": [{ "name": "baseline" }]
        }"#;
        match SimulationParameters::from_json(json) {
            Err(SimulationError::UnsupportedDistribution { component, family }) => {
                assert_eq!(component, "price");
                assert_eq!(family, "poisson");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_json_config_round_trip_runs() {
        let json = serde_json::to_string(&presets::price_quality_config()).unwrap();
        let params = SimulationParameters::from_json(&json).unwrap();
        assert_eq!(params.trials(), 1000);
        assert_eq!(params.baseline(), "baseline");
    }

    // ========== Parallel Mode ==========

    #[test]
    fn test_parallel_independent_of_pool_size() {
        let params = example();
        let in_pool = |threads: usize| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap()
                .install(|| {
                    Simulation::new(params.clone())
                        .with_mode(ExecutionMode::Parallel { block_size: 100 })
                        .run()
                        .unwrap()
                })
        };
        let one = in_pool(1);
        let many = in_pool(4);
        assert_eq!(one.statistics, many.statistics);
    }

    // ========== Sinks ==========

    #[test]
    fn test_sinks_receive_every_scenario_in_order() {
        let params = presets::price_quality(25, Some(8)).unwrap();
        let sim = Simulation::new(params);

        let mut collect = CollectSink::default();
        sim.run_with_sink(&mut collect).unwrap();
        assert_eq!(collect.records.len(), 50);

        let mut csv = CsvSink::new(Vec::new());
        sim.run_with_sink(&mut csv).unwrap();
        let text = String::from_utf8(csv.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 51);
        assert_eq!(lines[0], "scenario,trial,price,quality,total_harm");
        assert!(lines[1].starts_with("baseline,0,"));
        assert!(lines[26].starts_with("policy_A,0,"));
    }

    #[test]
    fn test_report_serializes() {
        let params = presets::consumer_harm(100, Some(11)).unwrap();
        let report = Simulation::new(params).with_mode(ExecutionMode::parallel()).run().unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["seed"], 11);
        assert_eq!(json["execution"]["mode"], "parallel");
        assert_eq!(json["statistics"].as_array().unwrap().len(), 3);
        assert_eq!(json["comparison"]["baseline"], "Status Quo");
        assert!(json["cost_benefit"].is_array());
    }
}
