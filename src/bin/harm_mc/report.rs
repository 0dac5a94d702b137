// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Consumer Harm Simulation Suite - Console Tables and Saved Report

use harm_sim::cost_benefit::from_money;
use harm_sim::{RelativeChange, SimulationReport};
use rust_decimal::Decimal;
use serde::Serialize;

// ─── Saved Report ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RunArtifact<'a> {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub source: String,
    #[serde(flatten)]
    pub report: &'a SimulationReport,
}

// ─── Console Output ─────────────────────────────────────────────────────────

fn pct(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{:+.1}%", v * 100.0),
        None => "n/a".to_string(),
    }
}

fn money(v: Option<Decimal>) -> String {
    match v {
        Some(d) => format!("{:.0}", from_money(d)),
        None => "overflow".to_string(),
    }
}

pub fn print_header(source: &str, report: &SimulationReport) {
    println!("\n  Consumer Harm Monte Carlo");
    println!(
        "  PRNG: ChaCha8Rng | Trials/scenario: {} | Seed: {} | Source: {}",
        report.trials, report.seed, source
    );
}

pub fn print_statistics(report: &SimulationReport) {
    println!();
    println!(
        "  {:<24} {:>11} {:>9} {:>11} {:>11} {:>11} {:>7}",
        "Scenario", "Mean", "±CI95", "Median", "P95", "Max", "Zero%"
    );
    println!("  {}", "-".repeat(90));
    for s in &report.statistics {
        let zero_pct = if s.count > 0 { s.zero_harm as f64 / s.count as f64 * 100.0 } else { 0.0 };
        println!(
            "  {:<24} {:>11.2} {:>9.2} {:>11.2} {:>11.2} {:>11.2} {:>6.1}%",
            s.scenario,
            s.mean,
            (s.ci_upper - s.ci_lower) / 2.0,
            s.median,
            s.percentile(95.0).unwrap_or(f64::NAN),
            s.max,
            zero_pct,
        );
    }

    for s in &report.statistics {
        println!("\n  {} components:", s.scenario);
        for c in &s.components {
            println!(
                "    {:<26} mean {:>10.2}  weight {:>4}  share {:>7}  affected {:>6}",
                c.name,
                c.mean(),
                c.weight,
                c.share_of_total.map(|v| format!("{:.1}%", v * 100.0)).unwrap_or_else(|| "n/a".into()),
                c.affected,
            );
        }
        for e in &s.exceedances {
            println!(
                "    harm > {:<19} {:>6} trials ({:.1}%)",
                e.threshold,
                e.count,
                e.fraction * 100.0
            );
        }
    }
}

pub fn print_comparison(report: &SimulationReport) {
    let cmp = &report.comparison;
    println!("\n  Against baseline \"{}\":", cmp.baseline);
    for d in &cmp.deltas {
        let rel = match d.relative_change {
            RelativeChange::Defined(v) => pct(Some(v)),
            RelativeChange::Undefined => "undefined".to_string(),
        };
        println!("    {:<24} {:>+12.2} {:>10}", d.scenario, d.absolute_change, rel);
    }
    println!("\n  Ranking (least harmful first):");
    for r in &cmp.ranking {
        println!("    {:>2}. {:<24} {:>12.2}", r.rank, r.scenario, r.mean);
    }
}

pub fn print_cost_benefit(report: &SimulationReport) {
    let Some(rows) = &report.cost_benefit else {
        return;
    };
    println!();
    println!(
        "  {:<24} {:>18} {:>18} {:>18} {:>18} {:>9}",
        "Scenario", "Annual impact", "Annual benefit", "Cost", "Net benefit", "ROI"
    );
    println!("  {}", "-".repeat(110));
    for row in rows {
        println!(
            "  {:<24} {:>18} {:>18} {:>18.0} {:>18} {:>9}",
            row.scenario,
            money(row.annual_impact),
            money(row.annual_benefit),
            from_money(row.implementation_cost),
            money(row.net_benefit),
            pct(row.roi.map(from_money)),
        );
    }
}
