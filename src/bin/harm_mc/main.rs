// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Consumer Harm Simulation Suite - Command-Line Runner
//
// Usage:
//   cargo run --release --bin harm-mc                                # consumer-harm preset
//   cargo run --release --bin harm-mc -- --preset price-quality
//   cargo run --release --bin harm-mc -- --config params.json --trials 50000
//   cargo run --release --bin harm-mc -- --parallel --block-size 512
//   cargo run --release --bin harm-mc -- --raw-csv trials.csv --seed 7
//
// Log verbosity follows HARM_SIM_LOG (default `info`).

mod report;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, bail, Context, Result};
use harm_sim::engine::DEFAULT_BLOCK_SIZE;
use harm_sim::{
    presets, CsvSink, ExecutionMode, JsonlSink, ParameterConfig, ResultSink, Simulation,
    TrialRecord,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use report::*;

// ─── CLI Parsing ────────────────────────────────────────────────────────────

struct CliArgs {
    config: Option<PathBuf>,
    preset: String,
    trials: Option<i64>,
    seed: Option<u64>,
    baseline: Option<String>,
    parallel: bool,
    block_size: usize,
    raw_csv: Option<PathBuf>,
    raw_jsonl: Option<PathBuf>,
    out: PathBuf,
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{flag} expects a value"))
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut cli = CliArgs {
        config: None,
        preset: "consumer-harm".to_string(),
        trials: None,
        seed: None,
        baseline: None,
        parallel: false,
        block_size: DEFAULT_BLOCK_SIZE,
        raw_csv: None,
        raw_jsonl: None,
        out: PathBuf::from("harm-results"),
    };

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--config" => {
                i += 1;
                cli.config = Some(PathBuf::from(value(args, i, flag)?));
            }
            "--preset" => {
                i += 1;
                cli.preset = value(args, i, flag)?.to_string();
            }
            "--trials" => {
                i += 1;
                cli.trials = Some(value(args, i, flag)?.parse().context("--trials expects an integer")?);
            }
            "--seed" => {
                i += 1;
                cli.seed = Some(value(args, i, flag)?.parse().context("--seed expects an unsigned integer")?);
            }
            "--baseline" => {
                i += 1;
                cli.baseline = Some(value(args, i, flag)?.to_string());
            }
            "--parallel" => {
                cli.parallel = true;
            }
            "--block-size" => {
                i += 1;
                cli.block_size = value(args, i, flag)?.parse().context("--block-size expects an unsigned integer")?;
            }
            "--raw-csv" => {
                i += 1;
                cli.raw_csv = Some(PathBuf::from(value(args, i, flag)?));
            }
            "--raw-jsonl" => {
                i += 1;
                cli.raw_jsonl = Some(PathBuf::from(value(args, i, flag)?));
            }
            "--out" => {
                i += 1;
                cli.out = PathBuf::from(value(args, i, flag)?);
            }
            _ => bail!("unknown argument: {flag}"),
        }
        i += 1;
    }

    Ok(cli)
}

// ─── Raw Feed ───────────────────────────────────────────────────────────────

/// Forwards the raw feed to every configured file sink.
struct FanOut(Vec<Box<dyn ResultSink>>);

impl ResultSink for FanOut {
    fn begin(&mut self, columns: &[String]) -> harm_sim::Result<()> {
        self.0.iter_mut().try_for_each(|s| s.begin(columns))
    }

    fn record(&mut self, record: &TrialRecord) -> harm_sim::Result<()> {
        self.0.iter_mut().try_for_each(|s| s.record(record))
    }

    fn finish(&mut self) -> harm_sim::Result<()> {
        self.0.iter_mut().try_for_each(|s| s.finish())
    }
}

fn raw_sinks(cli: &CliArgs) -> Result<FanOut> {
    let mut sinks: Vec<Box<dyn ResultSink>> = Vec::new();
    if let Some(path) = &cli.raw_csv {
        let file = File::create(path)
            .with_context(|| format!("creating raw CSV {}", path.display()))?;
        sinks.push(Box::new(CsvSink::new(BufWriter::new(file))));
        info!(path = %path.display(), "writing raw trials as CSV");
    }
    if let Some(path) = &cli.raw_jsonl {
        let file = File::create(path)
            .with_context(|| format!("creating raw JSONL {}", path.display()))?;
        sinks.push(Box::new(JsonlSink::new(BufWriter::new(file))));
        info!(path = %path.display(), "writing raw trials as JSONL");
    }
    Ok(FanOut(sinks))
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn load_config(cli: &CliArgs) -> Result<(ParameterConfig, String)> {
    let (mut cfg, source) = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let cfg: ParameterConfig = serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?;
            (cfg, path.display().to_string())
        }
        None => {
            let cfg = presets::by_name(&cli.preset).ok_or_else(|| {
                anyhow!(
                    "unknown preset {:?} (available: {})",
                    cli.preset,
                    presets::NAMES.join(", ")
                )
            })?;
            (cfg, format!("preset:{}", cli.preset))
        }
    };
    if let Some(trials) = cli.trials {
        cfg.trials = trials;
    }
    if cli.seed.is_some() {
        cfg.seed = cli.seed;
    }
    if cli.baseline.is_some() {
        cfg.baseline = cli.baseline.clone();
    }
    Ok((cfg, source))
}

fn run(cli: CliArgs) -> Result<()> {
    let (cfg, source) = load_config(&cli)?;
    let params = cfg.validate().with_context(|| format!("invalid parameters from {source}"))?;

    let mode = if cli.parallel {
        ExecutionMode::Parallel { block_size: cli.block_size }
    } else {
        ExecutionMode::Sequential
    };
    let sim = Simulation::new(params).with_mode(mode);

    let started = Instant::now();
    let report = if cli.raw_csv.is_some() || cli.raw_jsonl.is_some() {
        let mut sinks = raw_sinks(&cli)?;
        sim.run_with_sink(&mut sinks)?
    } else {
        sim.run()?
    };
    let elapsed = started.elapsed();

    print_header(&source, &report);
    print_statistics(&report);
    print_comparison(&report);
    print_cost_benefit(&report);
    println!("\n  Run time: {:.2}s", elapsed.as_secs_f64());

    // ─── Write JSON Report ──────────────────────────────────────────────

    let ts = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();
    let artifact = RunArtifact {
        timestamp: ts.to_string(),
        version: env!("CARGO_PKG_VERSION"),
        prng: "ChaCha8Rng",
        source,
        report: &report,
    };

    std::fs::create_dir_all(&cli.out)
        .with_context(|| format!("creating output directory {}", cli.out.display()))?;
    let path = cli.out.join(format!("harm-{}.json", ts));
    let json = serde_json::to_string_pretty(&artifact).context("serializing report")?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    println!("  Results saved to: {}\n", path.display());
    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_env("HARM_SIM_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = parse_args(&args).and_then(run) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
