// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Bookstore Management Simulation - CLI Driver
//
// Usage:
//   cargo run --release --bin bms                          # 200 steps, seed 42
//   cargo run --release --bin bms -- --steps 500 --seed 7
//   cargo run --release --bin bms -- --scenario store.json
//   cargo run --release --bin bms -- --runs 30             # Monte Carlo over seeds 42..72

mod monte_carlo;
mod report;

use std::error::Error;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use bms_engine::{default_scenario, BookstoreModel, ModelConfig, Scenario};
use clap::Parser;
use tracing_subscriber::EnvFilter;

// ─── CLI Parsing ────────────────────────────────────────────────────────────

/// Bookstore management simulation
#[derive(Parser, Debug)]
#[command(name = "bms")]
#[command(about = "Run the bookstore simulation and write KPIs plus a world snapshot")]
struct Args {
    /// Number of simulation steps
    #[arg(long, default_value_t = 200)]
    steps: u64,

    /// Random seed (base seed in Monte Carlo mode)
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Output directory
    #[arg(long, default_value = "output")]
    out: PathBuf,

    /// Scenario JSON file; the built-in catalogue when omitted
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Number of seeded runs; more than one switches to Monte Carlo mode
    #[arg(long, default_value_t = 1)]
    runs: usize,

    /// Override the customer purchase probability
    #[arg(long)]
    purchase_probability: Option<f64>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bms_engine=info,bms=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let args = Args::parse();

    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => default_scenario(),
    };
    let mut config = ModelConfig::default();
    if let Some(p) = args.purchase_probability {
        config = config.with_purchase_probability(p);
    }

    if args.runs > 1 {
        run_monte_carlo(&args, &scenario, &config)
    } else {
        run_once(&args, &scenario, config)
    }
}

fn run_once(args: &Args, scenario: &Scenario, config: ModelConfig) -> Result<(), Box<dyn Error>> {
    let mut model = BookstoreModel::new(args.seed, scenario, config)?;
    model.run_for_core(args.steps)?;

    let logs_dir = args.out.join("run_logs");
    fs::create_dir_all(&logs_dir)?;
    let csv_path = logs_dir.join("metrics.csv");
    model
        .metrics_collector()
        .write_csv(BufWriter::new(File::create(&csv_path)?))?;
    let jsonl_path = logs_dir.join("metrics.jsonl");
    model
        .metrics_collector()
        .write_jsonl(BufWriter::new(File::create(&jsonl_path)?))?;

    let onto_path = args.out.join("ontology").join("bookstore.json");
    write_snapshot(&model, &onto_path)?;

    let summary = model.summary();
    println!("=== Simulation Summary ===");
    println!("Steps: {}", summary.steps);
    println!("Seed: {}", summary.seed);
    println!("Revenue: {:.2}", summary.revenue);
    println!("Fulfilled orders: {}", summary.orders_fulfilled);
    println!("Rejected orders: {}", summary.orders_rejected);
    println!("Restock actions: {}", summary.restock_actions);
    println!("Avg inventory (final step): {:.2}", summary.avg_inventory);
    println!("Metrics CSV: {}", csv_path.display());
    println!("Metrics JSONL: {}", jsonl_path.display());
    println!("Ontology snapshot: {}", onto_path.display());
    Ok(())
}

fn write_snapshot(model: &BookstoreModel, path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    model.write_snapshot(BufWriter::new(File::create(path)?))?;
    Ok(())
}

fn run_monte_carlo(
    args: &Args,
    scenario: &Scenario,
    config: &ModelConfig,
) -> Result<(), Box<dyn Error>> {
    println!("\n  Bookstore Monte Carlo");
    println!(
        "  PRNG: ChaCha8Rng | Runs: {} | Base seed: {} | Steps: {}\n",
        args.runs, args.seed, args.steps
    );

    let report = monte_carlo::run_monte_carlo(scenario, config, args.seed, args.runs, args.steps)?;

    println!(
        "  {:<18} {:>12} {:>10} {:>12} {:>12} {:>10} {:>10}",
        "KPI", "Mean", "Std", "CI low", "CI high", "Min", "Max"
    );
    println!("  {}", "-".repeat(90));
    for (name, stats) in [
        ("revenue", &report.revenue),
        ("orders_fulfilled", &report.orders_fulfilled),
        ("orders_rejected", &report.orders_rejected),
        ("restock_actions", &report.restock_actions),
        ("avg_inventory", &report.avg_inventory),
        ("fill_rate", &report.fill_rate),
    ] {
        println!(
            "  {:<18} {:>12.2} {:>10.2} {:>12.2} {:>12.2} {:>10.2} {:>10.2}",
            name, stats.mean, stats.std_dev, stats.ci_lower, stats.ci_upper, stats.min, stats.max
        );
    }

    let dir = args.out.join("run_logs");
    fs::create_dir_all(&dir)?;
    let path = dir.join("monte_carlo.json");
    fs::write(&path, serde_json::to_string_pretty(&report)?)?;
    println!("\n  Results saved to: {}\n", path.display());
    Ok(())
}
