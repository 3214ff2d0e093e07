// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Bookstore Management Simulation - Monte Carlo Runner
//
// N runs over seeds base..base+N, each KPI aggregated as mean ± 95% CI.

use std::time::Instant;

use bms_engine::{BookstoreModel, ModelConfig, Scenario, SimError};

use crate::report::*;

/// Run one seeded model to completion.
pub fn run_single(
    scenario: &Scenario,
    config: &ModelConfig,
    seed: u64,
    steps: u64,
) -> Result<RunResult, SimError> {
    let start = Instant::now();
    let mut model = BookstoreModel::new(seed, scenario, config.clone())?;
    model.run_for_core(steps)?;
    let summary = model.summary();

    let requested = summary.orders_fulfilled + summary.orders_rejected;
    let fill_rate = if requested > 0 {
        summary.orders_fulfilled as f64 / requested as f64
    } else {
        1.0
    };

    Ok(RunResult {
        seed,
        steps: summary.steps,
        revenue: summary.revenue,
        orders_fulfilled: summary.orders_fulfilled,
        orders_rejected: summary.orders_rejected,
        restock_actions: summary.restock_actions,
        avg_inventory: summary.avg_inventory,
        fill_rate,
        elapsed_ms: start.elapsed().as_millis(),
    })
}

pub fn run_monte_carlo(
    scenario: &Scenario,
    config: &ModelConfig,
    base_seed: u64,
    n_runs: usize,
    steps: u64,
) -> Result<MonteCarloReport, SimError> {
    let mut runs = Vec::with_capacity(n_runs);
    for i in 0..n_runs {
        let seed = base_seed.wrapping_add(i as u64);
        let result = run_single(scenario, config, seed, steps)?;
        tracing::info!(seed, revenue = result.revenue, "monte carlo run complete");
        runs.push(result);
    }

    let collect = |f: fn(&RunResult) -> f64| -> Vec<f64> { runs.iter().map(f).collect() };

    Ok(MonteCarloReport {
        base_seed,
        n_runs,
        steps,
        prng: "ChaCha8Rng",
        revenue: Stats::from_samples(&collect(|r| r.revenue)),
        orders_fulfilled: Stats::from_samples(&collect(|r| r.orders_fulfilled as f64)),
        orders_rejected: Stats::from_samples(&collect(|r| r.orders_rejected as f64)),
        restock_actions: Stats::from_samples(&collect(|r| r.restock_actions as f64)),
        avg_inventory: Stats::from_samples(&collect(|r| r.avg_inventory)),
        fill_rate: Stats::from_samples(&collect(|r| r.fill_rate)),
        elapsed_ms: Stats::from_samples(&collect(|r| r.elapsed_ms as f64)),
        individual_runs: runs.clone(),
    })
}
