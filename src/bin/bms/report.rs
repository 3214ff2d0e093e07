// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Bookstore Management Simulation - Run Report Types

use serde::Serialize;

// ─── Statistics (per-KPI Monte Carlo aggregation) ───────────────────────────

/// Spread of one KPI across seeded runs. The interval is the normal
/// approximation at 95%, so it is only meaningful for a few dozen runs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

const Z_95: f64 = 1.96;

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let Some(&first) = samples.first() else {
            return Self::default();
        };
        let n = samples.len();
        let (min, max) = samples
            .iter()
            .fold((first, first), |(lo, hi), &x| (lo.min(x), hi.max(x)));
        let mean = samples.iter().sum::<f64>() / n as f64;
        // Sample variance; a single run has no spread.
        let std_dev = if n > 1 {
            let ss: f64 = samples.iter().map(|x| (x - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        } else {
            0.0
        };
        let half_width = Z_95 * std_dev / (n as f64).sqrt();
        Self {
            mean,
            std_dev,
            ci_lower: mean - half_width,
            ci_upper: mean + half_width,
            min,
            max,
            n,
        }
    }
}

// ─── Single-Run Result ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub seed: u64,
    pub steps: u64,
    pub revenue: f64,
    pub orders_fulfilled: u64,
    pub orders_rejected: u64,
    pub restock_actions: u64,
    pub avg_inventory: f64,
    /// fulfilled / (fulfilled + rejected), 1.0 when nothing was requested.
    pub fill_rate: f64,
    pub elapsed_ms: u128,
}

// ─── Monte Carlo Report ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloReport {
    pub base_seed: u64,
    pub n_runs: usize,
    pub steps: u64,
    pub prng: &'static str,
    pub revenue: Stats,
    pub orders_fulfilled: Stats,
    pub orders_rejected: Stats,
    pub restock_actions: Stats,
    pub avg_inventory: Stats,
    pub fill_rate: Stats,
    pub elapsed_ms: Stats,
    pub individual_runs: Vec<RunResult>,
}
