// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Bookstore Management Simulation - Model Configuration

use serde::{Deserialize, Serialize};

use crate::rules::DEFAULT_MAX_ITERATIONS;

/// Tunables for one model instance. Scenario entries that omit a field fall
/// back to the matching `default_*` value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Chance that an activated customer attempts a purchase.
    pub purchase_probability: f64,
    /// Fixpoint bound for the rule engine.
    pub max_rule_iterations: usize,
    /// Length of the trailing committed-order log.
    pub order_log_capacity: usize,
    pub default_restock_threshold: i64,
    pub default_restock_amount: i64,
    pub default_budget: f64,
    /// Identifier of the single store every employee works at.
    pub store_id: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            purchase_probability: 0.6,
            max_rule_iterations: DEFAULT_MAX_ITERATIONS,
            order_log_capacity: 100,
            default_restock_threshold: 5,
            default_restock_amount: 10,
            default_budget: 50.0,
            store_id: "main_store".to_string(),
        }
    }
}

impl ModelConfig {
    /// Same configuration with a different purchase probability, clamped to [0, 1].
    pub fn with_purchase_probability(mut self, p: f64) -> Self {
        self.purchase_probability = p.clamp(0.0, 1.0);
        self
    }
}
