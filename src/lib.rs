// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Bookstore Management Simulation

pub mod types;
pub mod store;
pub mod rules;
pub mod bus;
pub mod pipeline;
pub mod ledger;
pub mod agents;
pub mod simulation;
pub mod metrics;
pub mod scenario;
pub mod config;

pub use types::*;
pub use store::{FactStore, StoreError, WorldSnapshot};
pub use rules::{ForwardChainer, InferenceReport, Reasoner, Rule, RuleError};
pub use bus::{Message, MessageBus, Topic};
pub use pipeline::{process_purchase, PurchaseIntent, RejectReason, TransactionOutcome};
pub use ledger::{Ledger, LedgerError};
pub use agents::Agent;
pub use simulation::{BookstoreModel, RunSummary, SimContext, SimError};
pub use metrics::{MetricsCollector, StepMetrics};
pub use scenario::{default_scenario, Scenario, ScenarioError};
pub use config::ModelConfig;

use wasm_bindgen::prelude::*;

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// ─── WASM Interface ──────────────────────────────────────────────────────────

#[wasm_bindgen]
impl BookstoreModel {
    /// Build from a seed and a scenario JSON document. An empty string
    /// selects the built-in scenario.
    #[wasm_bindgen(constructor)]
    pub fn from_json(seed: u64, scenario_json: &str) -> Result<BookstoreModel, JsValue> {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        let scenario = if scenario_json.trim().is_empty() {
            default_scenario()
        } else {
            Scenario::from_json(scenario_json).map_err(to_js_error)?
        };
        BookstoreModel::new(seed, &scenario, ModelConfig::default()).map_err(to_js_error)
    }

    /// Advance one step and return its KPI row.
    pub fn step(&mut self) -> Result<JsValue, JsValue> {
        let row = self.step_core().map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(&row).map_err(to_js_error)
    }

    /// Run N steps without returning results.
    pub fn run_for(&mut self, steps: u32) -> Result<(), JsValue> {
        self.run_for_core(u64::from(steps)).map_err(to_js_error)
    }

    pub fn metrics(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.metrics_rows()).unwrap_or(JsValue::NULL)
    }

    pub fn snapshot(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.store().snapshot()).unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen(js_name = summary)]
    pub fn summary_js(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.summary()).unwrap_or(JsValue::NULL)
    }

    pub fn last_orders(&self) -> JsValue {
        let orders: Vec<&EntityId> = self.ledger().last_orders().collect();
        serde_wasm_bindgen::to_value(&orders).unwrap_or(JsValue::NULL)
    }

    /// Reset to step 0 with the same seed and scenario.
    pub fn reset(&mut self) -> Result<(), JsValue> {
        let config = self.ctx.config.clone();
        let scenario = self.scenario.clone();
        *self = BookstoreModel::new(self.seed, &scenario, config).map_err(to_js_error)?;
        Ok(())
    }
}
