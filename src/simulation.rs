// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Bookstore Management Simulation - Simulation Core

use std::io::Write;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::agents::Agent;
use crate::bus::{MessageBus, Topic};
use crate::config::ModelConfig;
use crate::ledger::{Ledger, LedgerError};
use crate::metrics::{self, MetricsCollector, StepMetrics};
use crate::rules::{ForwardChainer, Reasoner};
use crate::scenario::{Scenario, ScenarioError};
use crate::store::{FactStore, StoreError};
use crate::types::{inventory_id_for, EntityId};

// ----- Errors -----

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error("ledger out of balance: {0}")]
    Ledger(#[from] LedgerError),
}

// ─── SimContext ──────────────────────────────────────────────────────────────

/// Everything an agent may touch during its activation.
pub struct SimContext {
    pub store: FactStore,
    pub bus: MessageBus,
    pub ledger: Ledger,
    pub config: ModelConfig,
    pub rng: ChaCha8Rng,
    pub reasoner: Box<dyn Reasoner>,
    /// Index of the step currently executing, from 0.
    pub step: u64,
}

impl SimContext {
    pub fn new(seed: u64, config: ModelConfig) -> Self {
        Self {
            store: FactStore::new(),
            bus: MessageBus::new(),
            ledger: Ledger::new(config.order_log_capacity),
            reasoner: Box::new(ForwardChainer::bookstore(config.max_rule_iterations)),
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
            step: 0,
        }
    }

    pub fn with_reasoner(mut self, reasoner: Box<dyn Reasoner>) -> Self {
        self.reasoner = reasoner;
        self
    }
}

// ─── Run summary ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub seed: u64,
    pub steps: u64,
    pub revenue: f64,
    pub orders_fulfilled: u64,
    pub orders_rejected: u64,
    pub restock_actions: u64,
    pub avg_inventory: f64,
    pub messages_published: u64,
    pub low_stock_items: Vec<EntityId>,
}

// ─── BookstoreModel ──────────────────────────────────────────────────────────

#[wasm_bindgen]
pub struct BookstoreModel {
    pub(crate) ctx: SimContext,
    pub(crate) agents: Vec<Agent>,
    pub(crate) metrics: MetricsCollector,
    pub(crate) seed: u64,
    pub(crate) scenario: Scenario,
}

// ─── Internal Logic (Testable, pure Rust) ────────────────────────────────────

impl BookstoreModel {
    /// Seed the fact store and spawn one agent per book, employee and customer.
    pub fn new(seed: u64, scenario: &Scenario, config: ModelConfig) -> Result<Self, SimError> {
        scenario.validate()?;
        let mut ctx = SimContext::new(seed, config);
        let store_id = EntityId::new(ctx.config.store_id.clone());
        ctx.store.create_store(&store_id)?;

        let mut agents = Vec::new();

        for spec in &scenario.books {
            let book = EntityId::new(spec.name.clone());
            ctx.store
                .create_book(&book, &spec.author, &spec.genres, spec.price)?;
            let threshold = spec
                .threshold
                .unwrap_or(ctx.config.default_restock_threshold);
            ctx.store
                .create_inventory(&inventory_id_for(&book), &book, spec.qty, threshold)?;
            agents.push(Agent::Book {
                id: EntityId::new(format!("book_{}", book)),
                book,
            });
        }

        for (i, spec) in scenario.employees.iter().enumerate() {
            let id = EntityId::new(format!("emp_{}", i + 1));
            ctx.store.create_employee(&id, Some(&store_id))?;
            ctx.bus.subscribe(Topic::PurchaseRequest, id.as_str());
            agents.push(Agent::Employee {
                id,
                restock_amount: spec.amount.unwrap_or(ctx.config.default_restock_amount),
            });
        }

        for (i, spec) in scenario.customers.iter().enumerate() {
            let id = EntityId::new(format!("cust_{}", i + 1));
            ctx.store.create_customer(&id)?;
            agents.push(Agent::Customer {
                id,
                prefs: spec.prefs.clone(),
                budget: spec.budget.unwrap_or(ctx.config.default_budget),
            });
        }

        tracing::info!(
            seed,
            books = scenario.books.len(),
            employees = scenario.employees.len(),
            customers = scenario.customers.len(),
            "bookstore model seeded"
        );

        Ok(Self {
            ctx,
            agents,
            metrics: MetricsCollector::new(),
            seed,
            scenario: scenario.clone(),
        })
    }

    /// Replace the rule engine, e.g. with one that always fails.
    pub fn with_reasoner(mut self, reasoner: Box<dyn Reasoner>) -> Self {
        self.ctx.reasoner = reasoner;
        self
    }

    /// Advance one step: activate every agent once in a fresh random order,
    /// check the ledger, then sample metrics.
    pub fn step_core(&mut self) -> Result<StepMetrics, SimError> {
        let step = self.ctx.step;
        let mut order: Vec<usize> = (0..self.agents.len()).collect();
        order.shuffle(&mut self.ctx.rng);

        for idx in order {
            self.agents[idx].step(&mut self.ctx)?;
        }

        self.ctx.ledger.verify(&self.ctx.store)?;
        let row = self.metrics.sample(step, &self.ctx);
        tracing::debug!(
            step,
            revenue = row.revenue,
            fulfilled = row.orders_fulfilled,
            rejected = row.orders_rejected,
            restocks = row.restock_actions,
            "step complete"
        );
        self.ctx.step += 1;
        Ok(row)
    }

    pub fn run_for_core(&mut self, steps: u64) -> Result<(), SimError> {
        for _ in 0..steps {
            self.step_core()?;
        }
        Ok(())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of completed steps.
    pub fn steps_run(&self) -> u64 {
        self.ctx.step
    }

    pub fn context(&self) -> &SimContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut SimContext {
        &mut self.ctx
    }

    pub fn store(&self) -> &FactStore {
        &self.ctx.store
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ctx.ledger
    }

    pub fn bus(&self) -> &MessageBus {
        &self.ctx.bus
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn metrics_rows(&self) -> &[StepMetrics] {
        self.metrics.rows()
    }

    pub fn metrics_collector(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn avg_inventory(&self) -> f64 {
        metrics::avg_inventory(&self.ctx)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            seed: self.seed,
            steps: self.ctx.step,
            revenue: self.ctx.ledger.revenue(),
            orders_fulfilled: self.ctx.ledger.fulfilled_orders(),
            orders_rejected: self.ctx.ledger.rejected_orders(),
            restock_actions: self.ctx.ledger.restock_actions(),
            avg_inventory: self.avg_inventory(),
            messages_published: self.ctx.bus.published(),
            low_stock_items: self.ctx.store.low_stock_items(),
        }
    }

    /// Serialize the whole fact store as JSON.
    pub fn write_snapshot<W: Write>(&self, writer: W) -> Result<(), serde_json::Error> {
        self.ctx.store.write_snapshot(writer)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{BookSpec, CustomerSpec, EmployeeSpec};
    use crate::types::{EntityKind, RelationKind};

    fn one_book_scenario() -> Scenario {
        Scenario {
            books: vec![BookSpec {
                name: "Dune".into(),
                author: "Frank Herbert".into(),
                genres: vec!["SciFi".into()],
                price: 10.0,
                qty: 1,
                threshold: Some(5),
            }],
            employees: vec![EmployeeSpec { amount: Some(10) }],
            customers: vec![CustomerSpec {
                prefs: vec!["SciFi".into()],
                budget: Some(50.0),
            }],
        }
    }

    #[test]
    fn test_seeding_follows_id_conventions() {
        let model =
            BookstoreModel::new(42, &one_book_scenario(), ModelConfig::default()).unwrap();
        let store = model.store();
        assert!(store.get(EntityKind::Store, &EntityId::from("main_store")).is_ok());
        assert!(store.get(EntityKind::InventoryItem, &EntityId::from("inv_Dune")).is_ok());
        assert!(store.get(EntityKind::Customer, &EntityId::from("cust_1")).is_ok());
        assert_eq!(
            store.related(RelationKind::WorksAt, &EntityId::from("emp_1")),
            &[EntityId::from("main_store")]
        );
        let ids: Vec<&str> = model.agents().iter().map(|a| a.id().as_str()).collect();
        assert_eq!(ids, vec!["book_Dune", "emp_1", "cust_1"]);
        assert_eq!(model.bus().subscribers(Topic::PurchaseRequest), &["emp_1"]);
    }

    #[test]
    fn test_step_numbering_starts_at_zero() {
        let mut model =
            BookstoreModel::new(42, &one_book_scenario(), ModelConfig::default()).unwrap();
        model.run_for_core(3).unwrap();
        let steps: Vec<u64> = model.metrics_rows().iter().map(|r| r.step).collect();
        assert_eq!(steps, vec![0, 1, 2]);
        assert_eq!(model.steps_run(), 3);
    }

    #[test]
    fn test_invalid_scenario_rejected() {
        let mut scenario = one_book_scenario();
        scenario.books.push(scenario.books[0].clone());
        assert!(matches!(
            BookstoreModel::new(1, &scenario, ModelConfig::default()),
            Err(SimError::Scenario(_))
        ));
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let mut scenario = one_book_scenario();
        scenario.books[0].threshold = None;
        scenario.employees[0].amount = None;
        scenario.customers[0].budget = None;
        let model = BookstoreModel::new(1, &scenario, ModelConfig::default()).unwrap();
        assert_eq!(
            model.store().restock_threshold(&EntityId::from("inv_Dune")).unwrap(),
            5
        );
        assert!(model.agents().contains(&Agent::Employee {
            id: EntityId::from("emp_1"),
            restock_amount: 10
        }));
        assert!(model.agents().contains(&Agent::Customer {
            id: EntityId::from("cust_1"),
            prefs: vec!["SciFi".into()],
            budget: 50.0
        }));
    }
}
