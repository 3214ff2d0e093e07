// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Bookstore Management Simulation - Agents
//
// Agents hold no references into the model. Each activation receives the
// shared `SimContext` and acts on it synchronously.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::bus::{Message, Topic, CHECKOUT};
use crate::pipeline::{self, PurchaseIntent};
use crate::simulation::SimContext;
use crate::store::StoreError;
use crate::types::{AttributeKind, EntityId, EntityKind, RelationKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Agent {
    Customer {
        id: EntityId,
        prefs: Vec<String>,
        budget: f64,
    },
    Employee {
        id: EntityId,
        restock_amount: i64,
    },
    /// Placeholder for per-book behaviour such as pricing.
    Book { id: EntityId, book: EntityId },
}

impl Agent {
    pub fn id(&self) -> &EntityId {
        match self {
            Self::Customer { id, .. } | Self::Employee { id, .. } | Self::Book { id, .. } => id,
        }
    }

    pub fn is_customer(&self) -> bool {
        matches!(self, Self::Customer { .. })
    }

    pub fn is_employee(&self) -> bool {
        matches!(self, Self::Employee { .. })
    }

    /// One activation within the current step.
    pub fn step(&self, ctx: &mut SimContext) -> Result<(), StoreError> {
        match self {
            Self::Customer { id, prefs, budget } => customer_step(ctx, id, prefs, *budget),
            Self::Employee { id, restock_amount } => employee_step(ctx, id, *restock_amount),
            Self::Book { .. } => Ok(()),
        }
    }
}

// ─── Customer ────────────────────────────────────────────────────────────────

fn customer_step(
    ctx: &mut SimContext,
    id: &EntityId,
    prefs: &[String],
    budget: f64,
) -> Result<(), StoreError> {
    // The draw is consumed even when the budget rules the customer out.
    let draw: f64 = ctx.rng.gen();
    if draw >= ctx.config.purchase_probability || budget <= 0.0 {
        return Ok(());
    }

    let Some(book) = choose_book(ctx, prefs) else {
        return Ok(());
    };
    let price = ctx.store.price(&book)?;
    // Budget is checked, never deducted.
    if budget < price {
        return Ok(());
    }

    let intent = PurchaseIntent::single(book, price, id.clone(), ctx.step);
    tracing::debug!(customer = %id, book = %intent.book_id, price, "purchase requested");
    ctx.bus.send(Message::PurchaseRequest {
        sender: id.clone(),
        receiver: CHECKOUT.to_string(),
        intent,
    });
    Ok(())
}

/// Uniform choice among books sharing a genre with `prefs`, or among all
/// books when none do.
fn choose_book(ctx: &mut SimContext, prefs: &[String]) -> Option<EntityId> {
    let books: Vec<EntityId> = ctx.store.ids(EntityKind::Book).cloned().collect();
    let preferred: Vec<EntityId> = books
        .iter()
        .filter(|book| {
            ctx.store
                .attr_values(AttributeKind::Genre, book)
                .iter()
                .filter_map(|g| g.as_text())
                .any(|genre| prefs.iter().any(|p| p == genre))
        })
        .cloned()
        .collect();
    let pool = if preferred.is_empty() { books } else { preferred };
    pool.choose(&mut ctx.rng).cloned()
}

// ─── Employee ────────────────────────────────────────────────────────────────

fn employee_step(
    ctx: &mut SimContext,
    id: &EntityId,
    restock_amount: i64,
) -> Result<(), StoreError> {
    let requests = ctx.bus.drain(Topic::PurchaseRequest);
    ctx.ledger.record_drained(requests.len());
    for message in requests {
        if let Message::PurchaseRequest { intent, .. } = message {
            pipeline::process_purchase(ctx, id, intent)?;
        }
    }

    if !reason(ctx, id) {
        return Ok(());
    }

    let low_items = ctx.store.low_stock_items();
    if low_items.is_empty() {
        return Ok(());
    }
    for item in &low_items {
        let new_quantity = ctx.store.deposit(item, restock_amount)?;
        ctx.store.relate(RelationKind::Restocks, id, item)?;
        ctx.ledger.record_restock();
        tracing::info!(
            employee = %id,
            inventory = %item,
            new_quantity,
            step = ctx.step,
            "restocked"
        );
        ctx.bus.send(Message::RestockDone {
            inventory: item.clone(),
            new_quantity,
            employee: id.clone(),
        });
    }

    // Labels must reflect the restocked quantities.
    reason(ctx, id);
    Ok(())
}

/// Run the reasoner, swallowing failure. Returns whether inference succeeded.
fn reason(ctx: &mut SimContext, employee: &EntityId) -> bool {
    match ctx.reasoner.run_to_fixpoint(&mut ctx.store) {
        Ok(_) => true,
        Err(err) => {
            tracing::warn!(
                employee = %employee,
                step = ctx.step,
                error = %err,
                "reasoner failed, skipping restock pass"
            );
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::rules::{InferenceReport, Reasoner, RuleError};
    use crate::store::FactStore;

    fn id(s: &str) -> EntityId {
        EntityId::from(s)
    }

    fn ctx(purchase_probability: f64) -> SimContext {
        let config = ModelConfig::default().with_purchase_probability(purchase_probability);
        let mut ctx = SimContext::new(11, config);
        ctx.store.create_store(&id("main_store")).unwrap();
        ctx.store
            .create_employee(&id("emp_1"), Some(&id("main_store")))
            .unwrap();
        ctx.store.create_customer(&id("cust_1")).unwrap();
        for (name, genre, price, qty) in [("Dune", "SciFi", 10.0, 1), ("Emma", "Romance", 8.0, 9)] {
            ctx.store
                .create_book(&id(name), "Anon", &[genre.to_string()], price)
                .unwrap();
            ctx.store
                .create_inventory(&id(&format!("inv_{}", name)), &id(name), qty, 5)
                .unwrap();
        }
        ctx
    }

    fn customer(prefs: &[&str], budget: f64) -> Agent {
        Agent::Customer {
            id: id("cust_1"),
            prefs: prefs.iter().map(|p| p.to_string()).collect(),
            budget,
        }
    }

    struct Broken;

    impl Reasoner for Broken {
        fn run_to_fixpoint(&self, _store: &mut FactStore) -> Result<InferenceReport, RuleError> {
            Err(RuleError::NonConvergence { max_iterations: 0 })
        }
    }

    #[test]
    fn test_customer_prefers_matching_genre() {
        let mut ctx = ctx(1.0);
        for _ in 0..20 {
            customer(&["Romance"], 50.0).step(&mut ctx).unwrap();
        }
        let requests = ctx.bus.drain(Topic::PurchaseRequest);
        assert_eq!(requests.len(), 20);
        for message in requests {
            match message {
                Message::PurchaseRequest { sender, receiver, intent } => {
                    assert_eq!(sender, id("cust_1"));
                    assert_eq!(receiver, CHECKOUT);
                    assert_eq!(intent.book_id, id("Emma"));
                    assert_eq!(intent.quantity, 1);
                }
                other => panic!("unexpected message {:?}", other),
            }
        }
    }

    #[test]
    fn test_customer_respects_budget_and_probability() {
        let mut ctx = ctx(1.0);
        customer(&["SciFi"], 9.0).step(&mut ctx).unwrap();
        customer(&["SciFi"], 0.0).step(&mut ctx).unwrap();
        assert_eq!(ctx.bus.pending(Topic::PurchaseRequest), 0);

        let mut ctx = self::ctx(0.0);
        customer(&["SciFi"], 50.0).step(&mut ctx).unwrap();
        assert_eq!(ctx.bus.pending(Topic::PurchaseRequest), 0);
    }

    #[test]
    fn test_zero_budget_still_consumes_draw() {
        let mut a = ctx(1.0);
        let mut b = ctx(1.0);
        customer(&[], 0.0).step(&mut a).unwrap();
        let _: f64 = b.rng.gen();
        let next_a: u64 = a.rng.gen();
        let next_b: u64 = b.rng.gen();
        assert_eq!(next_a, next_b);
    }

    #[test]
    fn test_employee_processes_and_restocks() {
        let mut ctx = ctx(1.0);
        customer(&["SciFi"], 50.0).step(&mut ctx).unwrap();
        let employee = Agent::Employee {
            id: id("emp_1"),
            restock_amount: 10,
        };
        employee.step(&mut ctx).unwrap();

        assert_eq!(ctx.ledger.fulfilled_orders(), 1);
        assert_eq!(ctx.ledger.intents_drained(), 1);
        assert_eq!(ctx.store.available_quantity(&id("inv_Dune")).unwrap(), 10);
        assert!(!ctx.store.is_low_stock(&id("inv_Dune")));
        assert_eq!(ctx.ledger.restock_actions(), 1);
        assert_eq!(
            ctx.store.related(RelationKind::Restocks, &id("emp_1")),
            &[id("inv_Dune")]
        );
        assert_eq!(ctx.bus.pending(Topic::RestockDone), 1);
    }

    #[test]
    fn test_second_employee_finds_empty_queue() {
        let mut ctx = ctx(1.0);
        customer(&["Romance"], 50.0).step(&mut ctx).unwrap();
        ctx.store.create_employee(&id("emp_2"), Some(&id("main_store"))).unwrap();
        for emp in ["emp_1", "emp_2"] {
            Agent::Employee { id: id(emp), restock_amount: 10 }
                .step(&mut ctx)
                .unwrap();
        }
        let order = ctx.store.order(&id("order_1")).unwrap();
        assert_eq!(order.handled_by, vec![id("emp_1")]);
        assert_eq!(ctx.ledger.intents_drained(), 1);
    }

    #[test]
    fn test_reasoner_failure_skips_restock() {
        let mut ctx = ctx(1.0).with_reasoner(Box::new(Broken));
        customer(&["SciFi"], 50.0).step(&mut ctx).unwrap();
        Agent::Employee { id: id("emp_1"), restock_amount: 10 }
            .step(&mut ctx)
            .unwrap();

        assert_eq!(ctx.ledger.fulfilled_orders(), 1);
        assert_eq!(ctx.store.available_quantity(&id("inv_Dune")).unwrap(), 0);
        assert_eq!(ctx.ledger.restock_actions(), 0);
        assert_eq!(ctx.bus.pending(Topic::RestockDone), 0);
    }

    #[test]
    fn test_book_agent_is_inert() {
        let mut ctx = ctx(1.0);
        let before = ctx.store.snapshot();
        Agent::Book { id: id("book_Dune"), book: id("Dune") }
            .step(&mut ctx)
            .unwrap();
        assert_eq!(ctx.store.snapshot(), before);
    }
}
