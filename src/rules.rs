// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Bookstore Management Simulation - Rule Engine
//
// Forward chaining over the fact store. Non-monotonic rules retract their
// conclusions before the first pass; then every rule is reapplied until a
// pass derives nothing new.

use serde::Serialize;

use crate::store::{FactStore, StoreError};
use crate::types::{EntityKind, RelationKind};

/// Fixpoint bound used when none is configured.
pub const DEFAULT_MAX_ITERATIONS: usize = 16;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    #[error("rules did not reach a fixpoint within {max_iterations} passes")]
    NonConvergence { max_iterations: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Rule / Reasoner traits
// ---------------------------------------------------------------------------

/// A single derivation rule.
pub trait Rule {
    fn name(&self) -> &'static str;

    /// Non-monotonic rules clear what they previously derived before the
    /// engine starts chaining. Returns the number of retracted facts.
    fn retract(&self, _store: &mut FactStore) -> Result<usize, StoreError> {
        Ok(0)
    }

    /// Apply once against the current store. Returns the number of facts
    /// that were not already present.
    fn apply(&self, store: &mut FactStore) -> Result<usize, StoreError>;
}

/// Evaluate-to-fixpoint capability. The simulation only depends on this.
pub trait Reasoner {
    fn run_to_fixpoint(&self, store: &mut FactStore) -> Result<InferenceReport, RuleError>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InferenceReport {
    /// Passes executed, including the final pass that derived nothing.
    pub iterations: usize,
    pub asserted: usize,
    pub retracted: usize,
}

// ---------------------------------------------------------------------------
// ForwardChainer
// ---------------------------------------------------------------------------

pub struct ForwardChainer {
    rules: Vec<Box<dyn Rule>>,
    max_iterations: usize,
}

impl ForwardChainer {
    pub fn new(max_iterations: usize) -> Self {
        Self {
            rules: Vec::new(),
            max_iterations: max_iterations.max(1),
        }
    }

    /// The two bookstore rules: purchase provenance and low-stock inference.
    pub fn bookstore(max_iterations: usize) -> Self {
        Self::new(max_iterations)
            .with_rule(PurchaseProvenance)
            .with_rule(LowStockRule)
    }

    pub fn with_rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }
}

impl Default for ForwardChainer {
    fn default() -> Self {
        Self::bookstore(DEFAULT_MAX_ITERATIONS)
    }
}

impl ForwardChainer {
    fn chain(&self, store: &mut FactStore) -> Result<InferenceReport, RuleError> {
        let mut report = InferenceReport::default();
        for rule in &self.rules {
            report.retracted += rule.retract(store)?;
        }

        loop {
            if report.iterations >= self.max_iterations {
                return Err(RuleError::NonConvergence {
                    max_iterations: self.max_iterations,
                });
            }
            report.iterations += 1;

            let mut derived = 0;
            for rule in &self.rules {
                derived += rule.apply(store)?;
            }
            report.asserted += derived;
            if derived == 0 {
                return Ok(report);
            }
        }
    }
}

impl Reasoner for ForwardChainer {
    /// Chains over a working copy and swaps it in only on success, so a
    /// failed pass leaves every previous label and derived fact in place.
    fn run_to_fixpoint(&self, store: &mut FactStore) -> Result<InferenceReport, RuleError> {
        store.check_integrity()?;

        let mut working = store.clone();
        let report = self.chain(&mut working)?;
        *store = working;

        tracing::debug!(
            iterations = report.iterations,
            asserted = report.asserted,
            retracted = report.retracted,
            "rule pass reached fixpoint"
        );
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Bookstore rules
// ---------------------------------------------------------------------------

/// R1: placedBy(o, c) ∧ purchasedBook(o, b) → purchases(c, b). Monotonic.
#[derive(Debug, Clone, Copy, Default)]
pub struct PurchaseProvenance;

impl Rule for PurchaseProvenance {
    fn name(&self) -> &'static str {
        "purchase-provenance"
    }

    fn apply(&self, store: &mut FactStore) -> Result<usize, StoreError> {
        let orders: Vec<_> = store.ids(EntityKind::Order).cloned().collect();
        let mut derived = 0;
        for order in &orders {
            let customer = store.related_one(RelationKind::PlacedBy, order)?.clone();
            let book = store.related_one(RelationKind::PurchasedBook, order)?.clone();
            if store.derive_relation(RelationKind::Purchases, &customer, &book)? {
                derived += 1;
            }
        }
        Ok(derived)
    }
}

/// R2: availableQuantity(i) < restockThreshold(i) → LowStock(i).
/// Quantities go up as well as down, so every evaluation starts from a
/// cleared label set.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowStockRule;

impl Rule for LowStockRule {
    fn name(&self) -> &'static str {
        "low-stock"
    }

    fn retract(&self, store: &mut FactStore) -> Result<usize, StoreError> {
        Ok(store.clear_low_stock())
    }

    fn apply(&self, store: &mut FactStore) -> Result<usize, StoreError> {
        let items: Vec<_> = store.ids(EntityKind::InventoryItem).cloned().collect();
        let mut derived = 0;
        for item in &items {
            let quantity = store.available_quantity(item)?;
            let threshold = store.restock_threshold(item)?;
            if quantity < threshold && store.label_low_stock(item)? {
                derived += 1;
            }
        }
        Ok(derived)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
