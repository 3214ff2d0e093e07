// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Bookstore Management Simulation - Ledger
//
// Running counters of the transaction pipeline. Revenue is accumulated as a
// `Decimal` so long runs do not drift, and the ledger can be cross-checked
// against the orders committed to the fact store:
//
// ```text
// revenue            = Σ orderTotal(o)
// fulfilled          = |Orders|
// fulfilled+rejected = intents drained
// ```

use std::collections::VecDeque;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::store::FactStore;
use crate::types::{order_id, AttributeKind, EntityId, EntityKind};

/// Tolerance for float -> decimal conversion of order totals.
const REVENUE_TOLERANCE: Decimal = dec!(0.0001);

/// Convert f64 to Decimal (lossy but sufficient for simulation).
pub fn to_decimal(v: f64) -> Decimal {
    Decimal::from_f64(v).unwrap_or(Decimal::ZERO)
}

/// Convert Decimal to f64.
pub fn from_decimal(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("revenue {recorded} does not match order totals {expected}")]
    RevenueMismatch { recorded: Decimal, expected: Decimal },

    #[error("{fulfilled} fulfilled orders recorded but {orders} orders stored")]
    OrderCountMismatch { fulfilled: u64, orders: u64 },

    #[error("{fulfilled} fulfilled + {rejected} rejected != {drained} intents drained")]
    IntentCountMismatch { fulfilled: u64, rejected: u64, drained: u64 },
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    revenue: Decimal,
    fulfilled_orders: u64,
    rejected_orders: u64,
    restock_actions: u64,
    intents_drained: u64,
    /// Sequence number of the next order.
    order_seq: u64,
    last_orders: VecDeque<EntityId>,
    order_log_capacity: usize,
}

impl Ledger {
    pub fn new(order_log_capacity: usize) -> Self {
        Self {
            revenue: Decimal::ZERO,
            fulfilled_orders: 0,
            rejected_orders: 0,
            restock_actions: 0,
            intents_drained: 0,
            order_seq: 1,
            last_orders: VecDeque::with_capacity(order_log_capacity),
            order_log_capacity,
        }
    }

    /// Allocate the next `order_<n>` identifier.
    pub fn next_order_id(&mut self) -> EntityId {
        let id = order_id(self.order_seq);
        self.order_seq += 1;
        id
    }

    pub fn record_commit(&mut self, order: EntityId, total: f64) {
        self.revenue += to_decimal(total);
        self.fulfilled_orders += 1;
        if self.order_log_capacity == 0 {
            return;
        }
        if self.last_orders.len() == self.order_log_capacity {
            self.last_orders.pop_front();
        }
        self.last_orders.push_back(order);
    }

    pub fn record_rejection(&mut self) {
        self.rejected_orders += 1;
    }

    pub fn record_drained(&mut self, count: usize) {
        self.intents_drained += count as u64;
    }

    pub fn record_restock(&mut self) {
        self.restock_actions += 1;
    }

    pub fn revenue(&self) -> f64 {
        from_decimal(self.revenue)
    }

    pub fn revenue_exact(&self) -> Decimal {
        self.revenue
    }

    pub fn fulfilled_orders(&self) -> u64 {
        self.fulfilled_orders
    }

    pub fn rejected_orders(&self) -> u64 {
        self.rejected_orders
    }

    pub fn restock_actions(&self) -> u64 {
        self.restock_actions
    }

    pub fn intents_drained(&self) -> u64 {
        self.intents_drained
    }

    /// Most recent committed orders, oldest first.
    pub fn last_orders(&self) -> impl Iterator<Item = &EntityId> + '_ {
        self.last_orders.iter()
    }

    /// Cross-check the counters against the orders in `store`.
    pub fn verify(&self, store: &FactStore) -> Result<(), LedgerError> {
        let orders = store.count(EntityKind::Order) as u64;
        if orders != self.fulfilled_orders {
            return Err(LedgerError::OrderCountMismatch {
                fulfilled: self.fulfilled_orders,
                orders,
            });
        }

        let expected: Decimal = store
            .ids(EntityKind::Order)
            .filter_map(|o| store.attr(AttributeKind::OrderTotal, o).ok())
            .filter_map(|v| v.as_float())
            .map(to_decimal)
            .sum();
        if (expected - self.revenue).abs() > REVENUE_TOLERANCE {
            return Err(LedgerError::RevenueMismatch {
                recorded: self.revenue,
                expected,
            });
        }

        if self.fulfilled_orders + self.rejected_orders != self.intents_drained {
            return Err(LedgerError::IntentCountMismatch {
                fulfilled: self.fulfilled_orders,
                rejected: self.rejected_orders,
                drained: self.intents_drained,
            });
        }
        Ok(())
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(crate::config::ModelConfig::default().order_log_capacity)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> EntityId {
        EntityId::from(s)
    }

    fn store_with_order(total: f64) -> FactStore {
        let mut store = FactStore::new();
        store.create_book(&id("a"), "Anon", &[], total).unwrap();
        store.create_customer(&id("cust_1")).unwrap();
        store.create_employee(&id("emp_1"), None).unwrap();
        store
            .create_order(&id("order_1"), &id("a"), &id("cust_1"), &id("emp_1"), total)
            .unwrap();
        store
    }

    #[test]
    fn test_order_ids_are_sequential_from_one() {
        let mut ledger = Ledger::new(10);
        assert_eq!(ledger.next_order_id(), id("order_1"));
        assert_eq!(ledger.next_order_id(), id("order_2"));
    }

    #[test]
    fn test_order_log_is_bounded() {
        let mut ledger = Ledger::new(2);
        for n in 1..=3 {
            let order = ledger.next_order_id();
            ledger.record_commit(order, n as f64);
        }
        let log: Vec<_> = ledger.last_orders().cloned().collect();
        assert_eq!(log, vec![id("order_2"), id("order_3")]);
        assert_eq!(ledger.fulfilled_orders(), 3);
        assert!((ledger.revenue() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_decimal_revenue_does_not_drift() {
        let mut ledger = Ledger::new(0);
        for _ in 0..1000 {
            ledger.record_commit(id("order_x"), 0.1);
        }
        assert_eq!(ledger.revenue_exact(), dec!(100));
    }

    #[test]
    fn test_verify_balanced() {
        let store = store_with_order(12.5);
        let mut ledger = Ledger::new(10);
        ledger.record_drained(2);
        let order = ledger.next_order_id();
        ledger.record_commit(order, 12.5);
        ledger.record_rejection();
        assert!(ledger.verify(&store).is_ok());
    }

    #[test]
    fn test_verify_detects_unbalanced_counters() {
        let store = store_with_order(12.5);
        let mut ledger = Ledger::new(10);
        ledger.record_drained(1);
        ledger.record_commit(id("order_1"), 10.0);
        assert!(matches!(
            ledger.verify(&store),
            Err(LedgerError::RevenueMismatch { .. })
        ));

        let mut ledger = Ledger::new(10);
        ledger.record_commit(id("order_1"), 12.5);
        assert!(matches!(
            ledger.verify(&store),
            Err(LedgerError::IntentCountMismatch { .. })
        ));
    }
}
