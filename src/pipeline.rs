// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Bookstore Management Simulation - Transaction Pipeline
//
// Exactly one of reject(UnknownBook), reject(OutOfStock) or commit happens
// per intent. Rejections mutate nothing in the fact store.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bus::Message;
use crate::simulation::SimContext;
use crate::store::{FactStore, StoreError};
use crate::types::{EntityId, EntityKind};

/// A customer's request to buy `quantity` copies of `book_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseIntent {
    pub book_id: EntityId,
    pub quantity: i64,
    pub price: f64,
    pub customer_id: EntityId,
    pub step: u64,
}

impl PurchaseIntent {
    /// Single-copy intent, the only kind customers issue.
    pub fn single(book_id: EntityId, price: f64, customer_id: EntityId, step: u64) -> Self {
        Self {
            book_id,
            quantity: 1,
            price,
            customer_id,
            step,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    UnknownBook,
    OutOfStock,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownBook => write!(f, "unknown book"),
            Self::OutOfStock => write!(f, "out of stock"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransactionOutcome {
    Committed { order: EntityId, remaining: i64 },
    Rejected(RejectReason),
}

impl TransactionOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

/// Run one intent through the pipeline on behalf of `employee`.
///
/// Store errors here are data errors (a book without inventory, an id of the
/// wrong kind) and propagate to the step caller.
pub fn process_purchase(
    ctx: &mut SimContext,
    employee: &EntityId,
    intent: PurchaseIntent,
) -> Result<TransactionOutcome, StoreError> {
    if ctx.store.get(EntityKind::Book, &intent.book_id).is_err() {
        return Ok(reject(ctx, RejectReason::UnknownBook, intent));
    }

    let item = ctx.store.inventory_for_book(&intent.book_id)?.clone();
    if ctx.store.available_quantity(&item)? < intent.quantity {
        return Ok(reject(ctx, RejectReason::OutOfStock, intent));
    }

    // Every kind check happens before stock moves.
    let store_id = EntityId::new(ctx.config.store_id.clone());
    expect_absent_or(&ctx.store, &intent.customer_id, EntityKind::Customer)?;
    expect_absent_or(&ctx.store, employee, EntityKind::Employee)?;
    expect_absent_or(&ctx.store, &store_id, EntityKind::Store)?;
    if intent.customer_id == *employee {
        return Err(StoreError::KindMismatch {
            id: employee.clone(),
            expected: EntityKind::Employee,
            actual: EntityKind::Customer,
        });
    }

    ctx.store.ensure_customer(&intent.customer_id)?;
    if !ctx.store.contains(&store_id) {
        ctx.store.create_store(&store_id)?;
    }
    ctx.store.ensure_employee(employee, Some(&store_id))?;

    let remaining = ctx.store.withdraw(&item, intent.quantity)?;
    let order = ctx.ledger.next_order_id();
    if let Err(err) = ctx.store.create_order(
        &order,
        &intent.book_id,
        &intent.customer_id,
        employee,
        intent.price,
    ) {
        ctx.store.deposit(&item, intent.quantity)?;
        return Err(err);
    }
    ctx.ledger.record_commit(order.clone(), intent.price);

    tracing::debug!(
        order = %order,
        book = %intent.book_id,
        customer = %intent.customer_id,
        remaining,
        "purchase committed"
    );
    ctx.bus.send(Message::PurchaseCommit {
        order: order.clone(),
        intent,
    });
    Ok(TransactionOutcome::Committed { order, remaining })
}

fn expect_absent_or(store: &FactStore, id: &EntityId, kind: EntityKind) -> Result<(), StoreError> {
    if store.contains(id) {
        store.get(kind, id)?;
    }
    Ok(())
}

fn reject(ctx: &mut SimContext, reason: RejectReason, intent: PurchaseIntent) -> TransactionOutcome {
    ctx.ledger.record_rejection();
    tracing::debug!(
        book = %intent.book_id,
        customer = %intent.customer_id,
        %reason,
        "purchase rejected"
    );
    ctx.bus.send(Message::PurchaseRejected { reason, intent });
    TransactionOutcome::Rejected(reason)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
