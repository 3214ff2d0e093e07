// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Bookstore Management Simulation - Metrics Collector
//
// One KPI row per step, sampled after every agent has acted. Read-only over
// the context; rows are kept in step order.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::simulation::SimContext;
use crate::types::EntityKind;

/// CSV header, in column order.
pub const CSV_HEADER: &str = "step,revenue,orders_fulfilled,orders_rejected,restock_actions,avg_inventory";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepMetrics {
    pub step: u64,
    pub revenue: f64,
    pub orders_fulfilled: u64,
    pub orders_rejected: u64,
    pub restock_actions: u64,
    pub avg_inventory: f64,
}

impl StepMetrics {
    pub fn from_context(step: u64, ctx: &SimContext) -> Self {
        Self {
            step,
            revenue: ctx.ledger.revenue(),
            orders_fulfilled: ctx.ledger.fulfilled_orders(),
            orders_rejected: ctx.ledger.rejected_orders(),
            restock_actions: ctx.ledger.restock_actions(),
            avg_inventory: avg_inventory(ctx),
        }
    }

    fn csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            self.step,
            self.revenue,
            self.orders_fulfilled,
            self.orders_rejected,
            self.restock_actions,
            self.avg_inventory
        )
    }
}

/// Mean `availableQuantity` over every inventory item, zero-stock items
/// included. 0 when there are no items.
pub fn avg_inventory(ctx: &SimContext) -> f64 {
    let quantities: Vec<i64> = ctx
        .store
        .ids(EntityKind::InventoryItem)
        .filter_map(|item| ctx.store.available_quantity(item).ok())
        .collect();
    if quantities.is_empty() {
        return 0.0;
    }
    quantities.iter().sum::<i64>() as f64 / quantities.len() as f64
}

#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    rows: Vec<StepMetrics>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample(&mut self, step: u64, ctx: &SimContext) -> StepMetrics {
        let row = StepMetrics::from_context(step, ctx);
        self.rows.push(row.clone());
        row
    }

    pub fn rows(&self) -> &[StepMetrics] {
        &self.rows
    }

    pub fn last(&self) -> Option<&StepMetrics> {
        self.rows.last()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One JSON object per line.
    pub fn write_jsonl<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        for row in &self.rows {
            let line = serde_json::to_string(row)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            writeln!(writer, "{}", line)?;
        }
        Ok(())
    }

    pub fn write_csv<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        writeln!(writer, "{}", CSV_HEADER)?;
        for row in &self.rows {
            writeln!(writer, "{}", row.csv_row())?;
        }
        Ok(())
    }
}
