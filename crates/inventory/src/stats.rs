//! Aggregate statistics and snapshots.

use serde::{Deserialize, Serialize};

use crate::item::InventoryItem;

/// Aggregate statistics over the full (unfiltered) collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_items: usize,
    /// Items with `0 < quantity <= min_stock`.
    pub low_stock_items: usize,
    /// Items with `quantity == 0`.
    pub out_of_stock_items: usize,
    /// Sum of `quantity * price`.
    pub total_value: f64,
}

impl StatsSummary {
    pub fn compute(items: &[InventoryItem]) -> Self {
        items.iter().fold(Self::default(), |mut acc, item| {
            acc.total_items += 1;
            if item.is_low_stock() {
                acc.low_stock_items += 1;
            }
            if item.is_out_of_stock() {
                acc.out_of_stock_items += 1;
            }
            acc.total_value += item.stock_value();
            acc
        })
    }
}

/// The full current collection plus its derived statistics.
///
/// Never persisted; built fresh from whatever collection it is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub items: Vec<InventoryItem>,
    pub stats: StatsSummary,
}

impl InventorySnapshot {
    pub fn new(items: Vec<InventoryItem>) -> Self {
        let stats = StatsSummary::compute(&items);
        Self { items, stats }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Items that need restocking (low or out of stock), in collection order.
    pub fn restock_candidates(&self) -> impl Iterator<Item = &InventoryItem> {
        self.items
            .iter()
            .filter(|i| i.is_low_stock() || i.is_out_of_stock())
    }
}
