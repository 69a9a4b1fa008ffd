//! Plain-text rendering of inventory views.

use std::fmt::Write;

use harvest_inventory::{InventoryItem, InventorySnapshot, StatsSummary};

pub fn stats(stats: &StatsSummary) -> String {
    format!(
        "items: {}  low stock: {}  out of stock: {}  total value: {:.2}",
        stats.total_items, stats.low_stock_items, stats.out_of_stock_items, stats.total_value
    )
}

fn status(item: &InventoryItem) -> &'static str {
    if item.is_out_of_stock() {
        "OUT"
    } else if item.is_low_stock() {
        "LOW"
    } else {
        ""
    }
}

pub fn item_line(item: &InventoryItem) -> String {
    format!(
        "{}  {:<20} {:>8} {:<7} min {:>6}  {:<6} {:>8.2}  {}",
        item.id,
        item.name,
        item.quantity,
        item.unit.as_str(),
        item.min_stock,
        item.category.as_str(),
        item.price,
        status(item)
    )
    .trim_end()
    .to_string()
}

pub fn items<'a>(items: impl IntoIterator<Item = &'a InventoryItem>) -> String {
    let mut out = String::new();
    for item in items {
        let _ = writeln!(out, "{}", item_line(item));
    }
    if out.is_empty() {
        out.push_str("(no items)\n");
    }
    out
}

/// Stats header, full listing, then restock candidates.
pub fn report(snapshot: &InventorySnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", stats(&snapshot.stats));
    let _ = writeln!(out);
    out.push_str(&items(&snapshot.items));

    let restock: Vec<_> = snapshot.restock_candidates().collect();
    if !restock.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "restock:");
        out.push_str(&items(restock));
    }
    out
}
