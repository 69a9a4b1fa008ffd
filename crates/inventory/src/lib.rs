//! Inventory domain module.
//!
//! This crate contains the perishable-goods inventory model and the pure
//! derivations over it (filtering, aggregate statistics, input coercion).
//! No IO, no HTTP, no storage.

pub mod coerce;
pub mod filter;
pub mod item;
pub mod stats;

pub use coerce::{adjusted_amount, coerce_amount};
pub use filter::{CategoryFilter, filter};
pub use item::{Category, InventoryItem, ItemDraft, ItemPatch, NewItem, Unit};
pub use stats::{InventorySnapshot, StatsSummary};
