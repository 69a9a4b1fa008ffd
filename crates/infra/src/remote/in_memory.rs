use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::Utc;

use harvest_core::ItemId;
use harvest_inventory::{InventoryItem, ItemPatch, NewItem};

use super::r#trait::{BackendError, InventoryBackend};

/// In-memory inventory backend.
///
/// Intended for tests/dev. Mirrors the remote contract: assigns ids and
/// timestamps, sorts with [`InventoryItem::cmp_by_name`] on select.
#[derive(Debug, Default)]
pub struct InMemoryInventoryBackend {
    records: RwLock<HashMap<ItemId, InventoryItem>>,
}

impl InMemoryInventoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the backend with already-persisted records.
    pub fn with_records(records: impl IntoIterator<Item = InventoryItem>) -> Self {
        let records = records.into_iter().map(|r| (r.id, r)).collect();
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Direct read of a record, bypassing the async contract (test assertions).
    pub fn record(&self, id: ItemId) -> Option<InventoryItem> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }
}

#[async_trait::async_trait]
impl InventoryBackend for InMemoryInventoryBackend {
    async fn select_all(&self) -> Result<Vec<InventoryItem>, BackendError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let mut items: Vec<InventoryItem> = records.values().cloned().collect();
        items.sort_by(InventoryItem::cmp_by_name);
        Ok(items)
    }

    async fn insert(&self, item: NewItem) -> Result<InventoryItem, BackendError> {
        let now = Utc::now();
        let record = InventoryItem {
            id: ItemId::new(),
            name: item.name,
            quantity: item.quantity,
            unit: item.unit,
            min_stock: item.min_stock,
            category: item.category,
            price: item.price,
            created_at: now,
            updated_at: now,
        };

        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, id: ItemId, patch: ItemPatch) -> Result<InventoryItem, BackendError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let record = records.get_mut(&id).ok_or(BackendError::NotFound(id))?;

        patch.apply_to(record);
        // updated_at never precedes created_at, even with a skewed clock.
        record.updated_at = Utc::now().max(record.created_at);
        Ok(record.clone())
    }

    async fn delete(&self, id: ItemId) -> Result<(), BackendError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records
            .remove(&id)
            .map(|_| ())
            .ok_or(BackendError::NotFound(id))
    }
}
