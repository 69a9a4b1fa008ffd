//! Inventory store: the canonical in-memory view of the remote inventory.
//!
//! Consistency model:
//! - every mutation is committed remotely first;
//! - on success the whole snapshot is re-read (`load`) before returning;
//! - on failure the local snapshot is left exactly as it was.
//!
//! The local copy is never patched from a write response, so server-side
//! defaults (ids, timestamps, triggers) always flow in through `load`.
//!
//! ## Concurrency
//!
//! The store assumes one logical writer. `adjust_quantity` computes the new
//! quantity from the locally cached snapshot and then writes it as a plain
//! update, so two adjustments issued before either reload completes both start
//! from the same base quantity and the later write wins (lost update).
//! Callers that need both effects must serialize mutations per item.
//! Concurrent `load` calls are safe: each replaces the snapshot wholesale and
//! the last response to arrive wins.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use harvest_core::{DomainError, ItemId};
use harvest_inventory::{
    CategoryFilter, InventoryItem, InventorySnapshot, ItemDraft, ItemPatch, StatsSummary,
    adjusted_amount, filter,
};

use crate::remote::{BackendError, InventoryBackend};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of a store operation, as seen by callers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("item not found: {0}")]
    NotFound(ItemId),

    #[error("remote inventory unavailable: {0}")]
    RemoteUnavailable(String),
}

impl From<BackendError> for StoreError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound(id) => StoreError::NotFound(id),
            BackendError::Unavailable(msg) => StoreError::RemoteUnavailable(msg),
            BackendError::Decode(msg) => {
                StoreError::RemoteUnavailable(format!("unreadable response: {msg}"))
            }
        }
    }
}

impl From<DomainError> for StoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => StoreError::Validation(msg),
        }
    }
}

/// Owner of the current inventory snapshot.
///
/// Consumers never touch the collection directly; they read clones and go
/// through the mutation operations below.
pub struct InventoryStore<B> {
    backend: B,
    items: RwLock<Vec<InventoryItem>>,
    loads_in_flight: AtomicUsize,
}

impl<B> core::fmt::Debug for InventoryStore<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InventoryStore")
            .field("items", &self.read_items().len())
            .field("loading", &self.is_loading())
            .finish_non_exhaustive()
    }
}

impl<B> InventoryStore<B>
where
    B: InventoryBackend,
{
    /// Create a store with an empty snapshot. Call [`InventoryStore::load`] before use.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            items: RwLock::new(Vec::new()),
            loads_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Fetch the full collection (name order) and replace the snapshot with it.
    #[instrument(skip_all)]
    pub async fn load(&self) -> StoreResult<Vec<InventoryItem>> {
        let _loading = LoadingGuard::enter(&self.loads_in_flight);

        let items = self.backend.select_all().await.map_err(|e| {
            warn!(error = %e, "inventory load failed");
            StoreError::from(e)
        })?;

        debug!(count = items.len(), "inventory snapshot loaded");
        *self.items.write().unwrap_or_else(PoisonError::into_inner) = items.clone();
        Ok(items)
    }

    /// Validate and insert a new item, then reload.
    ///
    /// Unparsable numeric input is coerced to `0`, not rejected; only a blank
    /// name fails validation.
    #[instrument(skip_all, fields(name = %draft.name))]
    pub async fn create(&self, draft: ItemDraft) -> StoreResult<InventoryItem> {
        let new_item = draft.validate().map_err(|e| {
            warn!(error = %e, "rejected item draft");
            StoreError::from(e)
        })?;

        let created = self.backend.insert(new_item).await.map_err(|e| {
            warn!(error = %e, "item insert failed");
            StoreError::from(e)
        })?;
        info!(item_id = %created.id, "item created");

        self.reloaded(created.id).await
    }

    /// Write the fields present in `patch`, then reload.
    #[instrument(skip_all, fields(item_id = %id))]
    pub async fn update(&self, id: ItemId, patch: ItemPatch) -> StoreResult<InventoryItem> {
        let patch = patch.normalized()?;

        self.backend.update(id, patch).await.map_err(|e| {
            warn!(item_id = %id, error = %e, "item update failed");
            StoreError::from(e)
        })?;
        info!(item_id = %id, "item updated");

        self.reloaded(id).await
    }

    /// Remove the item remotely, then reload.
    #[instrument(skip_all, fields(item_id = %id))]
    pub async fn delete(&self, id: ItemId) -> StoreResult<()> {
        self.backend.delete(id).await.map_err(|e| {
            warn!(item_id = %id, error = %e, "item delete failed");
            StoreError::from(e)
        })?;
        info!(item_id = %id, "item deleted");

        self.load().await?;
        Ok(())
    }

    /// Set the quantity to `max(0, cached_quantity + delta)`.
    ///
    /// The base quantity is the locally cached one, not a fresh remote read,
    /// and the write is a plain update rather than an atomic increment. See
    /// the module docs for what that means under concurrent calls.
    ///
    /// A non-finite `delta` is a `Validation` error; an overflowing sum
    /// saturates at `f64::MAX`.
    #[instrument(skip_all, fields(item_id = %id, delta = delta))]
    pub async fn adjust_quantity(&self, id: ItemId, delta: f64) -> StoreResult<InventoryItem> {
        let current = self.get(id).ok_or_else(|| {
            warn!(item_id = %id, "adjust requested for an item missing from the snapshot");
            StoreError::NotFound(id)
        })?;

        let quantity = adjusted_amount(current.quantity, delta).ok_or_else(|| {
            warn!(item_id = %id, delta, "rejected non-finite quantity delta");
            StoreError::Validation(format!("quantity delta must be finite, got {delta}"))
        })?;
        debug!(from = current.quantity, to = quantity, delta, "adjusting quantity");
        self.update(id, ItemPatch::quantity(quantity)).await
    }

    /// Name search (case-insensitive substring) intersected with a category filter.
    ///
    /// Recomputed from the current snapshot on every call; order is preserved.
    pub fn filter(&self, search_term: &str, category: CategoryFilter) -> Vec<InventoryItem> {
        let items = self.read_items();
        filter(&items, search_term, category)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Statistics over the full, unfiltered snapshot.
    pub fn stats(&self) -> StatsSummary {
        StatsSummary::compute(&self.read_items())
    }

    /// Current items plus statistics.
    pub fn snapshot(&self) -> InventorySnapshot {
        InventorySnapshot::new(self.items())
    }

    /// Clone of the current snapshot, in name order.
    pub fn items(&self) -> Vec<InventoryItem> {
        self.read_items().clone()
    }

    pub fn get(&self, id: ItemId) -> Option<InventoryItem> {
        self.read_items().iter().find(|i| i.id == id).cloned()
    }

    /// Reload and return `id` from the refreshed snapshot.
    async fn reloaded(&self, id: ItemId) -> StoreResult<InventoryItem> {
        self.load()
            .await?
            .into_iter()
            .find(|i| i.id == id)
            .ok_or(StoreError::NotFound(id))
    }
}

impl<B> InventoryStore<B> {
    /// True while at least one `load` is in flight.
    pub fn is_loading(&self) -> bool {
        self.loads_in_flight.load(Ordering::SeqCst) > 0
    }

    fn read_items(&self) -> std::sync::RwLockReadGuard<'_, Vec<InventoryItem>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Counts an in-flight load; decrements on drop, including cancellation.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::InMemoryInventoryBackend;
    use harvest_inventory::{Category, Unit};
    use std::sync::Arc;

    fn draft(name: &str, quantity: &str, min_stock: &str, category: Category) -> ItemDraft {
        ItemDraft {
            name: name.to_string(),
            quantity: quantity.to_string(),
            unit: Unit::Mass,
            min_stock: min_stock.to_string(),
            category,
            price: "2".to_string(),
        }
    }

    fn store() -> InventoryStore<Arc<InMemoryInventoryBackend>> {
        InventoryStore::new(Arc::new(InMemoryInventoryBackend::new()))
    }

    #[tokio::test]
    async fn create_reloads_and_returns_persisted_item() {
        let store = store();
        let created = store
            .create(draft("Tomato", "5", "2", Category::Fruiting))
            .await
            .unwrap();

        assert_eq!(store.items(), vec![created.clone()]);
        assert_eq!(store.backend().record(created.id), Some(created));
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn create_with_empty_quantity_persists_zero() {
        let store = store();
        let created = store
            .create(draft("Carrot", "", "2", Category::Root))
            .await
            .unwrap();

        assert_eq!(created.quantity, 0.0);
        assert_eq!(store.backend().record(created.id).unwrap().quantity, 0.0);
    }

    #[tokio::test]
    async fn create_with_blank_name_is_rejected_without_remote_call() {
        let store = store();
        let err = store
            .create(draft("  ", "1", "1", Category::Other))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.backend().is_empty());
    }

    #[tokio::test]
    async fn update_touches_only_present_fields() {
        let store = store();
        let created = store
            .create(draft("Leek", "3", "1", Category::Bulb))
            .await
            .unwrap();

        let updated = store
            .update(created.id, ItemPatch::new().with_name("Leek (organic)"))
            .await
            .unwrap();

        assert_eq!(updated.name, "Leek (organic)");
        assert_eq!(updated.quantity, 3.0);
        assert_eq!(updated.category, Category::Bulb);
        assert!(updated.updated_at >= updated.created_at);
    }

    #[tokio::test]
    async fn adjust_quantity_clamps_at_zero() {
        let store = store();
        let created = store
            .create(draft("Beet", "2", "1", Category::Root))
            .await
            .unwrap();

        let adjusted = store.adjust_quantity(created.id, -5.0).await.unwrap();
        assert_eq!(adjusted.quantity, 0.0);

        let adjusted = store.adjust_quantity(created.id, 1.5).await.unwrap();
        assert_eq!(adjusted.quantity, 1.5);
    }

    #[tokio::test]
    async fn adjust_rejects_non_finite_delta_without_remote_call() {
        let store = store();
        let created = store
            .create(draft("Beet", "2", "1", Category::Root))
            .await
            .unwrap();
        let before = store.backend().record(created.id).unwrap();

        for delta in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = store.adjust_quantity(created.id, delta).await.unwrap_err();
            assert!(matches!(err, StoreError::Validation(_)));
        }

        assert_eq!(store.backend().record(created.id), Some(before.clone()));
        assert_eq!(store.items(), vec![before]);
    }

    #[tokio::test]
    async fn adjust_overflow_saturates_instead_of_emptying_stock() {
        let store = store();
        let created = store
            .create(draft("Beet", "1", "1", Category::Root))
            .await
            .unwrap();
        store
            .update(created.id, ItemPatch::quantity(f64::MAX))
            .await
            .unwrap();

        let adjusted = store.adjust_quantity(created.id, f64::MAX).await.unwrap();
        assert_eq!(adjusted.quantity, f64::MAX);
    }

    #[tokio::test]
    async fn update_missing_item_leaves_snapshot_unchanged() {
        let store = store();
        store
            .create(draft("Chard", "4", "1", Category::Leafy))
            .await
            .unwrap();
        let before = store.items();

        let id = ItemId::new();
        let err = store
            .update(id, ItemPatch::quantity(9.0))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound(id));
        assert_eq!(store.items(), before);
    }

    #[tokio::test]
    async fn adjust_unknown_item_is_not_found() {
        let store = store();
        let id = ItemId::new();
        assert_eq!(
            store.adjust_quantity(id, 1.0).await.unwrap_err(),
            StoreError::NotFound(id)
        );
    }

    #[tokio::test]
    async fn delete_missing_item_leaves_snapshot_unchanged() {
        let store = store();
        store
            .create(draft("Chard", "4", "1", Category::Leafy))
            .await
            .unwrap();
        let before = store.items();

        let id = ItemId::new();
        assert_eq!(store.delete(id).await.unwrap_err(), StoreError::NotFound(id));
        assert_eq!(store.items(), before);
    }

    #[tokio::test]
    async fn filter_and_stats_read_the_snapshot() {
        let store = store();
        store
            .create(draft("Tomato", "5", "2", Category::Fruiting))
            .await
            .unwrap();
        store
            .create(draft("Carrot", "0", "2", Category::Root))
            .await
            .unwrap();

        let names = |items: Vec<InventoryItem>| -> Vec<String> {
            items.into_iter().map(|i| i.name).collect()
        };
        assert_eq!(names(store.filter("to", CategoryFilter::All)), vec!["Tomato"]);
        assert_eq!(
            names(store.filter("", CategoryFilter::Only(Category::Root))),
            vec!["Carrot"]
        );
        assert_eq!(names(store.filter("", CategoryFilter::All)), vec!["Carrot", "Tomato"]);

        let stats = store.stats();
        assert_eq!(stats.total_items, 2);
        assert_eq!(stats.out_of_stock_items, 1);
        assert_eq!(stats.low_stock_items, 0);
        assert_eq!(stats.total_value, 10.0);
        assert_eq!(store.snapshot().stats, stats);
    }

    #[test]
    fn backend_errors_map_to_store_errors() {
        let id = ItemId::new();
        assert_eq!(StoreError::from(BackendError::NotFound(id)), StoreError::NotFound(id));
        assert!(matches!(
            StoreError::from(BackendError::Decode("bad unit".to_string())),
            StoreError::RemoteUnavailable(_)
        ));
    }
}
