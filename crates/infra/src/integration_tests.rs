//! Integration tests for the store/backend reconciliation loop.
//!
//! Tests: InventoryStore → InventoryBackend → load → snapshot
//!
//! Verifies:
//! - After the final load the snapshot equals the backend record set
//! - Failed remote calls leave the snapshot untouched
//! - The loading flag is raised only while a load is in flight
//! - Concurrent quantity adjustments race (lost update) while sequential ones compose

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use chrono::Utc;
    use proptest::prelude::*;

    use harvest_core::ItemId;
    use harvest_inventory::{Category, InventoryItem, ItemDraft, ItemPatch, NewItem, Unit};

    use crate::remote::{BackendError, InMemoryInventoryBackend, InventoryBackend};
    use crate::store::{InventoryStore, StoreError};

    /// Backend that suspends once before every write, so concurrently polled
    /// operations interleave at the remote call.
    struct YieldingBackend {
        inner: InMemoryInventoryBackend,
    }

    #[async_trait::async_trait]
    impl InventoryBackend for YieldingBackend {
        async fn select_all(&self) -> Result<Vec<InventoryItem>, BackendError> {
            self.inner.select_all().await
        }

        async fn insert(&self, item: NewItem) -> Result<InventoryItem, BackendError> {
            tokio::task::yield_now().await;
            self.inner.insert(item).await
        }

        async fn update(&self, id: ItemId, patch: ItemPatch) -> Result<InventoryItem, BackendError> {
            tokio::task::yield_now().await;
            self.inner.update(id, patch).await
        }

        async fn delete(&self, id: ItemId) -> Result<(), BackendError> {
            tokio::task::yield_now().await;
            self.inner.delete(id).await
        }
    }

    /// Backend whose every call fails while `down` is set.
    #[derive(Default)]
    struct FlakyBackend {
        inner: InMemoryInventoryBackend,
        down: AtomicBool,
    }

    impl FlakyBackend {
        fn set_down(&self, down: bool) {
            self.down.store(down, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), BackendError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(BackendError::Unavailable("connection refused".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl InventoryBackend for FlakyBackend {
        async fn select_all(&self) -> Result<Vec<InventoryItem>, BackendError> {
            self.check()?;
            self.inner.select_all().await
        }

        async fn insert(&self, item: NewItem) -> Result<InventoryItem, BackendError> {
            self.check()?;
            self.inner.insert(item).await
        }

        async fn update(&self, id: ItemId, patch: ItemPatch) -> Result<InventoryItem, BackendError> {
            self.check()?;
            self.inner.update(id, patch).await
        }

        async fn delete(&self, id: ItemId) -> Result<(), BackendError> {
            self.check()?;
            self.inner.delete(id).await
        }
    }

    /// Backend that suspends once inside `select_all`, so a load stays in
    /// flight across one poll.
    #[derive(Default)]
    struct SlowLoadBackend {
        inner: InMemoryInventoryBackend,
    }

    #[async_trait::async_trait]
    impl InventoryBackend for SlowLoadBackend {
        async fn select_all(&self) -> Result<Vec<InventoryItem>, BackendError> {
            tokio::task::yield_now().await;
            self.inner.select_all().await
        }

        async fn insert(&self, item: NewItem) -> Result<InventoryItem, BackendError> {
            self.inner.insert(item).await
        }

        async fn update(&self, id: ItemId, patch: ItemPatch) -> Result<InventoryItem, BackendError> {
            self.inner.update(id, patch).await
        }

        async fn delete(&self, id: ItemId) -> Result<(), BackendError> {
            self.inner.delete(id).await
        }
    }

    fn draft(name: &str, quantity: &str) -> ItemDraft {
        ItemDraft {
            name: name.to_string(),
            quantity: quantity.to_string(),
            unit: Unit::Count,
            min_stock: "2".to_string(),
            category: Category::Other,
            price: "1".to_string(),
        }
    }

    fn seeded(name: &str, quantity: f64) -> InventoryItem {
        let now = Utc::now();
        InventoryItem {
            id: ItemId::new(),
            name: name.to_string(),
            quantity,
            unit: Unit::Mass,
            min_stock: 1.0,
            category: Category::Fruiting,
            price: 3.0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn concurrent_adjustments_lose_an_update() {
        let item = seeded("Pepper", 10.0);
        let backend = Arc::new(YieldingBackend {
            inner: InMemoryInventoryBackend::with_records([item.clone()]),
        });
        let store = InventoryStore::new(backend.clone());
        store.load().await.unwrap();

        // Both calls read the cached quantity (10) before either write lands.
        let (first, second) = tokio::join!(
            store.adjust_quantity(item.id, -3.0),
            store.adjust_quantity(item.id, -3.0)
        );
        first.unwrap();
        second.unwrap();

        assert_eq!(store.get(item.id).unwrap().quantity, 7.0);
        assert_eq!(backend.inner.record(item.id).unwrap().quantity, 7.0);
    }

    #[tokio::test]
    async fn sequential_adjustments_compose() {
        let item = seeded("Pepper", 10.0);
        let store = InventoryStore::new(Arc::new(InMemoryInventoryBackend::with_records([
            item.clone(),
        ])));
        store.load().await.unwrap();

        store.adjust_quantity(item.id, -3.0).await.unwrap();
        let last = store.adjust_quantity(item.id, -3.0).await.unwrap();

        assert_eq!(last.quantity, 4.0);
    }

    #[tokio::test]
    async fn load_picks_up_changes_made_by_other_clients() {
        let backend = Arc::new(InMemoryInventoryBackend::new());
        let store = InventoryStore::new(backend.clone());
        let mine = store.create(draft("Zucchini", "4")).await.unwrap();

        // Another client deletes our item and adds its own.
        backend.delete(mine.id).await.unwrap();
        let theirs = backend
            .insert(draft("Eggplant", "2").validate().unwrap())
            .await
            .unwrap();

        // Stale until the next load.
        assert_eq!(store.items(), vec![mine]);

        store.load().await.unwrap();
        assert_eq!(store.items(), vec![theirs]);
    }

    #[tokio::test]
    async fn failed_calls_leave_the_snapshot_unchanged() {
        let backend = Arc::new(FlakyBackend::default());
        let store = InventoryStore::new(backend.clone());
        let created = store.create(draft("Okra", "6")).await.unwrap();
        let before = store.items();

        backend.set_down(true);

        assert!(matches!(
            store.create(draft("Kale", "1")).await,
            Err(StoreError::RemoteUnavailable(_))
        ));
        assert!(matches!(
            store.adjust_quantity(created.id, 1.0).await,
            Err(StoreError::RemoteUnavailable(_))
        ));
        assert!(matches!(
            store.delete(created.id).await,
            Err(StoreError::RemoteUnavailable(_))
        ));
        assert!(matches!(store.load().await, Err(StoreError::RemoteUnavailable(_))));

        assert_eq!(store.items(), before);
        assert!(!store.is_loading());

        backend.set_down(false);
        store.adjust_quantity(created.id, 1.0).await.unwrap();
        assert_eq!(store.get(created.id).unwrap().quantity, 7.0);
    }

    #[tokio::test]
    async fn loading_flag_is_raised_while_a_load_is_in_flight() {
        let store = InventoryStore::new(SlowLoadBackend::default());
        assert!(!store.is_loading());

        // `load` is polled first and parks inside `select_all`.
        let (loaded, seen_loading) = tokio::join!(store.load(), async { store.is_loading() });

        loaded.unwrap();
        assert!(seen_loading);
        assert!(!store.is_loading());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Create(String, u8),
        Update(usize, u8),
        Delete(usize),
        Adjust(usize, i8),
        Load,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            ("[a-z]{1,8}", any::<u8>()).prop_map(|(n, q)| Op::Create(n, q)),
            (any::<usize>(), any::<u8>()).prop_map(|(i, q)| Op::Update(i, q)),
            any::<usize>().prop_map(Op::Delete),
            (any::<usize>(), any::<i8>()).prop_map(|(i, d)| Op::Adjust(i, d)),
            Just(Op::Load),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: for any sequence of mutations interleaved with loads, the
        /// snapshot after a final load equals the backend record set exactly.
        #[test]
        fn final_load_matches_backend(ops in prop::collection::vec(op_strategy(), 0..25)) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();

            runtime.block_on(async {
                let backend = Arc::new(InMemoryInventoryBackend::new());
                let store = InventoryStore::new(backend.clone());

                for op in ops {
                    let ids: Vec<ItemId> = store.items().iter().map(|i| i.id).collect();
                    let pick = |i: usize| ids.get(i % ids.len().max(1)).copied();
                    match op {
                        Op::Create(name, q) => {
                            store.create(draft(&name, &q.to_string())).await.unwrap();
                        }
                        Op::Update(i, q) => {
                            if let Some(id) = pick(i) {
                                store.update(id, ItemPatch::quantity(q as f64)).await.unwrap();
                            }
                        }
                        Op::Delete(i) => {
                            if let Some(id) = pick(i) {
                                store.delete(id).await.unwrap();
                            }
                        }
                        Op::Adjust(i, d) => {
                            if let Some(id) = pick(i) {
                                let adjusted = store.adjust_quantity(id, d as f64).await.unwrap();
                                assert!(adjusted.quantity >= 0.0);
                            }
                        }
                        Op::Load => {
                            store.load().await.unwrap();
                        }
                    }
                }

                store.load().await.unwrap();
                assert_eq!(store.items(), backend.select_all().await.unwrap());
            });
        }
    }
}
