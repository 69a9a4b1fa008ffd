use std::sync::Arc;

use thiserror::Error;

use harvest_core::ItemId;
use harvest_inventory::{InventoryItem, ItemPatch, NewItem};

/// Remote backend operation error.
///
/// These are **infrastructure errors** (transport, persistence, decoding) as
/// opposed to domain errors (validation).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The targeted record does not exist remotely.
    #[error("record not found: {0}")]
    NotFound(ItemId),

    /// Transport or server failure.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with a record that cannot be decoded.
    #[error("malformed record: {0}")]
    Decode(String),
}

/// Record-oriented remote store holding the authoritative inventory.
///
/// The backend owns identity and timestamps:
/// - `insert` assigns `id`, `created_at` and `updated_at`;
/// - `update` writes only the fields present in the patch and refreshes `updated_at`;
/// - `select_all` returns every record ordered by name ascending.
///
/// Implementations perform no local caching; callers re-read after writing.
#[async_trait::async_trait]
pub trait InventoryBackend: Send + Sync {
    /// Full select, ordered by name ascending.
    async fn select_all(&self) -> Result<Vec<InventoryItem>, BackendError>;

    /// Insert a new record and return it as persisted.
    async fn insert(&self, item: NewItem) -> Result<InventoryItem, BackendError>;

    /// Partial update by id. Returns `NotFound` when no record matches.
    async fn update(&self, id: ItemId, patch: ItemPatch) -> Result<InventoryItem, BackendError>;

    /// Delete by id. Returns `NotFound` when no record matches.
    async fn delete(&self, id: ItemId) -> Result<(), BackendError>;
}

#[async_trait::async_trait]
impl<S> InventoryBackend for Arc<S>
where
    S: InventoryBackend + ?Sized,
{
    async fn select_all(&self) -> Result<Vec<InventoryItem>, BackendError> {
        (**self).select_all().await
    }

    async fn insert(&self, item: NewItem) -> Result<InventoryItem, BackendError> {
        (**self).insert(item).await
    }

    async fn update(&self, id: ItemId, patch: ItemPatch) -> Result<InventoryItem, BackendError> {
        (**self).update(id, patch).await
    }

    async fn delete(&self, id: ItemId) -> Result<(), BackendError> {
        (**self).delete(id).await
    }
}
