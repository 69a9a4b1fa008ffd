//! Remote inventory backend boundary.
//!
//! This module defines an infrastructure-facing abstraction over the
//! authoritative record store, plus its adapters.

pub mod in_memory;
pub mod postgres;
pub mod rest;
pub mod r#trait;

use std::sync::Arc;

pub use in_memory::InMemoryInventoryBackend;
pub use postgres::PostgresInventoryBackend;
pub use rest::RestInventoryBackend;
pub use r#trait::{BackendError, InventoryBackend};

use crate::config::{BackendConfig, InfraConfig};

/// Shared, type-erased backend handle.
pub type DynBackend = Arc<dyn InventoryBackend>;

/// Build the backend selected by configuration.
///
/// Postgres backends get their schema ensured before being handed out.
pub async fn connect_backend(config: &InfraConfig) -> Result<DynBackend, BackendError> {
    match &config.backend {
        BackendConfig::Memory => {
            tracing::warn!("using in-memory inventory backend; data is not persisted");
            Ok(Arc::new(InMemoryInventoryBackend::new()))
        }
        BackendConfig::Postgres { database_url } => {
            let backend =
                PostgresInventoryBackend::connect(database_url, config.remote_timeout).await?;
            backend.ensure_schema().await?;
            Ok(Arc::new(backend))
        }
        BackendConfig::Rest { base_url, api_key } => {
            tracing::info!(base_url = %base_url, "using REST inventory backend");
            Ok(Arc::new(RestInventoryBackend::new(
                base_url,
                api_key.clone(),
                config.remote_timeout,
            )?))
        }
    }
}
