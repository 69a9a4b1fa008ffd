//! Infrastructure layer: remote inventory backends, the inventory store,
//! and configuration.

pub mod config;
pub mod remote;
pub mod store;

pub use config::{BackendConfig, ConfigError, InfraConfig};
pub use remote::{
    BackendError, DynBackend, InMemoryInventoryBackend, InventoryBackend, PostgresInventoryBackend,
    RestInventoryBackend, connect_backend,
};
pub use store::{InventoryStore, StoreError, StoreResult};

#[cfg(test)]
mod integration_tests;
