//! `harvest-core`: shared building blocks for the inventory workspace.
//!
//! This crate contains **pure** primitives (no IO, no storage, no HTTP).

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::ItemId;
