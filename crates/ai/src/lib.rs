//! `harvest-ai`
//!
//! **Responsibility:** Natural-language insight boundary.
//!
//! This crate is intentionally **not** part of the inventory store:
//! - It owns no inventory data and keeps no state between requests.
//! - It must not mutate inventory state.
//! - It turns a snapshot into advisory prose, or a typed failure.

pub mod client;
pub mod config;
pub mod request;
pub mod result;
pub mod transport;

pub use client::InsightClient;
pub use config::{InsightConfig, InsightConfigError};
pub use request::{GenerationRequest, GenerationResponse, InsightPayload, build_prompt};
pub use result::{InsightError, InsightResult};
pub use transport::{GenerationTransport, HttpGenerationTransport, TransportResponse};
