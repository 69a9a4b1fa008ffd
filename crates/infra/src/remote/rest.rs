//! PostgREST-shaped HTTP inventory backend.
//!
//! Talks to a hosted table endpoint (`{base_url}/rest/v1/vegetables`) using
//! the conventions of a PostgREST gateway:
//! - filters as query parameters (`id=eq.{id}`, `order=name.asc`);
//! - `Prefer: return=representation` so writes echo the affected rows;
//! - an empty representation on PATCH/DELETE means no row matched.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use harvest_core::ItemId;
use harvest_inventory::{Category, InventoryItem, ItemPatch, NewItem, Unit};

use super::r#trait::{BackendError, InventoryBackend};

const TABLE_PATH: &str = "rest/v1/vegetables";

/// HTTP client for a PostgREST inventory table.
#[derive(Debug, Clone)]
pub struct RestInventoryBackend {
    client: Client,
    table_url: String,
    api_key: String,
}

impl RestInventoryBackend {
    /// Build a client with a per-request `timeout`.
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            table_url: format!("{}/{TABLE_PATH}", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
        })
    }

    pub fn table_url(&self) -> &str {
        &self.table_url
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn id_filter(id: ItemId) -> [(&'static str, String); 1] {
        [("id", format!("eq.{id}"))]
    }

    async fn send(&self, operation: &str, req: RequestBuilder) -> Result<Response, BackendError> {
        let resp = self
            .authorized(req)
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;

        let status = resp.status().as_u16();
        if is_success(status) {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(status_error(operation, status, &body))
    }

    async fn records(operation: &str, resp: Response) -> Result<Vec<InventoryItem>, BackendError> {
        let records: Vec<VegetableRecord> = resp
            .json()
            .await
            .map_err(|e| BackendError::Decode(format!("{operation}: {e}")))?;
        Ok(records.into_iter().map(InventoryItem::from).collect())
    }
}

#[async_trait::async_trait]
impl InventoryBackend for RestInventoryBackend {
    #[instrument(skip(self), fields(operation = "select_all"), err)]
    async fn select_all(&self) -> Result<Vec<InventoryItem>, BackendError> {
        let req = self
            .client
            .get(&self.table_url)
            .query(&[("select", "*"), ("order", "name.asc")]);

        let resp = self.send("select_all", req).await?;
        let mut items = Self::records("select_all", resp).await?;
        // Gateway ordering follows the database collation.
        items.sort_by(InventoryItem::cmp_by_name);
        Ok(items)
    }

    #[instrument(skip(self, item), fields(operation = "insert", name = %item.name), err)]
    async fn insert(&self, item: NewItem) -> Result<InventoryItem, BackendError> {
        let req = self
            .client
            .post(&self.table_url)
            .header("Prefer", "return=representation")
            .json(&NewRecord::from(&item));

        let resp = self.send("insert", req).await?;
        Self::records("insert", resp)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Decode("insert: empty representation".to_string()))
    }

    #[instrument(skip(self, patch), fields(operation = "update", item_id = %id), err)]
    async fn update(&self, id: ItemId, patch: ItemPatch) -> Result<InventoryItem, BackendError> {
        let body = PatchRecord {
            name: patch.name.as_deref(),
            quantity: patch.quantity,
            unit: patch.unit,
            min_stock: patch.min_stock,
            category: patch.category,
            price: patch.price,
            updated_at: Utc::now(),
        };
        let req = self
            .client
            .patch(&self.table_url)
            .query(&Self::id_filter(id))
            .header("Prefer", "return=representation")
            .json(&body);

        let resp = self.send("update", req).await?;
        updated_row(id, Self::records("update", resp).await?)
    }

    #[instrument(skip(self), fields(operation = "delete", item_id = %id), err)]
    async fn delete(&self, id: ItemId) -> Result<(), BackendError> {
        let req = self
            .client
            .delete(&self.table_url)
            .query(&Self::id_filter(id))
            .header("Prefer", "return=representation");

        let resp = self.send("delete", req).await?;
        deleted_rows(id, &Self::records("delete", resp).await?)
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn transport_error(operation: &str, err: reqwest::Error) -> BackendError {
    BackendError::Unavailable(format!("{operation}: {err}"))
}

/// Any non-2xx gateway answer means the remote could not serve the call.
fn status_error(operation: &str, status: u16, body: &str) -> BackendError {
    BackendError::Unavailable(format!("{operation}: HTTP {status}: {body}"))
}

/// PATCH echoes the matched rows; none means no row had that id.
fn updated_row(id: ItemId, rows: Vec<InventoryItem>) -> Result<InventoryItem, BackendError> {
    rows.into_iter().next().ok_or(BackendError::NotFound(id))
}

/// DELETE echoes the removed rows; none means no row had that id.
fn deleted_rows(id: ItemId, rows: &[InventoryItem]) -> Result<(), BackendError> {
    if rows.is_empty() {
        return Err(BackendError::NotFound(id));
    }
    Ok(())
}

/// Row shape as served by the gateway (snake_case columns).
#[derive(Debug, Clone, Deserialize)]
struct VegetableRecord {
    id: Uuid,
    name: String,
    quantity: f64,
    unit: Unit,
    min_stock: f64,
    category: Category,
    price: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<VegetableRecord> for InventoryItem {
    fn from(r: VegetableRecord) -> Self {
        InventoryItem {
            id: ItemId::from_uuid(r.id),
            name: r.name,
            quantity: r.quantity,
            unit: r.unit,
            min_stock: r.min_stock,
            category: r.category,
            price: r.price,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct NewRecord<'a> {
    name: &'a str,
    quantity: f64,
    unit: Unit,
    min_stock: f64,
    category: Category,
    price: f64,
}

impl<'a> From<&'a NewItem> for NewRecord<'a> {
    fn from(item: &'a NewItem) -> Self {
        Self {
            name: &item.name,
            quantity: item.quantity,
            unit: item.unit,
            min_stock: item.min_stock,
            category: item.category,
            price: item.price,
        }
    }
}

/// PATCH body: absent fields are omitted so the gateway leaves them untouched.
#[derive(Debug, Serialize)]
struct PatchRecord<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<Unit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_stock: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<f64>,
    updated_at: DateTime<Utc>,
}
