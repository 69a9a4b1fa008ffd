//! Postgres-backed inventory backend.
//!
//! Maps the backend contract onto a single `vegetables` table. Identity and
//! timestamps come from column defaults, so the database stays the authority
//! for both.
//!
//! ## Error Mapping
//!
//! | SQLx Error | BackendError |
//! |------------|--------------|
//! | ColumnDecode / Decode / ColumnNotFound | `Decode` |
//! | everything else (IO, TLS, pool, database) | `Unavailable` |
//!
//! Missing rows on update/delete are detected from the statement result and
//! reported as `NotFound`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{Span, instrument};
use uuid::Uuid;

use harvest_core::ItemId;
use harvest_inventory::{Category, InventoryItem, ItemPatch, NewItem, Unit};

use super::r#trait::{BackendError, InventoryBackend};

/// Same order as `InventoryItem::cmp_by_name`, independent of the database collation.
const ORDER_BY_NAME: &str =
    r#"ORDER BY lower(name) COLLATE "C" ASC, name COLLATE "C" ASC, id ASC"#;

const SELECT_COLUMNS: &str =
    "id, name, quantity, unit, min_stock, category, price, created_at, updated_at";

/// Postgres-backed inventory backend.
#[derive(Debug, Clone)]
pub struct PostgresInventoryBackend {
    pool: Arc<PgPool>,
}

impl PostgresInventoryBackend {
    /// Create a new backend over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a small pool against `database_url`.
    ///
    /// `acquire_timeout` bounds how long a call may wait for a connection.
    pub async fn connect(database_url: &str, acquire_timeout: Duration) -> Result<Self, BackendError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        tracing::info!("connected to inventory database");
        Ok(Self::new(pool))
    }

    /// Create the `vegetables` table when it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), BackendError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS vegetables (
                id          UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                name        TEXT NOT NULL CHECK (length(btrim(name)) > 0),
                quantity    DOUBLE PRECISION NOT NULL DEFAULT 0 CHECK (quantity >= 0),
                unit        TEXT NOT NULL,
                min_stock   DOUBLE PRECISION NOT NULL DEFAULT 0 CHECK (min_stock >= 0),
                category    TEXT NOT NULL,
                price       DOUBLE PRECISION NOT NULL DEFAULT 0 CHECK (price >= 0),
                created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_schema", e))?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl InventoryBackend for PostgresInventoryBackend {
    #[instrument(skip(self), fields(operation = "select_all", row_count = tracing::field::Empty), err)]
    async fn select_all(&self) -> Result<Vec<InventoryItem>, BackendError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM vegetables {ORDER_BY_NAME}"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("select_all", e))?;

        Span::current().record("row_count", rows.len());
        rows.iter().map(decode_row).collect()
    }

    #[instrument(skip(self, item), fields(operation = "insert", name = %item.name), err)]
    async fn insert(&self, item: NewItem) -> Result<InventoryItem, BackendError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO vegetables (name, quantity, unit, min_stock, category, price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.unit.as_str())
        .bind(item.min_stock)
        .bind(item.category.as_str())
        .bind(item.price)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert", e))?;

        decode_row(&row)
    }

    #[instrument(skip(self, patch), fields(operation = "update", item_id = %id), err)]
    async fn update(&self, id: ItemId, patch: ItemPatch) -> Result<InventoryItem, BackendError> {
        // NULL parameters leave the column untouched.
        let row = sqlx::query(&format!(
            r#"
            UPDATE vegetables SET
                name       = COALESCE($2, name),
                quantity   = COALESCE($3, quantity),
                unit       = COALESCE($4, unit),
                min_stock  = COALESCE($5, min_stock),
                category   = COALESCE($6, category),
                price      = COALESCE($7, price),
                updated_at = GREATEST(now(), created_at)
            WHERE id = $1
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(patch.name.as_deref())
        .bind(patch.quantity)
        .bind(patch.unit.map(|u| u.as_str()))
        .bind(patch.min_stock)
        .bind(patch.category.map(|c| c.as_str()))
        .bind(patch.price)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;

        match row {
            Some(row) => decode_row(&row),
            None => Err(BackendError::NotFound(id)),
        }
    }

    #[instrument(skip(self), fields(operation = "delete", item_id = %id), err)]
    async fn delete(&self, id: ItemId) -> Result<(), BackendError> {
        let result = sqlx::query("DELETE FROM vegetables WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        if result.rows_affected() == 0 {
            return Err(BackendError::NotFound(id));
        }
        Ok(())
    }
}

struct VegetableRow {
    id: Uuid,
    name: String,
    quantity: f64,
    unit: String,
    min_stock: f64,
    category: String,
    price: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for VegetableRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(VegetableRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            quantity: row.try_get("quantity")?,
            unit: row.try_get("unit")?,
            min_stock: row.try_get("min_stock")?,
            category: row.try_get("category")?,
            price: row.try_get("price")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<VegetableRow> for InventoryItem {
    type Error = BackendError;

    fn try_from(row: VegetableRow) -> Result<Self, Self::Error> {
        let unit: Unit = row
            .unit
            .parse()
            .map_err(|e| BackendError::Decode(format!("row {}: {e}", row.id)))?;
        let category: Category = row
            .category
            .parse()
            .map_err(|e| BackendError::Decode(format!("row {}: {e}", row.id)))?;

        Ok(InventoryItem {
            id: ItemId::from_uuid(row.id),
            name: row.name,
            quantity: row.quantity,
            unit,
            min_stock: row.min_stock,
            category,
            price: row.price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn decode_row(row: &PgRow) -> Result<InventoryItem, BackendError> {
    let raw = <VegetableRow as sqlx::FromRow<PgRow>>::from_row(row)
        .map_err(|e| BackendError::Decode(format!("failed to read vegetable row: {e}")))?;
    InventoryItem::try_from(raw)
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> BackendError {
    match err {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
            BackendError::Decode(format!("{operation}: {err}"))
        }
        sqlx::Error::Database(db_err) => {
            BackendError::Unavailable(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::PoolTimedOut => {
            BackendError::Unavailable(format!("timed out acquiring a connection in {operation}"))
        }
        sqlx::Error::PoolClosed => {
            BackendError::Unavailable(format!("connection pool closed in {operation}"))
        }
        _ => BackendError::Unavailable(format!("sqlx error in {operation}: {err}")),
    }
}
