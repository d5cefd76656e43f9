//! Database operations for `orders`. Orders are insert-only.

use chrono::{DateTime, Utc};
use jks_core::{Order, OrderDraft, OrderLine};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    items: Json<Vec<OrderLine>>,
    subtotal: i64,
    gst: i64,
    total: i64,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            items: row.items.0,
            subtotal: row.subtotal,
            gst: row.gst,
            total: row.total,
            created_at: row.created_at,
        }
    }
}

/// Stores a priced order under a fresh UUID.
///
/// The insert is a single statement, so the order either exists in full or
/// not at all.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_order(pool: &PgPool, draft: &OrderDraft) -> Result<Order, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(
        "INSERT INTO orders (id, items, subtotal, gst, total) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, items, subtotal, gst, total, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(Json(&draft.items))
    .bind(draft.subtotal)
    .bind(draft.gst)
    .bind(draft.total)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails or the stored items cannot
/// be decoded.
pub async fn get_order(pool: &PgPool, id: Uuid) -> Result<Option<Order>, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(
        "SELECT id, items, subtotal, gst, total, created_at FROM orders WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Order::from))
}
