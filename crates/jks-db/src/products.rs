//! Database operations for `products`, including offer expiry.

use chrono::{DateTime, Utc};
use jks_core::{Category, Product, ValidProduct};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

const PRODUCT_COLUMNS: &str = "id, name, price, min_qty, category, image_url, image_path, \
     discount_percent, countdown_enabled, countdown_time, sale_end_date, created_at, updated_at";

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub min_qty: Option<i64>,
    /// Constrained to the category names by a `CHECK`.
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub image_path: Option<String>,
    pub discount_percent: Option<Decimal>,
    pub countdown_enabled: bool,
    pub countdown_time: Option<String>,
    pub sale_end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let category = row
            .category
            .as_deref()
            .map(str::parse::<Category>)
            .transpose()
            .map_err(|e| DbError::InvalidRow(format!("product {}: {e}", row.id)))?;

        Ok(Product {
            id: row.id,
            name: row.name,
            price: row.price,
            min_qty: row.min_qty,
            category,
            image_url: row.image_url,
            image_path: row.image_path,
            discount_percent: row.discount_percent,
            countdown_enabled: row.countdown_enabled,
            countdown_time: row.countdown_time,
            sale_end_date: row.sale_end_date,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, DbError> {
    rows.into_iter().map(Product::try_from).collect()
}

/// What a delete leaves behind for the caller to clean up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedProduct {
    pub id: i64,
    pub image_path: Option<String>,
}

/// All products, cheapest first. This is the public catalog order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products_by_price(pool: &PgPool) -> Result<Vec<Product>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY price ASC, id ASC"
    ))
    .fetch_all(pool)
    .await?;
    into_products(rows)
}

/// All products, most recently created first. This is the admin list order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products_newest_first(pool: &PgPool) -> Result<Vec<Product>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id DESC"
    ))
    .fetch_all(pool)
    .await?;
    into_products(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, id: i64) -> Result<Option<Product>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.map(Product::try_from).transpose()
}

/// Inserts a validated product and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_product(pool: &PgPool, product: &ValidProduct) -> Result<Product, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "INSERT INTO products \
             (name, price, min_qty, category, image_url, image_path, discount_percent, \
              countdown_enabled, countdown_time, sale_end_date) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(&product.name)
    .bind(product.price)
    .bind(product.min_qty)
    .bind(product.category.as_str())
    .bind(&product.image_url)
    .bind(&product.image_path)
    .bind(product.discount_percent)
    .bind(product.countdown_enabled)
    .bind(&product.countdown_time)
    .bind(product.sale_end_date)
    .fetch_one(pool)
    .await?;
    Product::try_from(row)
}

#[derive(sqlx::FromRow)]
struct UpdatedRow {
    #[sqlx(flatten)]
    product: ProductRow,
    previous_image_path: Option<String>,
}

/// An updated product, plus the image it displaced.
#[derive(Debug, Clone)]
pub struct UpdatedProduct {
    pub product: Product,
    /// Path of the old image when the update stored a different one. The
    /// caller removes the object.
    pub replaced_image_path: Option<String>,
}

/// Replaces a product's editable fields.
///
/// A `None` image keeps the stored image, so edits need not re-upload.
/// `image_url` and `image_path` are written as a pair.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_product(
    pool: &PgPool,
    id: i64,
    product: &ValidProduct,
) -> Result<UpdatedProduct, DbError> {
    let row = sqlx::query_as::<_, UpdatedRow>(&format!(
        "WITH previous AS ( \
             SELECT id AS previous_id, image_path AS previous_image_path \
             FROM products WHERE id = $1 FOR UPDATE \
         ) \
         UPDATE products SET \
             name              = $2, \
             price             = $3, \
             min_qty           = $4, \
             category          = $5, \
             image_url         = COALESCE($6, image_url), \
             image_path        = COALESCE($7, image_path), \
             discount_percent  = $8, \
             countdown_enabled = $9, \
             countdown_time    = $10, \
             sale_end_date     = $11, \
             updated_at        = NOW() \
         FROM previous \
         WHERE id = previous.previous_id \
         RETURNING {PRODUCT_COLUMNS}, previous.previous_image_path"
    ))
    .bind(id)
    .bind(&product.name)
    .bind(product.price)
    .bind(product.min_qty)
    .bind(product.category.as_str())
    .bind(&product.image_url)
    .bind(&product.image_path)
    .bind(product.discount_percent)
    .bind(product.countdown_enabled)
    .bind(&product.countdown_time)
    .bind(product.sale_end_date)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    let replaced_image_path = match (row.previous_image_path, product.image_path.as_deref()) {
        (Some(old), Some(new)) if old != new => Some(old),
        _ => None,
    };
    Ok(UpdatedProduct {
        product: Product::try_from(row.product)?,
        replaced_image_path,
    })
}

/// Deletes a product, returning its image path so the caller can remove
/// the stored object.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has `id`, or
/// [`DbError::Sqlx`] if the delete fails.
pub async fn delete_product(pool: &PgPool, id: i64) -> Result<DeletedProduct, DbError> {
    let image_path: Option<String> = sqlx::query_scalar::<_, Option<String>>(
        "DELETE FROM products WHERE id = $1 RETURNING image_path",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(DeletedProduct { id, image_path })
}

/// Clears a product's discount and countdown.
///
/// Idempotent: expiring an already expired product succeeds again.
/// Returns `false` when no product has `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn expire_offer(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE products SET \
             discount_percent  = 0, \
             countdown_enabled = FALSE, \
             countdown_time    = NULL, \
             sale_end_date     = NULL, \
             updated_at        = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Clears every offer whose `sale_end_date` is at or before `now`.
///
/// Returns the ids of the products that were cleared.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn expire_lapsed_offers(pool: &PgPool, now: DateTime<Utc>) -> Result<Vec<i64>, DbError> {
    let ids = sqlx::query_scalar::<_, i64>(
        "UPDATE products SET \
             discount_percent  = 0, \
             countdown_enabled = FALSE, \
             countdown_time    = NULL, \
             sale_end_date     = NULL, \
             updated_at        = NOW() \
         WHERE sale_end_date IS NOT NULL AND sale_end_date <= $1 \
         RETURNING id",
    )
    .bind(now)
    .fetch_all(pool)
    .await?;

    if !ids.is_empty() {
        tracing::debug!(count = ids.len(), "cleared lapsed offers");
    }
    Ok(ids)
}
