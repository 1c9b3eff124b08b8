//! Database operations for `products`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub brand_id: Option<Uuid>,
    pub name: String,
    pub barcode: Option<String>,
    pub manufacturer: Option<String>,
    pub category: Option<String>,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const PRODUCT_COLUMNS: &str = "id, brand_id, name, barcode, manufacturer, category, \
     short_description, long_description, created_at, updated_at";

/// Fetches a product by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matches, [`DbError::Sqlx`] on
/// query failure.
pub async fn get_product(pool: &PgPool, id: Uuid) -> Result<ProductRow, DbError> {
    sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Fetches a product by barcode, if one exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn get_product_by_barcode(
    pool: &PgPool,
    barcode: &str,
) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = $1 LIMIT 1"
    ))
    .bind(barcode)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
