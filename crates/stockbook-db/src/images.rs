//! Database operations for `product_images`.
//!
//! The single-featured invariant (at most one `is_featured` row per product)
//! is backed by the partial unique index `product_images_one_featured_idx`:
//! [`insert_image`] decides the featured default inside one SQL statement
//! and falls back to a non-featured insert when a concurrent insert won the
//! slot first, and [`set_featured`] runs unset-all-then-set-one inside a
//! transaction.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;
use stockbook_core::ImageCategory;

/// A row from the `product_images` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImageRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub url: String,
    pub storage_path: String,
    pub file_name: String,
    pub is_featured: bool,
    /// `NULL` until the classifier runs.
    pub image_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new image record; `id` and timestamps are database-assigned.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub product_id: Uuid,
    pub url: String,
    pub storage_path: String,
    pub file_name: String,
}

const IMAGE_COLUMNS: &str = "id, product_id, url, storage_path, file_name, is_featured, \
     image_type, created_at, updated_at";

const FEATURED_INDEX: &str = "product_images_one_featured_idx";

/// Inserts an image record. The row becomes featured if and only if the
/// product has no featured image at the moment of insertion. The `NOT
/// EXISTS` predicate is not race-safe on its own under READ COMMITTED, so
/// the partial unique index backs it: when a concurrent insert claims the
/// slot first, the losing insert is retried as non-featured.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_image(pool: &PgPool, image: &NewImage) -> Result<ImageRow, DbError> {
    match try_insert(pool, image, true).await {
        Err(DbError::Sqlx(sqlx::Error::Database(e)))
            if e.constraint() == Some(FEATURED_INDEX) =>
        {
            try_insert(pool, image, false).await
        }
        other => other,
    }
}

async fn try_insert(
    pool: &PgPool,
    image: &NewImage,
    allow_featured: bool,
) -> Result<ImageRow, DbError> {
    let row = sqlx::query_as::<_, ImageRow>(&format!(
        "INSERT INTO product_images (product_id, url, storage_path, file_name, is_featured) \
         VALUES ($1, $2, $3, $4, $5 AND NOT EXISTS ( \
             SELECT 1 FROM product_images WHERE product_id = $1 AND is_featured \
         )) \
         RETURNING {IMAGE_COLUMNS}"
    ))
    .bind(image.product_id)
    .bind(&image.url)
    .bind(&image.storage_path)
    .bind(&image.file_name)
    .bind(allow_featured)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Fetches a single image by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matches, [`DbError::Sqlx`] on
/// query failure.
pub async fn get_image(pool: &PgPool, id: Uuid) -> Result<ImageRow, DbError> {
    sqlx::query_as::<_, ImageRow>(&format!(
        "SELECT {IMAGE_COLUMNS} FROM product_images WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Lists all images for a product in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn list_images_by_product(
    pool: &PgPool,
    product_id: Uuid,
) -> Result<Vec<ImageRow>, DbError> {
    let rows = sqlx::query_as::<_, ImageRow>(&format!(
        "SELECT {IMAGE_COLUMNS} FROM product_images \
         WHERE product_id = $1 ORDER BY created_at ASC"
    ))
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Makes `image_id` the product's featured image: unsets every featured flag
/// for the product, then sets the one. Both statements run in a transaction.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the target image does not belong to the
/// product, [`DbError::Sqlx`] on query failure.
pub async fn set_featured(pool: &PgPool, product_id: Uuid, image_id: Uuid) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE product_images SET is_featured = FALSE, updated_at = NOW() \
         WHERE product_id = $1 AND is_featured",
    )
    .bind(product_id)
    .execute(&mut *tx)
    .await?;

    let updated = sqlx::query(
        "UPDATE product_images SET is_featured = TRUE, updated_at = NOW() \
         WHERE id = $1 AND product_id = $2",
    )
    .bind(image_id)
    .bind(product_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        // Roll back the unset so a bogus image id cannot leave the product
        // with no featured image.
        tx.rollback().await?;
        return Err(DbError::NotFound);
    }

    tx.commit().await?;
    Ok(())
}

/// Applies a classifier verdict to an image record.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matches, [`DbError::Sqlx`] on
/// query failure.
pub async fn set_image_type(
    pool: &PgPool,
    image_id: Uuid,
    category: ImageCategory,
) -> Result<(), DbError> {
    let updated = sqlx::query(
        "UPDATE product_images SET image_type = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(image_id)
    .bind(category.as_str())
    .execute(pool)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Deletes an image record. Storage cleanup is the caller's concern.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matches, [`DbError::Sqlx`] on
/// query failure.
pub async fn delete_image(pool: &PgPool, image_id: Uuid) -> Result<(), DbError> {
    let deleted = sqlx::query("DELETE FROM product_images WHERE id = $1")
        .bind(image_id)
        .execute(pool)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
