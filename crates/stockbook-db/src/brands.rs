//! Database operations for `brands`.

use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;
use stockbook_core::BrandProfile;

/// Fetches a brand profile by id. The pipeline treats brands as read-only;
/// `ai_prompt`, when present, replaces the generic URL-resolution guidance.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matches, [`DbError::Sqlx`] on
/// query failure.
pub async fn get_brand(pool: &PgPool, id: Uuid) -> Result<BrandProfile, DbError> {
    let row = sqlx::query_as::<_, BrandRow>(
        "SELECT id, name, website, ai_prompt, created_at \
         FROM brands WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(BrandProfile {
        id: row.id,
        name: row.name,
        website: row.website,
        ai_prompt: row.ai_prompt,
        created_at: row.created_at,
    })
}

#[derive(sqlx::FromRow)]
struct BrandRow {
    id: Uuid,
    name: String,
    website: Option<String>,
    ai_prompt: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}
