//! Database operations for `slug_mappings`.
//!
//! A slug mapping ties a canonical product handle to its localized URL
//! segment. The storefront resolves `(handle, locale)` to render links and
//! `(locale, slug)` to route inbound requests.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `slug_mappings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SlugMappingRow {
    pub id: i64,
    pub handle: String,
    pub locale: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upserts a slug mapping.
///
/// Conflicts on `(handle, locale)` replace the slug in place. The schema's
/// second unique constraint on `(locale, slug)` makes collisions with a
/// different handle a hard error rather than a silent overwrite.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails (including `(locale, slug)`
/// uniqueness violations).
pub async fn upsert_slug_mapping(
    pool: &PgPool,
    handle: &str,
    locale: &str,
    slug: &str,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO slug_mappings (handle, locale, slug) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (handle, locale) DO UPDATE SET \
             slug       = EXCLUDED.slug, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(handle)
    .bind(locale)
    .bind(slug)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Resolves the localized slug for a `(handle, locale)` pair.
///
/// An unknown pair is a well-defined `Ok(None)`, not an error.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn lookup_slug(
    pool: &PgPool,
    handle: &str,
    locale: &str,
) -> Result<Option<String>, DbError> {
    let slug = sqlx::query_scalar::<_, String>(
        "SELECT slug FROM slug_mappings WHERE handle = $1 AND locale = $2",
    )
    .bind(handle)
    .bind(locale)
    .fetch_optional(pool)
    .await?;

    Ok(slug)
}

/// Resolves the canonical handle for a `(locale, slug)` pair — the inbound
/// routing direction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn resolve_handle(
    pool: &PgPool,
    locale: &str,
    slug: &str,
) -> Result<Option<String>, DbError> {
    let handle = sqlx::query_scalar::<_, String>(
        "SELECT handle FROM slug_mappings WHERE locale = $1 AND slug = $2",
    )
    .bind(locale)
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(handle)
}

/// Deletes all slug mappings for a handle. Returns the number of rows
/// removed. Used when a product is deleted upstream.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_handle_mappings(pool: &PgPool, handle: &str) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM slug_mappings WHERE handle = $1")
        .bind(handle)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
