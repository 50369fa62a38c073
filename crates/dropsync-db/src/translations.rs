//! Database operations for `product_translations`.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `product_translations` table.
///
/// `source_hash` and `translated_by` are added by a later migration and are
/// nullable; rows written before that migration carry `NULL` there.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductTranslationRow {
    pub id: i64,
    pub product_id: i64,
    pub locale: String,
    pub title: String,
    pub description_html: Option<String>,
    pub handle_slug: Option<String>,
    /// Fingerprint of the source-language fields at translation time.
    pub source_hash: Option<String>,
    /// Provider that produced the row: `"openai"`, `"deepl"`, or `"manual"`.
    pub translated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for [`upsert_translation`].
#[derive(Debug, Clone)]
pub struct NewTranslation<'a> {
    pub product_id: i64,
    pub locale: &'a str,
    pub title: &'a str,
    pub description_html: Option<&'a str>,
    pub handle_slug: Option<&'a str>,
    pub source_hash: Option<&'a str>,
    pub translated_by: Option<&'a str>,
}

/// Fingerprint of the source-language fields, stored alongside each
/// translation so unchanged products can be skipped and webhook updates can
/// invalidate stale rows.
#[must_use]
pub fn source_fingerprint(title: &str, description_html: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update([0u8]);
    hasher.update(description_html.unwrap_or_default().as_bytes());
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// product_translations operations
// ---------------------------------------------------------------------------

/// Upserts a translation row.
///
/// Conflicts on `(product_id, locale)` update `title`, `description_html`,
/// `handle_slug`, `source_hash`, `translated_by`, and `updated_at` in place,
/// so saving the same pair twice leaves exactly one row with the latest
/// values.
///
/// Returns the internal `id` of the upserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_translation(
    pool: &PgPool,
    translation: &NewTranslation<'_>,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO product_translations \
             (product_id, locale, title, description_html, handle_slug, \
              source_hash, translated_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (product_id, locale) DO UPDATE SET \
             title            = EXCLUDED.title, \
             description_html = EXCLUDED.description_html, \
             handle_slug      = EXCLUDED.handle_slug, \
             source_hash      = EXCLUDED.source_hash, \
             translated_by    = EXCLUDED.translated_by, \
             updated_at       = NOW() \
         RETURNING id",
    )
    .bind(translation.product_id)
    .bind(translation.locale)
    .bind(translation.title)
    .bind(translation.description_html)
    .bind(translation.handle_slug)
    .bind(translation.source_hash)
    .bind(translation.translated_by)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Fetches the translation for a `(product_id, locale)` pair.
///
/// An unknown pair is a well-defined `Ok(None)`, not an error.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_translation(
    pool: &PgPool,
    product_id: i64,
    locale: &str,
) -> Result<Option<ProductTranslationRow>, DbError> {
    let row = sqlx::query_as::<_, ProductTranslationRow>(
        "SELECT id, product_id, locale, title, description_html, handle_slug, \
                source_hash, translated_by, created_at, updated_at \
         FROM product_translations \
         WHERE product_id = $1 AND locale = $2",
    )
    .bind(product_id)
    .bind(locale)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns all translation rows for one product, ordered by locale.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_product_translations(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<ProductTranslationRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductTranslationRow>(
        "SELECT id, product_id, locale, title, description_html, handle_slug, \
                source_hash, translated_by, created_at, updated_at \
         FROM product_translations \
         WHERE product_id = $1 \
         ORDER BY locale",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Locales that already have a translation row for a product.
///
/// Callers diff this against the locale registry to find missing locales.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_locales_present_for_product(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<String>, DbError> {
    let locales = sqlx::query_scalar::<_, String>(
        "SELECT locale FROM product_translations WHERE product_id = $1 ORDER BY locale",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(locales)
}

/// Deletes every translation row for a product. Returns the number of rows
/// removed. Used by the `products/delete` webhook path.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_product_translations(pool: &PgPool, product_id: i64) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM product_translations WHERE product_id = $1")
        .bind(product_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Deletes translation rows for a product whose `source_hash` differs from
/// `current_hash` (including rows with a `NULL` hash). Returns the number of
/// rows removed. Used by the `products/create`/`products/update` webhook
/// paths to invalidate stale translations.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_stale_translations(
    pool: &PgPool,
    product_id: i64,
    current_hash: &str,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "DELETE FROM product_translations \
         WHERE product_id = $1 \
           AND (source_hash IS NULL OR source_hash <> $2)",
    )
    .bind(product_id)
    .bind(current_hash)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Streams translation rows for the audit pass, optionally restricted to one
/// locale, in `(product_id, locale)` order with a hard `limit`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_translations_for_audit(
    pool: &PgPool,
    locale: Option<&str>,
    limit: i64,
) -> Result<Vec<ProductTranslationRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductTranslationRow>(
        "SELECT id, product_id, locale, title, description_html, handle_slug, \
                source_hash, translated_by, created_at, updated_at \
         FROM product_translations \
         WHERE ($1::text IS NULL OR locale = $1) \
         ORDER BY product_id, locale \
         LIMIT $2",
    )
    .bind(locale)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
