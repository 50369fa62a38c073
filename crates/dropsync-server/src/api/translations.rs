//! Translation read routes.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{map_db_error, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Serialize)]
pub struct TranslationItem {
    pub locale: String,
    pub title: String,
    pub description_html: Option<String>,
    pub handle_slug: Option<String>,
    pub translated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// `GET /api/v1/products/{product_id}/translations` — all stored locales for
/// one product. An untranslated product yields an empty list, not a 404.
pub async fn list_product_translations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<i64>,
) -> Response {
    match dropsync_db::list_product_translations(&state.pool, product_id).await {
        Ok(rows) => {
            let items: Vec<TranslationItem> = rows
                .into_iter()
                .map(|row| TranslationItem {
                    locale: row.locale,
                    title: row.title,
                    description_html: row.description_html,
                    handle_slug: row.handle_slug,
                    translated_by: row.translated_by,
                    updated_at: row.updated_at,
                })
                .collect();
            Json(ApiResponse {
                data: items,
                meta: ResponseMeta::new(req_id.0),
            })
            .into_response()
        }
        Err(e) => map_db_error(req_id.0, &e).into_response(),
    }
}
