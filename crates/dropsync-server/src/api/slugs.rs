//! Slug resolution routes used by the storefront's locale routing.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Serialize)]
pub struct SlugData {
    pub handle: String,
    pub locale: String,
    pub slug: String,
}

/// `GET /api/v1/slugs/{locale}/{handle}` — localized slug for a canonical
/// handle, used when rendering links.
pub async fn get_slug(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((locale, handle)): Path<(String, String)>,
) -> Response {
    match dropsync_db::lookup_slug(&state.pool, &handle, &locale).await {
        Ok(Some(slug)) => Json(ApiResponse {
            data: SlugData {
                handle,
                locale,
                slug,
            },
            meta: ResponseMeta::new(req_id.0),
        })
        .into_response(),
        Ok(None) => ApiError::new(
            req_id.0,
            "not_found",
            format!("no slug mapping for handle '{handle}' in locale '{locale}'"),
        )
        .into_response(),
        Err(e) => map_db_error(req_id.0, &e).into_response(),
    }
}

/// `GET /api/v1/resolve/{locale}/{slug}` — canonical handle for an inbound
/// localized URL segment, used when routing requests.
pub async fn resolve_handle(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((locale, slug)): Path<(String, String)>,
) -> Response {
    match dropsync_db::resolve_handle(&state.pool, &locale, &slug).await {
        Ok(Some(handle)) => Json(ApiResponse {
            data: SlugData {
                handle,
                locale,
                slug,
            },
            meta: ResponseMeta::new(req_id.0),
        })
        .into_response(),
        Ok(None) => ApiError::new(
            req_id.0,
            "not_found",
            format!("no handle for slug '{slug}' in locale '{locale}'"),
        )
        .into_response(),
        Err(e) => map_db_error(req_id.0, &e).into_response(),
    }
}
