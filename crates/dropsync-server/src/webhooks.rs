//! Shopify webhook endpoint.
//!
//! Deliveries authenticate with an HMAC-SHA256 signature over the raw body;
//! the topic header selects the maintenance action:
//!
//! - `products/delete` — remove every translation row and slug mapping for
//!   the product.
//! - `products/create` / `products/update` — recompute the source
//!   fingerprint and drop rows whose stored hash no longer matches, so the
//!   next translation run re-translates exactly the stale locales.
//!
//! Row maintenance is a couple of bounded DB round-trips, so it happens
//! before the 200 goes back; there is no background queue.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::api::AppState;

const TOPIC_HEADER: &str = "X-Shopify-Topic";

/// Product fields carried by `products/*` webhook payloads.
#[derive(Debug, Deserialize)]
struct ProductPayload {
    id: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    handle: Option<String>,
    #[serde(default)]
    body_html: Option<String>,
}

#[derive(Debug, serde::Serialize)]
struct WebhookAck {
    topic: String,
    product_id: i64,
    rows_removed: u64,
}

/// `POST /webhooks/shopify`
pub async fn shopify_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let Some(secret) = state.webhook_secret.as_deref() else {
        tracing::error!("webhook delivery received but no webhook secret is configured");
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };

    let signature = headers
        .get(dropsync_shopify::SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !dropsync_shopify::verify_signature(secret, &body, signature) {
        tracing::warn!("rejecting webhook delivery with bad or missing signature");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let topic = headers
        .get(TOPIC_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let payload: ProductPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(topic = %topic, error = %e, "webhook payload did not parse");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let result = match topic.as_str() {
        "products/delete" => handle_delete(&state, &payload).await,
        "products/create" | "products/update" => handle_upsert(&state, &payload).await,
        _ => {
            tracing::debug!(topic = %topic, "ignoring webhook topic");
            Ok(0)
        }
    };

    match result {
        Ok(rows_removed) => {
            tracing::info!(
                topic = %topic,
                product_id = payload.id,
                rows_removed,
                "webhook processed"
            );
            (
                StatusCode::OK,
                Json(WebhookAck {
                    topic,
                    product_id: payload.id,
                    rows_removed,
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(topic = %topic, product_id = payload.id, error = %e, "webhook row maintenance failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn handle_delete(
    state: &AppState,
    payload: &ProductPayload,
) -> Result<u64, dropsync_db::DbError> {
    let mut removed = dropsync_db::delete_product_translations(&state.pool, payload.id).await?;
    if let Some(handle) = payload.handle.as_deref() {
        removed += dropsync_db::delete_handle_mappings(&state.pool, handle).await?;
    }
    Ok(removed)
}

async fn handle_upsert(
    state: &AppState,
    payload: &ProductPayload,
) -> Result<u64, dropsync_db::DbError> {
    let Some(title) = payload.title.as_deref() else {
        // Without a title there is nothing to fingerprint; leave rows alone.
        return Ok(0);
    };
    let hash = dropsync_db::source_fingerprint(title, payload.body_html.as_deref());
    dropsync_db::delete_stale_translations(&state.pool, payload.id, &hash).await
}
