mod slugs;
mod translations;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};
use crate::webhooks::shopify_webhook;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: &dropsync_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/slugs/{locale}/{handle}", get(slugs::get_slug))
        .route(
            "/api/v1/resolve/{locale}/{slug}",
            get(slugs::resolve_handle),
        )
        .route(
            "/api/v1/products/{product_id}/translations",
            get(translations::list_product_translations),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    // Webhook deliveries authenticate via HMAC, not bearer tokens, so the
    // route stays outside the protected router.
    let public_routes = Router::new()
        .route("/api/v1/health", get(health))
        .route("/webhooks/shopify", post(shopify_webhook));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match dropsync_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_app(pool: sqlx::PgPool, webhook_secret: Option<&str>) -> Router {
        std::env::remove_var("DROPSYNC_API_KEYS");
        let auth = AuthState::from_env(true).expect("auth");
        build_app(
            AppState {
                pool,
                webhook_secret: webhook_secret.map(ToString::to_string),
            },
            auth,
            default_rate_limit_state(),
        )
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json parse")
    }

    #[test]
    fn api_error_not_found_maps_to_404() {
        let response = ApiError::new("req-1", "not_found", "nope").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn api_error_unknown_code_maps_to_500() {
        let response = ApiError::new("req-1", "internal_error", "boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    // -------------------------------------------------------------------------
    // Slug routes
    // -------------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    async fn get_slug_returns_mapping(pool: sqlx::PgPool) {
        dropsync_db::upsert_slug_mapping(&pool, "wireless-earbuds", "de", "kabellose-ohrhoerer")
            .await
            .expect("seed mapping");

        let app = test_app(pool, None);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/slugs/de/wireless-earbuds")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["slug"].as_str(), Some("kabellose-ohrhoerer"));
        assert_eq!(json["data"]["handle"].as_str(), Some("wireless-earbuds"));
        assert_eq!(json["data"]["locale"].as_str(), Some("de"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn get_slug_unknown_pair_is_404(pool: sqlx::PgPool) {
        let app = test_app(pool, None);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/slugs/fr/missing-handle")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"].as_str(), Some("not_found"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn resolve_handle_round_trips(pool: sqlx::PgPool) {
        dropsync_db::upsert_slug_mapping(&pool, "usb-hub", "fr", "concentrateur-usb")
            .await
            .expect("seed mapping");

        let app = test_app(pool, None);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/resolve/fr/concentrateur-usb")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["handle"].as_str(), Some("usb-hub"));
    }

    // -------------------------------------------------------------------------
    // Translations route
    // -------------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    async fn product_translations_are_listed(pool: sqlx::PgPool) {
        dropsync_db::upsert_translation(
            &pool,
            &dropsync_db::NewTranslation {
                product_id: 100,
                locale: "de",
                title: "Kabellose Ohrhörer",
                description_html: None,
                handle_slug: Some("kabellose-ohrhoerer"),
                source_hash: Some("h1"),
                translated_by: Some("openai"),
            },
        )
        .await
        .expect("seed translation");

        let app = test_app(pool, None);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/products/100/translations")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["locale"].as_str(), Some("de"));
        assert_eq!(data[0]["title"].as_str(), Some("Kabellose Ohrhörer"));
    }

    // -------------------------------------------------------------------------
    // Webhook route
    // -------------------------------------------------------------------------

    fn webhook_request(topic: &str, body: &str, signature: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhooks/shopify")
            .header("X-Shopify-Topic", topic)
            .header(dropsync_shopify::SIGNATURE_HEADER, signature)
            .header("content-type", "application/json")
            .body(Body::from(body.to_owned()))
            .expect("request")
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn webhook_rejects_bad_signature(pool: sqlx::PgPool) {
        let app = test_app(pool, Some("hook-secret"));
        let response = app
            .oneshot(webhook_request(
                "products/delete",
                r#"{"id":100}"#,
                "bm90LXRoZS1yaWdodC1zaWduYXR1cmU=",
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn webhook_without_configured_secret_is_unavailable(pool: sqlx::PgPool) {
        let app = test_app(pool, None);
        let response = app
            .oneshot(webhook_request("products/delete", r#"{"id":100}"#, "x"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn webhook_delete_removes_rows_and_mappings(pool: sqlx::PgPool) {
        dropsync_db::upsert_translation(
            &pool,
            &dropsync_db::NewTranslation {
                product_id: 100,
                locale: "de",
                title: "Kabellose Ohrhörer",
                description_html: None,
                handle_slug: None,
                source_hash: None,
                translated_by: None,
            },
        )
        .await
        .expect("seed translation");
        dropsync_db::upsert_slug_mapping(&pool, "wireless-earbuds", "de", "kabellose-ohrhoerer")
            .await
            .expect("seed mapping");

        let body = r#"{"id":100,"handle":"wireless-earbuds"}"#;
        let signature = dropsync_shopify::compute_signature("hook-secret", body.as_bytes());

        let app = test_app(pool.clone(), Some("hook-secret"));
        let response = app
            .oneshot(webhook_request("products/delete", body, &signature))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["rows_removed"].as_u64(), Some(2));

        assert!(dropsync_db::get_translation(&pool, 100, "de")
            .await
            .expect("get")
            .is_none());
        assert!(dropsync_db::lookup_slug(&pool, "wireless-earbuds", "de")
            .await
            .expect("lookup")
            .is_none());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn webhook_update_drops_only_stale_rows(pool: sqlx::PgPool) {
        let fresh_hash =
            dropsync_db::source_fingerprint("Wireless Earbuds Pro", Some("<p>Great sound.</p>"));
        dropsync_db::upsert_translation(
            &pool,
            &dropsync_db::NewTranslation {
                product_id: 200,
                locale: "de",
                title: "Kabellose Ohrhörer Pro",
                description_html: None,
                handle_slug: None,
                source_hash: Some(&fresh_hash),
                translated_by: Some("openai"),
            },
        )
        .await
        .expect("seed fresh row");
        dropsync_db::upsert_translation(
            &pool,
            &dropsync_db::NewTranslation {
                product_id: 200,
                locale: "fr",
                title: "Écouteurs sans fil",
                description_html: None,
                handle_slug: None,
                source_hash: Some("hash-of-an-older-revision"),
                translated_by: Some("openai"),
            },
        )
        .await
        .expect("seed stale row");

        let body = serde_json::json!({
            "id": 200,
            "title": "Wireless Earbuds Pro",
            "handle": "wireless-earbuds-pro",
            "body_html": "<p>Great sound.</p>"
        })
        .to_string();
        let signature = dropsync_shopify::compute_signature("hook-secret", body.as_bytes());

        let app = test_app(pool.clone(), Some("hook-secret"));
        let response = app
            .oneshot(webhook_request("products/update", &body, &signature))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["rows_removed"].as_u64(), Some(1), "only fr was stale");

        assert!(dropsync_db::get_translation(&pool, 200, "de")
            .await
            .expect("get de")
            .is_some());
        assert!(dropsync_db::get_translation(&pool, 200, "fr")
            .await
            .expect("get fr")
            .is_none());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn webhook_ignores_unrelated_topics(pool: sqlx::PgPool) {
        let body = r#"{"id":1}"#;
        let signature = dropsync_shopify::compute_signature("hook-secret", body.as_bytes());

        let app = test_app(pool, Some("hook-secret"));
        let response = app
            .oneshot(webhook_request("orders/create", body, &signature))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
