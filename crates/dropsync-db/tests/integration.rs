//! Integration tests for the translation and slug stores.
//!
//! The `#[sqlx::test]` cases provision a fresh database per test and run the
//! workspace migrations; they require a reachable Postgres via `DATABASE_URL`.
//! The plain `#[test]` cases are offline.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use dropsync_core::{AppConfig, Environment};
use dropsync_db::{NewTranslation, PoolConfig, SyncRunRow};

fn test_app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        locales_path: PathBuf::from("./config/locales.yaml"),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        shopify_shop_domain: None,
        shopify_admin_token: None,
        shopify_api_version: "2025-01".to_string(),
        shopify_webhook_secret: None,
        aliexpress_app_key: None,
        aliexpress_app_secret: None,
        aliexpress_gateway_url: "https://api-sg.aliexpress.com/sync".to_string(),
        aliexpress_token_path: PathBuf::from("./.aliexpress-tokens.json"),
        openai_api_key: None,
        openai_base_url: "https://api.openai.com/v1".to_string(),
        openai_model: "gpt-4o-mini".to_string(),
        deepl_api_key: None,
        deepl_base_url: "https://api-free.deepl.com/v2".to_string(),
        http_request_timeout_secs: 30,
        http_user_agent: "ua".to_string(),
        http_max_retries: 3,
        http_retry_backoff_base_secs: 2,
        vendor_requests_per_sec: 1.0,
        vendor_burst: 2,
        fallback_unavailable_delay_ms: 1500,
        fallback_rate_limit_delay_ms: 8000,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&test_app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`SyncRunRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn sync_run_row_has_expected_fields() {
    use chrono::Utc;
    use uuid::Uuid;

    let row = SyncRunRow {
        id: 1_i64,
        public_id: Uuid::new_v4(),
        run_type: "import".to_string(),
        trigger_source: "cli".to_string(),
        status: "queued".to_string(),
        started_at: None,
        completed_at: None,
        records_processed: 0_i32,
        error_message: None,
        created_at: Utc::now(),
    };

    assert_eq!(row.run_type, "import");
    assert_eq!(row.status, "queued");
    assert!(row.started_at.is_none());
}

fn sample_translation(product_id: i64, locale: &'static str) -> NewTranslation<'static> {
    NewTranslation {
        product_id,
        locale,
        title: "Kabellose Ohrhörer",
        description_html: Some("<p>Mit Ladebox und USB-C Kabel.</p>"),
        handle_slug: Some("kabellose-ohrhoerer"),
        source_hash: Some("abc123"),
        translated_by: Some("openai"),
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_translation_is_idempotent(pool: sqlx::PgPool) {
    let first = dropsync_db::upsert_translation(&pool, &sample_translation(100, "de"))
        .await
        .expect("first upsert");

    let mut updated = sample_translation(100, "de");
    updated.title = "Kabellose Ohrhörer Pro";
    let second = dropsync_db::upsert_translation(&pool, &updated)
        .await
        .expect("second upsert");

    assert_eq!(first, second, "same (product, locale) must keep one row");

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM product_translations WHERE product_id = 100 AND locale = 'de'",
    )
    .fetch_one(&pool)
    .await
    .expect("count");
    assert_eq!(count, 1);

    let row = dropsync_db::get_translation(&pool, 100, "de")
        .await
        .expect("get")
        .expect("row exists");
    assert_eq!(row.title, "Kabellose Ohrhörer Pro", "latest values win");
    assert_eq!(row.translated_by.as_deref(), Some("openai"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_translation_unknown_pair_is_none(pool: sqlx::PgPool) {
    let row = dropsync_db::get_translation(&pool, 999, "fr")
        .await
        .expect("query should succeed");
    assert!(row.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn delete_stale_translations_keeps_matching_hash(pool: sqlx::PgPool) {
    dropsync_db::upsert_translation(&pool, &sample_translation(200, "de"))
        .await
        .expect("de upsert");

    let mut stale = sample_translation(200, "fr");
    stale.source_hash = Some("old-hash");
    dropsync_db::upsert_translation(&pool, &stale)
        .await
        .expect("fr upsert");

    let removed = dropsync_db::delete_stale_translations(&pool, 200, "abc123")
        .await
        .expect("delete stale");
    assert_eq!(removed, 1, "only the fr row had a different hash");

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
async fn slug_lookup_round_trip_and_not_found(pool: sqlx::PgPool) {
    dropsync_db::upsert_slug_mapping(&pool, "wireless-earbuds", "de", "kabellose-ohrhoerer")
        .await
        .expect("upsert mapping");

    let slug = dropsync_db::lookup_slug(&pool, "wireless-earbuds", "de")
        .await
        .expect("lookup");
    assert_eq!(slug.as_deref(), Some("kabellose-ohrhoerer"));

    let handle = dropsync_db::resolve_handle(&pool, "de", "kabellose-ohrhoerer")
        .await
        .expect("resolve");
    assert_eq!(handle.as_deref(), Some("wireless-earbuds"));

    // Unknown pairs are a well-defined None, not an error.
    let missing = dropsync_db::lookup_slug(&pool, "wireless-earbuds", "fr")
        .await
        .expect("lookup missing");
    assert!(missing.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn slug_upsert_replaces_in_place(pool: sqlx::PgPool) {
    let first = dropsync_db::upsert_slug_mapping(&pool, "usb-hub", "fr", "hub-usb")
        .await
        .expect("first");
    let second = dropsync_db::upsert_slug_mapping(&pool, "usb-hub", "fr", "concentrateur-usb")
        .await
        .expect("second");
    assert_eq!(first, second);

    let slug = dropsync_db::lookup_slug(&pool, "usb-hub", "fr")
        .await
        .expect("lookup");
    assert_eq!(slug.as_deref(), Some("concentrateur-usb"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn sync_run_lifecycle_transitions(pool: sqlx::PgPool) {
    let run = dropsync_db::create_sync_run(&pool, "import", "cli")
        .await
        .expect("create");
    assert_eq!(run.status, "queued");

    dropsync_db::start_sync_run(&pool, run.id)
        .await
        .expect("start");
    dropsync_db::complete_sync_run(&pool, run.id, 7)
        .await
        .expect("complete");

    let fetched = dropsync_db::get_sync_run(&pool, run.id)
        .await
        .expect("get");
    assert_eq!(fetched.status, "succeeded");
    assert_eq!(fetched.records_processed, 7);
    assert!(fetched.completed_at.is_some());

    // Completing again is an invalid transition, not a silent no-op.
    let err = dropsync_db::complete_sync_run(&pool, run.id, 7)
        .await
        .expect_err("double complete must fail");
    assert!(matches!(
        err,
        dropsync_db::DbError::InvalidSyncRunTransition { .. }
    ));
}
